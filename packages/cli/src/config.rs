use pagecraft_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Pagecraft configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the site being edited
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory exports are written to
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Session settings
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_source_root() -> String {
    "site".to_string()
}

fn default_out_dir() -> String {
    "export".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Absolute path to the site directory, unless `overridden`
    pub fn get_source_root(&self, cwd: &str, overridden: Option<&str>) -> PathBuf {
        PathBuf::from(cwd).join(overridden.unwrap_or(&self.source_root))
    }

    pub fn get_out_dir(&self, cwd: &str, overridden: Option<&str>) -> PathBuf {
        PathBuf::from(cwd).join(overridden.unwrap_or(&self.out_dir))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            out_dir: default_out_dir(),
            editor: EditorConfig::default(),
        }
    }
}
