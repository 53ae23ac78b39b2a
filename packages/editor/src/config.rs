use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// `href` prefix of the `<base>` element injected on load. The document's
    /// own directory is appended to it.
    pub source_prefix: String,

    /// Maximum undo levels per document (0 = unlimited)
    pub undo_limit: usize,

    /// Per-asset fetch timeout during export, in milliseconds
    pub asset_timeout_ms: u64,

    /// Pages listed before anything is loaded
    pub initial_pages: Vec<String>,

    /// Components listed before anything is loaded
    pub initial_components: Vec<String>,
}

impl EditorConfig {
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            source_prefix: "/source/".to_string(),
            undo_limit: 50,
            asset_timeout_ms: 5000,
            initial_pages: vec!["index.html".to_string(), "404.html".to_string()],
            initial_components: vec!["components/icon.html".to_string()],
        }
    }
}
