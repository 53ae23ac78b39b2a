use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::Sanitizer;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SanitizeArgs {
    /// HTML file to clean
    pub input: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn sanitize(args: SanitizeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let html = tokio::fs::read_to_string(&args.input).await?;

    let sanitized = Sanitizer::new(config.editor.source_prefix).sanitize(&html);
    if let Some(warning) = &sanitized.warning {
        eprintln!("{} {}", "⚠️".yellow(), warning);
    }

    match args.output {
        Some(output) => {
            tokio::fs::write(&output, &sanitized.html).await?;
            eprintln!("{} {}", "✓".green(), output.display());
        }
        None => println!("{}", sanitized.html),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sanitize_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("page.html");
        let output = dir.path().join("clean.html");
        std::fs::write(
            &input,
            r#"<html><head><base href="/source/"></head><body contenteditable="true"><p class="_editor-highlight">x</p></body></html>"#,
        )
        .unwrap();

        let args = SanitizeArgs {
            input,
            output: Some(output.clone()),
        };
        sanitize(args, &dir.path().display().to_string()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "<!DOCTYPE html>\n<html><head></head><body><p>x</p></body></html>"
        );
    }
}
