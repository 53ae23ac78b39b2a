use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{DirectorySink, DirectorySource, EditorSession, SitePath};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Pages to export, relative to the site directory (defaults to every .html file)
    pub pages: Vec<String>,

    /// Site directory (overrides config)
    #[arg(long)]
    pub source: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    pub out_dir: Option<String>,

    /// Also copy referenced assets into assets/
    #[arg(short, long)]
    pub assets: bool,
}

pub async fn export(args: ExportArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let source_root = config.get_source_root(cwd, args.source.as_deref());
    if !source_root.is_dir() {
        return Err(anyhow!("Site directory does not exist: {:?}", source_root));
    }
    let out_dir = config.get_out_dir(cwd, args.out_dir.as_deref());

    let pages = if args.pages.is_empty() {
        find_html_files(&source_root)
    } else {
        args.pages
            .iter()
            .map(|raw| SitePath::new(raw))
            .collect::<Result<Vec<_>, _>>()?
    };
    if pages.is_empty() {
        println!("{}", "⚠️  No .html files found".yellow());
        return Ok(());
    }

    println!("{}", "📦 Exporting pages...".bright_blue().bold());

    let source = Arc::new(DirectorySource::new(&source_root));
    let mut session = EditorSession::new(source, config.editor);
    let mut error_count = 0;
    for page in &pages {
        let loaded = match session.load(page).await {
            Ok(_) => session.save().map(|_| ()),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(()) => println!("  {} {}", "✓".green(), page),
            Err(e) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), page, e.to_string().red());
            }
        }
    }

    let sink = DirectorySink::new(&out_dir);
    let bundle = session.export_to(&sink, args.assets).await?;
    for warning in &bundle.warnings {
        println!("  {} {}", "⚠️".yellow(), warning);
    }

    println!();
    if error_count == 0 {
        println!(
            "{} Exported {} pages and {} assets to {}",
            "✅".green(),
            bundle.documents.len(),
            bundle.assets.len(),
            out_dir.display()
        );
    } else {
        println!(
            "{} Exported {} pages, {} errors",
            "⚠️".yellow(),
            bundle.documents.len(),
            error_count
        );
    }

    Ok(())
}

/// Every `.html` file under `root`, as site paths
fn find_html_files(root: &Path) -> Vec<SitePath> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("html"))
        .collect();
    files.sort();

    files
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .filter_map(|relative| SitePath::new(&relative.to_string_lossy()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_html_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog/2024")).unwrap();
        fs::write(dir.path().join("index.html"), "<p>home</p>").unwrap();
        fs::write(dir.path().join("blog/2024/post.html"), "<p>post</p>").unwrap();
        fs::write(dir.path().join("site.css"), "body {}").unwrap();

        let found: Vec<String> = find_html_files(dir.path())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(found, vec!["blog/2024/post.html", "index.html"]);
    }

    #[tokio::test]
    async fn test_export_directory() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("site");
        fs::create_dir_all(site.join("img")).unwrap();
        fs::write(
            site.join("index.html"),
            "<html><head></head><body><img src=\"img/logo.png\"></body></html>",
        )
        .unwrap();
        fs::write(site.join("img/logo.png"), [7u8, 7]).unwrap();

        let args = ExportArgs {
            pages: vec![],
            source: None,
            out_dir: None,
            assets: true,
        };
        export(args, &dir.path().display().to_string()).await.unwrap();

        let html = fs::read_to_string(dir.path().join("export/index.html")).unwrap();
        assert_eq!(
            html,
            "<!DOCTYPE html>\n<html><head></head><body><img src=\"img/logo.png\"></body></html>"
        );
        assert_eq!(fs::read(dir.path().join("export/assets/img/logo.png")).unwrap(), vec![7, 7]);
    }

    #[tokio::test]
    async fn test_missing_site_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = ExportArgs {
            pages: vec![],
            source: Some("nowhere".to_string()),
            out_dir: None,
            assets: false,
        };
        assert!(export(args, &dir.path().display().to_string()).await.is_err());
    }
}
