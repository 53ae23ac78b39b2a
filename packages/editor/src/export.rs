//! # Export
//!
//! An [`ExportBundle`] is what leaves the editor: sanitized pages, any
//! collected assets and the warnings produced along the way. Bundles are
//! handed to an [`ArchiveSink`], which decides how to package them.
//! [`DirectorySink`] writes them out as a plain directory tree.

use crate::assets::Asset;
use crate::path::SitePath;
use crate::sanitize::SanitizeWarning;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),
}

/// One sanitized page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub path: SitePath,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportBundle {
    pub documents: Vec<ExportedDocument>,
    pub assets: Vec<Asset>,
    pub warnings: Vec<SanitizeWarning>,
}

impl ExportBundle {
    pub fn document(&self, path: &str) -> Option<&ExportedDocument> {
        self.documents.iter().find(|doc| doc.path.as_str() == path)
    }

    /// Every archive entry name, pages first
    pub fn entry_names(&self) -> Vec<String> {
        self.documents
            .iter()
            .map(|doc| doc.path.to_string())
            .chain(self.assets.iter().map(Asset::archive_path))
            .collect()
    }
}

/// Destination for exported pages
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Package a full export
    async fn write_bundle(&self, bundle: &ExportBundle) -> Result<(), ExportError>;

    /// Save a single sanitized page under `file_name`
    async fn write_page(&self, file_name: &str, html: &str) -> Result<(), ExportError>;
}

/// Writes exports into a directory, creating it as needed
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, relative: &str, contents: &[u8]) -> Result<(), ExportError> {
        let path = relative
            .split('/')
            .fold(self.root.clone(), |dir, segment| dir.join(segment));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ExportError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| ExportError::Io { path, source })
    }
}

#[async_trait]
impl ArchiveSink for DirectorySink {
    async fn write_bundle(&self, bundle: &ExportBundle) -> Result<(), ExportError> {
        for doc in &bundle.documents {
            self.write(doc.path.as_str(), doc.html.as_bytes()).await?;
        }
        for asset in &bundle.assets {
            self.write(&asset.archive_path(), &asset.bytes).await?;
        }
        tracing::info!(
            root = %self.root.display(),
            documents = bundle.documents.len(),
            assets = bundle.assets.len(),
            "Wrote export"
        );
        Ok(())
    }

    async fn write_page(&self, file_name: &str, html: &str) -> Result<(), ExportError> {
        let valid = !file_name.is_empty()
            && !file_name.contains(['/', '\\'])
            && file_name != "."
            && file_name != "..";
        if !valid {
            return Err(ExportError::InvalidFileName(file_name.to_string()));
        }
        self.write(file_name, html.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ExportBundle {
        ExportBundle {
            documents: vec![ExportedDocument {
                path: SitePath::new("blog/post.html").unwrap(),
                html: "<!DOCTYPE html>\n<html></html>".to_string(),
            }],
            assets: vec![Asset {
                path: SitePath::new("img/logo.png").unwrap(),
                bytes: vec![7, 7],
            }],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_entry_names() {
        assert_eq!(
            bundle().entry_names(),
            vec!["blog/post.html", "assets/img/logo.png"]
        );
    }

    #[tokio::test]
    async fn test_directory_sink_writes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));
        sink.write_bundle(&bundle()).await.unwrap();

        let page = std::fs::read_to_string(dir.path().join("out/blog/post.html")).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        let logo = std::fs::read(dir.path().join("out/assets/img/logo.png")).unwrap();
        assert_eq!(logo, vec![7, 7]);
    }

    #[tokio::test]
    async fn test_write_page_rejects_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());
        assert!(matches!(
            sink.write_page("../x.html", "x").await,
            Err(ExportError::InvalidFileName(_))
        ));
        sink.write_page("index.html", "<p>x</p>").await.unwrap();
        assert!(dir.path().join("index.html").exists());
    }
}
