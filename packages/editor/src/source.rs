//! # Source Provider
//!
//! Read-only access to the site being edited. The editor never touches the
//! filesystem or network directly; it asks a [`SourceProvider`] for text
//! (pages, components) or bytes (assets).
//!
//! - [`DirectorySource`] reads from a directory on disk
//! - [`MemorySource`] serves a fixed set of files, mostly for tests

use crate::path::SitePath;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0} not found")]
    NotFound(SitePath),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: SitePath,
        #[source]
        source: io::Error,
    },

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(SitePath),

    #[error("Fetching {0} timed out")]
    TimedOut(SitePath),
}

impl FetchError {
    fn from_io(path: &SitePath, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(path.clone()),
            _ => FetchError::Io {
                path: path.clone(),
                source,
            },
        }
    }
}

/// Where pages, components and assets come from
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_bytes(&self, path: &SitePath) -> Result<Vec<u8>, FetchError>;

    async fn fetch_text(&self, path: &SitePath) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(path).await?;
        String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8(path.clone()))
    }
}

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &SitePath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root.clone(), |dir, segment| dir.join(segment))
    }
}

#[async_trait]
impl SourceProvider for DirectorySource {
    async fn fetch_bytes(&self, path: &SitePath) -> Result<Vec<u8>, FetchError> {
        let file = self.resolve(path);
        tracing::debug!(path = %path, file = %file.display(), "Reading source file");
        tokio::fs::read(&file)
            .await
            .map_err(|e| FetchError::from_io(path, e))
    }
}

/// Fixed in-memory file set. Counts fetches so callers can assert on them.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<SitePath, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Paths that do not normalize are ignored.
    pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        match SitePath::new(path) {
            Ok(path) => {
                self.files.insert(path, contents.into());
            }
            Err(e) => tracing::warn!(path, error = %e, "Ignoring memory source file"),
        }
        self
    }

    /// Number of fetches served so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for MemorySource {
    async fn fetch_bytes(&self, path: &SitePath) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> SitePath {
        SitePath::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_memory_source_serves_and_counts() {
        let source = MemorySource::new()
            .with_file("index.html", "<p>hi</p>")
            .with_file("img/raw.bin", vec![0xff, 0xfe]);

        assert_eq!(source.fetch_text(&path("index.html")).await.unwrap(), "<p>hi</p>");
        assert!(matches!(
            source.fetch_text(&path("img/raw.bin")).await,
            Err(FetchError::InvalidUtf8(_))
        ));
        assert!(matches!(
            source.fetch_bytes(&path("missing.html")).await,
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_directory_source_reads_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/a.html"), "<h1>A</h1>").unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(source.fetch_text(&path("docs/a.html")).await.unwrap(), "<h1>A</h1>");
        assert!(matches!(
            source.fetch_text(&path("docs/b.html")).await,
            Err(FetchError::NotFound(_))
        ));
    }
}
