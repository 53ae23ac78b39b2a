//! # Asset Collector
//!
//! Best-effort discovery of the files a set of pages references, for
//! packaging next to the pages in an export.
//!
//! Every `src` and `href` value that points into the site is collected
//! once; in-page anchors, `mailto:`/`tel:` links and absolute URLs are not.
//! Each asset is fetched with its own timeout. Failed fetches are logged and
//! skipped; collection itself never fails.

use crate::path::SitePath;
use crate::source::{FetchError, SourceProvider};
use pagecraft_html::{parse_document, DomTree};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Archive directory assets are staged under
pub const ASSET_DIR: &str = "assets";

const REFERENCE_ATTRIBUTES: &[&str] = &["src", "href"];

/// A fetched asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: SitePath,
    pub bytes: Vec<u8>,
}

impl Asset {
    /// Location inside the export archive: `assets/<path>`
    pub fn archive_path(&self) -> String {
        format!("{ASSET_DIR}/{}", self.path)
    }
}

/// Whether a `src`/`href` value refers to a file inside the site
pub fn is_collectable(reference: &str) -> bool {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return false;
    }
    let lower = reference.to_ascii_lowercase();
    let external = ["mailto:", "tel:", "http://", "https://", "//", "data:", "javascript:"];
    !external.iter().any(|prefix| lower.starts_with(prefix))
}

/// Site path a reference points at, with any query or fragment removed
pub fn reference_path(reference: &str) -> Option<SitePath> {
    if !is_collectable(reference) {
        return None;
    }
    let reference = reference.trim();
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    SitePath::new(&reference[..end]).ok()
}

/// Every collectable reference in `tree`
pub fn asset_references(tree: &DomTree) -> BTreeSet<SitePath> {
    let mut found = BTreeSet::new();
    for node in tree.preorder(tree.root()) {
        for name in REFERENCE_ATTRIBUTES {
            if let Some(path) = tree.attribute(node, name).and_then(reference_path) {
                found.insert(path);
            }
        }
    }
    found
}

pub struct AssetCollector {
    provider: Arc<dyn SourceProvider>,
    timeout: Duration,
}

impl AssetCollector {
    pub fn new(provider: Arc<dyn SourceProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Fetch every asset referenced by `documents`.
    ///
    /// Documents that fail to parse contribute no references. Assets come
    /// back in path order.
    pub async fn collect<'a, I>(&self, documents: I) -> Vec<Asset>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut references = BTreeSet::new();
        for html in documents {
            match parse_document(html) {
                Ok(tree) => references.extend(asset_references(&tree)),
                Err(e) => tracing::warn!(error = %e, "Skipping unparsable document during asset scan"),
            }
        }
        tracing::debug!(count = references.len(), "Collecting assets");

        let mut assets = Vec::new();
        for path in references {
            match self.fetch(&path).await {
                Ok(bytes) => assets.push(Asset { path, bytes }),
                Err(e) => tracing::warn!(path = %path, error = %e, "Skipping asset"),
            }
        }
        assets
    }

    async fn fetch(&self, path: &SitePath) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.timeout, self.provider.fetch_bytes(path)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::TimedOut(path.clone())),
        }
    }
}
