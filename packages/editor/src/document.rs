//! # Document Store
//!
//! Holds the two per-path maps the editor keeps for a site.
//!
//! - **Originals**: the text of each document exactly as first fetched.
//!   Written once per path and never modified.
//! - **Edits**: the last saved snapshot of each document the user has
//!   changed. This is the edit buffer that export reads from.
//!
//! Lookups prefer the edit buffer over the original:
//!
//! ```text
//! resolve(path) ──▶ edits[path] ──▶ originals[path] ──▶ None (fetch)
//! ```

use crate::path::SitePath;
use crate::snapshot::Snapshot;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Where a resolved document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredContent {
    Edited(Snapshot),
    Original(Snapshot),
}

impl StoredContent {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            StoredContent::Edited(snapshot) | StoredContent::Original(snapshot) => snapshot,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    originals: HashMap<SitePath, Snapshot>,
    /// Ordered so exports are deterministic
    edits: BTreeMap<SitePath, Snapshot>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, path: &SitePath) -> Option<StoredContent> {
        if let Some(edited) = self.edits.get(path) {
            return Some(StoredContent::Edited(edited.clone()));
        }
        self.originals
            .get(path)
            .map(|original| StoredContent::Original(original.clone()))
    }

    pub fn original(&self, path: &SitePath) -> Option<&Snapshot> {
        self.originals.get(path)
    }

    pub fn edited(&self, path: &SitePath) -> Option<&Snapshot> {
        self.edits.get(path)
    }

    /// Record fetched text. The first fetch of a path wins.
    pub fn cache_original(&mut self, path: &SitePath, snapshot: Snapshot) -> bool {
        if self.originals.contains_key(path) {
            return false;
        }
        self.originals.insert(path.clone(), snapshot);
        true
    }

    /// Store `snapshot` as the edited version of `path`, replacing any earlier save.
    pub fn save_edit(&mut self, path: &SitePath, snapshot: Snapshot) {
        self.edits.insert(path.clone(), snapshot);
    }

    pub fn discard_edit(&mut self, path: &SitePath) -> Option<Snapshot> {
        self.edits.remove(path)
    }

    /// Edited documents in path order
    pub fn edits(&self) -> impl Iterator<Item = (&SitePath, &Snapshot)> {
        self.edits.iter()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Every path with an original or an edit
    pub fn known_paths(&self) -> BTreeSet<SitePath> {
        self.originals
            .keys()
            .chain(self.edits.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> SitePath {
        SitePath::new(raw).unwrap()
    }

    #[test]
    fn test_edit_shadows_original() {
        let mut store = DocumentStore::new();
        let index = path("index.html");
        store.cache_original(&index, Snapshot::from_source("original"));
        assert_eq!(
            store.resolve(&index),
            Some(StoredContent::Original(Snapshot::from_source("original")))
        );

        store.save_edit(&index, Snapshot::from_source("edited"));
        assert_eq!(
            store.resolve(&index),
            Some(StoredContent::Edited(Snapshot::from_source("edited")))
        );

        store.discard_edit(&index);
        assert_eq!(store.resolve(&index).unwrap().snapshot().as_str(), "original");
    }

    #[test]
    fn test_original_is_write_once() {
        let mut store = DocumentStore::new();
        let index = path("index.html");
        assert!(store.cache_original(&index, Snapshot::from_source("first")));
        assert!(!store.cache_original(&index, Snapshot::from_source("second")));
        assert_eq!(store.original(&index).unwrap().as_str(), "first");
    }

    #[test]
    fn test_edits_iterate_in_path_order() {
        let mut store = DocumentStore::new();
        store.save_edit(&path("z.html"), Snapshot::from_source("z"));
        store.save_edit(&path("a.html"), Snapshot::from_source("a"));
        store.cache_original(&path("m.html"), Snapshot::from_source("m"));

        let order: Vec<&str> = store.edits().map(|(p, _)| p.as_str()).collect();
        assert_eq!(order, vec!["a.html", "z.html"]);
        assert_eq!(store.known_paths().len(), 3);
        assert_eq!(store.edit_count(), 2);
    }
}
