//! Document snapshots
//!
//! A [`Snapshot`] is the serialized text of a document. Snapshots captured
//! from a tree are canonical, so restoring one and capturing again gives the
//! same bytes. Undo history, the edit buffer and the original cache all store
//! documents in this form.

use pagecraft_html::{parse_document, serialize_document, DomTree, ParseResult};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    /// Serialize `tree`
    pub fn capture(tree: &DomTree) -> Self {
        Self(serialize_document(tree).into())
    }

    /// Wrap text exactly as fetched. Not necessarily canonical.
    pub fn from_source(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Parse back into a tree
    pub fn restore(&self) -> ParseResult<DomTree> {
        parse_document(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
