//! Error types for the editor

use crate::export::ExportError;
use crate::mutations::MutationError;
use crate::path::{PathError, SitePath};
use crate::source::FetchError;
use pagecraft_html::ParseError;
use std::fmt;
use thiserror::Error;

/// Which history stack an operation needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryDirection::Undo => write!(f, "undo"),
            HistoryDirection::Redo => write!(f, "redo"),
        }
    }
}

/// Errors surfaced by [`crate::EditorSession`].
///
/// None of these are fatal: the session is left in the state it had before
/// the failing operation, and the message is fit to show in a status line.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Could not load {path}: {source}")]
    Load {
        path: SitePath,
        #[source]
        source: FetchError,
    },

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    #[error("{0}")]
    Mutation(#[from] MutationError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Nothing to {0}")]
    EmptyHistory(HistoryDirection),

    #[error("No page loaded")]
    NoDocument,

    #[error("No edited pages to export")]
    NothingToExport,

    #[error("Invalid viewport width: {0:?}")]
    InvalidViewport(String),

    #[error("No element at {0}")]
    NodeNotFound(String),
}
