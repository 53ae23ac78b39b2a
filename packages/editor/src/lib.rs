//! # Pagecraft Editor
//!
//! Editing core for a static site: load a page, select and change its
//! elements, keep per-page edits in a buffer and export clean copies.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ source: SourceProvider (directory, memory)  │
//! └─────────────────────────────────────────────┘
//!                     ↓ fetch
//! ┌─────────────────────────────────────────────┐
//! │ document: original cache + edit buffer      │
//! └─────────────────────────────────────────────┘
//!                     ↓ load / save
//! ┌─────────────────────────────────────────────┐
//! │ session: live tree, selection, undo/redo    │
//! │  - inspector diffs and structural mutations │
//! │  - editor affordances                       │
//! └─────────────────────────────────────────────┘
//!                     ↓ export
//! ┌─────────────────────────────────────────────┐
//! │ sanitize + assets → ExportBundle → sink     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots are text**: undo history, the buffer and the cache all
//!    hold serialized documents; restoring one replaces the whole tree
//! 2. **One live tree**: the session owns it; selections are node handles
//!    into it and never outlive a tree replacement
//! 3. **Validate before recording**: a rejected edit costs no undo step
//! 4. **Export is clean**: nothing the editor injected survives sanitizing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{DirectorySource, EditorConfig, EditorSession, SitePath};
//!
//! let source = Arc::new(DirectorySource::new("site"));
//! let mut session = EditorSession::new(source, EditorConfig::default());
//!
//! session.load(&SitePath::new("index.html")?).await?;
//! session.select(Some(&"1.0".parse()?))?;
//! session.wrap_selected()?;
//! session.save()?;
//!
//! let bundle = session.export(true).await?;
//! ```

pub mod affordances;
pub mod assets;
mod config;
mod document;
mod errors;
pub mod export;
pub mod inspector;
mod mutations;
mod path;
pub mod sanitize;
mod session;
mod snapshot;
pub mod source;
mod undo_stack;

pub use assets::{Asset, AssetCollector};
pub use config::EditorConfig;
pub use document::{DocumentStore, StoredContent};
pub use errors::{EditorError, HistoryDirection};
pub use export::{ArchiveSink, DirectorySink, ExportBundle, ExportError, ExportedDocument};
pub use inspector::{Field, FieldValues, InspectorField};
pub use mutations::{Fragment, Mutation, MutationError, Plan};
pub use path::{PathError, SitePath};
pub use sanitize::{Sanitized, SanitizeWarning, Sanitizer};
pub use session::{
    Breadcrumb, EditorSession, LoadOutcome, LoadTicket, MutationOutcome, Viewport,
};
pub use snapshot::Snapshot;
pub use source::{DirectorySource, FetchError, MemorySource, SourceProvider};
pub use undo_stack::{HistoryEntry, UndoStack};

// Re-export the document model for convenience
pub use pagecraft_html::{DomTree, NodeId, NodePath};
