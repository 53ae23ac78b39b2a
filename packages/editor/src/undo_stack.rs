//! # Undo/Redo Stack
//!
//! Snapshot history for the active document.
//!
//! ## Design
//!
//! - Before a mutation, the session records a snapshot of the document
//! - Undo swaps the current document for the most recent recorded snapshot
//!   and keeps the current one on the redo stack
//! - Redo does the reverse
//! - Recording a new snapshot clears the redo stack
//! - The undo stack holds at most `max_levels` entries; the oldest entry is
//!   evicted first
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! stack.record(Snapshot::capture(&tree), "Wrap in div");
//! // ...mutate tree...
//! let previous = stack.undo(Snapshot::capture(&tree)).unwrap();
//! let tree = previous.snapshot.restore()?;
//! ```

use crate::snapshot::Snapshot;
use std::collections::VecDeque;

/// One recorded document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,

    /// The edit that moved the document away from this state
    pub description: Option<String>,
}

/// Undo/redo stack of document snapshots
#[derive(Debug)]
pub struct UndoStack {
    /// Oldest first, most recent last
    undo_stack: VecDeque<HistoryEntry>,

    /// Most recent last
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    pub const DEFAULT_MAX_LEVELS: usize = 50;

    /// Create a new undo stack with default max levels (50)
    pub fn new() -> Self {
        Self::with_max_levels(Self::DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record the state before an edit. Clears redo history.
    pub fn record(&mut self, snapshot: Snapshot, description: impl Into<String>) {
        self.push_undo(HistoryEntry {
            snapshot,
            description: Some(description.into()),
        });
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push_back(entry);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.pop_front();
        }
    }

    /// Pop the most recent undo entry, keeping `current` for redo.
    ///
    /// Returns `None` and leaves both stacks untouched when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
        });
        Some(entry)
    }

    /// Pop the most recent redo entry, keeping `current` for undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.push_undo(HistoryEntry {
            snapshot: current,
            description: entry.description.clone(),
        });
        Some(entry)
    }

    /// The entry [`UndoStack::undo`] would return
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.back()
    }

    /// The entry [`UndoStack::redo`] would return
    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.peek_undo()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.peek_redo()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(text: &str) -> Snapshot {
        Snapshot::from_source(text)
    }

    #[test]
    fn test_undo_stack_creation() {
        let stack = UndoStack::new();
        assert_eq!(stack.undo_levels(), 0);
        assert_eq!(stack.redo_levels(), 0);
        assert_eq!(stack.max_levels(), 50);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_undo_then_redo_swaps_snapshots() {
        let mut stack = UndoStack::new();
        stack.record(snap("v0"), "Insert p");

        let undone = stack.undo(snap("v1")).unwrap();
        assert_eq!(undone.snapshot, snap("v0"));
        assert_eq!(stack.redo_levels(), 1);
        assert_eq!(stack.redo_description(), Some("Insert p"));

        let redone = stack.redo(snap("v0")).unwrap();
        assert_eq!(redone.snapshot, snap("v1"));
        assert_eq!(stack.undo_levels(), 1);
        assert_eq!(stack.redo_levels(), 0);
        assert_eq!(stack.undo_description(), Some("Insert p"));
    }

    #[test]
    fn test_empty_undo_leaves_redo_alone() {
        let mut stack = UndoStack::new();
        assert!(stack.undo(snap("current")).is_none());
        assert_eq!(stack.redo_levels(), 0);
        assert!(stack.redo(snap("current")).is_none());
        assert_eq!(stack.undo_levels(), 0);
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut stack = UndoStack::new();
        stack.record(snap("v0"), "first");
        stack.undo(snap("v1"));
        assert_eq!(stack.redo_levels(), 1);

        stack.record(snap("v0"), "second");
        assert_eq!(stack.redo_levels(), 0);
        assert_eq!(stack.undo_description(), Some("second"));
    }

    #[test]
    fn test_max_levels_evicts_oldest() {
        let mut stack = UndoStack::with_max_levels(2);
        for i in 0..3 {
            stack.record(snap(&format!("v{i}")), format!("edit {i}"));
        }
        assert_eq!(stack.undo_levels(), 2);

        assert_eq!(stack.undo(snap("v3")).unwrap().snapshot, snap("v2"));
        assert_eq!(stack.undo(snap("v2")).unwrap().snapshot, snap("v1"));
        assert!(stack.undo(snap("v1")).is_none());
    }

    #[test]
    fn test_redo_respects_max_levels() {
        let mut stack = UndoStack::with_max_levels(1);
        stack.record(snap("v0"), "a");
        stack.undo(snap("v1"));
        stack.redo(snap("v0"));
        assert_eq!(stack.undo_levels(), 1);
    }
}
