//! # Document Mutations
//!
//! Editor operations on the live tree. Each one is validated against the
//! tree and the current selection before anything changes, so a failed
//! mutation never leaves a partial edit behind and never costs an undo step.
//!
//! ## Targets
//!
//! Operations that add content (`InsertElement`, `InsertFragment`) append to
//! the selection, or to the body when nothing is selected. Everything else
//! requires a selection.
//!
//! ## Resulting selection
//!
//! | Mutation | Selection afterwards |
//! |---|---|
//! | `ApplyInspector` | the edited (possibly replaced) element |
//! | `Delete` | the former parent, none for the body |
//! | `InsertElement` | the new element |
//! | `Wrap` | the new wrapper |
//! | `MoveUp` / `MoveDown` / `SetImageSource` | unchanged |
//! | `Duplicate` | the clone |
//! | `InsertFragment` / `ReplaceHead` | unchanged |

use crate::inspector::{apply_diff, is_document_structure, validate_diff, FieldValues};
use pagecraft_html::{
    is_text_only_element, is_valid_tag_name, is_void_element, parse_fragment, DomTree, NodeId, ParseResult,
    MAX_DEPTH,
};
use thiserror::Error;

/// Parsed markup ready to be spliced into a document
#[derive(Debug, Clone)]
pub struct Fragment(DomTree);

impl Fragment {
    pub fn parse(markup: &str) -> ParseResult<Self> {
        parse_fragment(markup).map(Self)
    }

    pub fn is_empty(&self) -> bool {
        self.0.children(self.0.root()).is_empty()
    }

    /// Element levels the fragment adds below its insertion point
    fn height(&self) -> usize {
        self.0.height(self.0.root()).saturating_sub(1)
    }

    /// Copy every top-level node into `tree` as trailing children of `parent`.
    fn append_to(&self, tree: &mut DomTree, parent: NodeId) {
        for &node in self.0.children(self.0.root()) {
            let imported = tree.import(&self.0, node);
            tree.append_child(parent, imported);
        }
    }
}

/// Editor operations
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Apply inspector field values to the selection
    ApplyInspector(FieldValues),

    /// Remove the selection
    Delete,

    /// Append a new element to the target
    InsertElement { tag: String },

    /// Wrap the selection in a `<div>`
    Wrap,

    /// Swap the selection with its previous element sibling
    MoveUp,

    /// Swap the selection with its next element sibling
    MoveDown,

    /// Insert a deep copy of the selection right after it
    Duplicate,

    /// Append fragment nodes (a component) to the target
    InsertFragment(Fragment),

    /// Set `src` on the selected image
    SetImageSource { src: String },

    /// Replace the children of `<head>`
    ReplaceHead(Fragment),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("No element selected")]
    NoSelection,

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid tag name: {0:?}")]
    InvalidTagName(String),

    #[error("Nesting deeper than {0} elements")]
    NestingTooDeep(usize),
}

/// Result of validating a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The mutation would change the document
    Apply,
    /// The mutation would leave the document as it is
    Unchanged,
}

impl Mutation {
    /// Short label for history entries and status lines
    pub fn description(&self) -> String {
        match self {
            Mutation::ApplyInspector(_) => "Apply inspector changes".to_string(),
            Mutation::Delete => "Delete element".to_string(),
            Mutation::InsertElement { tag } => format!("Insert <{}>", tag.trim().to_ascii_lowercase()),
            Mutation::Wrap => "Wrap in div".to_string(),
            Mutation::MoveUp => "Move up".to_string(),
            Mutation::MoveDown => "Move down".to_string(),
            Mutation::Duplicate => "Duplicate element".to_string(),
            Mutation::InsertFragment(_) => "Insert component".to_string(),
            Mutation::SetImageSource { .. } => "Set image source".to_string(),
            Mutation::ReplaceHead(_) => "Edit head".to_string(),
        }
    }

    /// Check the mutation against `tree` without changing it.
    pub fn validate(&self, tree: &DomTree, selection: Option<NodeId>) -> Result<Plan, MutationError> {
        let selected = || selection.ok_or(MutationError::NoSelection);

        match self {
            Mutation::ApplyInspector(values) => {
                validate_diff(tree, selected()?, values)?;
                Ok(Plan::Apply)
            }

            Mutation::Delete => {
                let node = selected()?;
                if node == tree.root() {
                    return Err(MutationError::InvalidTarget("cannot delete the document root".to_string()));
                }
                Ok(Plan::Apply)
            }

            Mutation::InsertElement { tag } => {
                let tag = tag.trim().to_ascii_lowercase();
                if !is_valid_tag_name(&tag) {
                    return Err(MutationError::InvalidTagName(tag));
                }
                let target = container_target(tree, selection)?;
                check_depth(tree.depth(target) + 1)?;
                Ok(Plan::Apply)
            }

            Mutation::Wrap => {
                let node = selected()?;
                if is_document_structure(tree, node) {
                    return Err(MutationError::InvalidTarget(format!(
                        "cannot wrap <{}>",
                        tree.tag(node).unwrap_or_default()
                    )));
                }
                check_depth(tree.depth(node) + tree.height(node))?;
                Ok(Plan::Apply)
            }

            Mutation::MoveUp => {
                let node = selected()?;
                Ok(match tree.previous_element_sibling(node) {
                    Some(_) => Plan::Apply,
                    None => Plan::Unchanged,
                })
            }

            Mutation::MoveDown => {
                let node = selected()?;
                Ok(match tree.next_element_sibling(node) {
                    Some(_) => Plan::Apply,
                    None => Plan::Unchanged,
                })
            }

            Mutation::Duplicate => {
                let node = selected()?;
                if node == tree.root() {
                    return Err(MutationError::InvalidTarget("cannot duplicate the document root".to_string()));
                }
                Ok(Plan::Apply)
            }

            Mutation::InsertFragment(fragment) => {
                let target = container_target(tree, selection)?;
                if fragment.is_empty() {
                    return Ok(Plan::Unchanged);
                }
                check_depth(tree.depth(target) + fragment.height())?;
                Ok(Plan::Apply)
            }

            Mutation::SetImageSource { src } => {
                let node = selected()?;
                if !tree.is_element(node, "img") {
                    return Err(MutationError::InvalidTarget("select an image first".to_string()));
                }
                let src = src.trim();
                Ok(if src.is_empty() || tree.attribute(node, "src") == Some(src) {
                    Plan::Unchanged
                } else {
                    Plan::Apply
                })
            }

            Mutation::ReplaceHead(fragment) => {
                let head_depth = tree.head().map_or(2, |head| tree.depth(head));
                check_depth(head_depth + fragment.height())?;
                Ok(Plan::Apply)
            }
        }
    }

    /// Perform a validated mutation. Returns the new selection.
    pub fn apply(&self, tree: &mut DomTree, selection: Option<NodeId>) -> Option<NodeId> {
        match self {
            Mutation::ApplyInspector(values) => {
                let node = selection?;
                Some(apply_diff(tree, node, values))
            }

            Mutation::Delete => {
                let node = selection?;
                let parent = tree.parent(node);
                let was_body = tree.body() == Some(node);
                tree.detach(node);
                if was_body {
                    None
                } else {
                    parent
                }
            }

            Mutation::InsertElement { tag } => {
                let target = selection.or_else(|| tree.body())?;
                let tag = tag.trim().to_ascii_lowercase();
                let element = tree.create_element(&tag);
                if tag == "img" {
                    tree.set_attribute(element, "alt", "");
                } else if !is_void_element(&tag) {
                    tree.set_text_content(element, &format!("{tag} element"));
                }
                tree.append_child(target, element);
                Some(element)
            }

            Mutation::Wrap => {
                let node = selection?;
                let wrapper = tree.create_element("div");
                tree.replace(node, wrapper);
                tree.append_child(wrapper, node);
                Some(wrapper)
            }

            Mutation::MoveUp => {
                let node = selection?;
                if let Some(previous) = tree.previous_element_sibling(node) {
                    tree.insert_before(node, previous);
                }
                Some(node)
            }

            Mutation::MoveDown => {
                let node = selection?;
                if let Some(next) = tree.next_element_sibling(node) {
                    tree.insert_after(node, next);
                }
                Some(node)
            }

            Mutation::Duplicate => {
                let node = selection?;
                let clone = tree.deep_clone(node);
                tree.insert_after(clone, node);
                Some(clone)
            }

            Mutation::InsertFragment(fragment) => {
                if let Some(target) = selection.or_else(|| tree.body()) {
                    fragment.append_to(tree, target);
                }
                selection
            }

            Mutation::SetImageSource { src } => {
                let node = selection?;
                tree.set_attribute(node, "src", src.trim());
                Some(node)
            }

            Mutation::ReplaceHead(fragment) => {
                let head = match tree.head() {
                    Some(head) => head,
                    None => {
                        let head = tree.create_element("head");
                        let root = tree.root();
                        tree.insert_child(root, 0, head);
                        head
                    }
                };
                tree.take_children(head);
                fragment.append_to(tree, head);
                selection
            }
        }
    }
}

/// Selection or body, which must be able to hold children
fn container_target(tree: &DomTree, selection: Option<NodeId>) -> Result<NodeId, MutationError> {
    let target = selection
        .or_else(|| tree.body())
        .ok_or_else(|| MutationError::InvalidTarget("document has no body".to_string()))?;
    match tree.tag(target) {
        Some(tag) if is_void_element(tag) => Err(MutationError::InvalidTarget(format!(
            "<{tag}> cannot have children"
        ))),
        Some(tag) if is_text_only_element(tag) => Err(MutationError::InvalidTarget(format!(
            "<{tag}> can only hold text"
        ))),
        Some(_) => Ok(target),
        None => Err(MutationError::InvalidTarget("not an element".to_string())),
    }
}

/// Element nesting a mutation would produce, checked against the parser's limit
fn check_depth(levels: usize) -> Result<(), MutationError> {
    if levels > MAX_DEPTH {
        return Err(MutationError::NestingTooDeep(MAX_DEPTH));
    }
    Ok(())
}
