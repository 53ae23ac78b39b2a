//! # Editor Affordances
//!
//! Markers the editor writes into the live tree so the rendering surface
//! can show edit and select state: a style block, a select-mode badge,
//! highlight/hover classes and a few attributes. Everything written here is
//! removed again by [`crate::sanitize`] before export.
//!
//! Affordances are not part of the document's edit history. The session
//! re-applies them after every tree replacement.

use pagecraft_html::{DomTree, NodeId};

pub const STYLE_ID: &str = "_editor_style_injected";
pub const BADGE_ID: &str = "_editor_select_badge";
pub const BADGE_CLASS: &str = "_editor-badge";
pub const HIGHLIGHT_CLASS: &str = "_editor-highlight";
pub const HOVER_CLASS: &str = "_editor-hover";

/// Prefix of every attribute the editor owns
pub const PRIVATE_ATTRIBUTE_PREFIX: &str = "data-editor-";
pub const SELECT_MODE_ATTRIBUTE: &str = "data-editor-select";

const BADGE_TEXT: &str = "Select Mode: Click to pick element";

const EDITOR_CSS: &str = "
._editor-highlight{outline:2px dashed #22c55e; outline-offset:2px; cursor:crosshair;}
._editor-hover{outline:2px dashed #a78bfa; outline-offset:2px;}
[data-editor-select=\"on\"] *{ cursor: crosshair !important; }
._editor-badge{ position: fixed; top: 8px; right: 8px; z-index: 2147483647; font-size: 12px; background: #a78bfa; color: #fff; padding: 4px 6px; border-radius: 4px; box-shadow: 0 1px 2px rgba(0,0,0,0.2); font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; }
";

/// Marker classes the editor adds to elements
pub fn is_editor_class(class: &str) -> bool {
    matches!(class, HIGHLIGHT_CLASS | HOVER_CLASS)
}

/// Edit and select mode flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub editable: bool,
    pub select_mode: bool,
}

impl Affordances {
    /// Bring `tree` in line with the current modes. Idempotent.
    pub fn apply(&self, tree: &mut DomTree) {
        if self.editable || self.select_mode {
            ensure_styles(tree);
        } else {
            remove_styles(tree);
        }
        set_editable(tree, self.editable);
        sync_select_mode(tree, self.select_mode);
    }
}

/// Insert the editor style block into head unless it is already present.
pub fn ensure_styles(tree: &mut DomTree) {
    if tree.find_element_by_id(STYLE_ID).is_some() {
        return;
    }
    let parent = tree.head().unwrap_or_else(|| tree.root());
    let style = tree.create_element("style");
    tree.set_attribute(style, "id", STYLE_ID);
    tree.set_text_content(style, EDITOR_CSS);
    tree.append_child(parent, style);
}

pub fn remove_styles(tree: &mut DomTree) {
    if let Some(style) = tree.find_element_by_id(STYLE_ID) {
        tree.detach(style);
    }
}

pub fn set_editable(tree: &mut DomTree, enabled: bool) {
    let Some(body) = tree.body() else {
        return;
    };
    if enabled {
        tree.set_attribute(body, "contenteditable", "true");
    } else {
        tree.remove_attribute(body, "contenteditable");
    }
}

pub fn sync_select_mode(tree: &mut DomTree, enabled: bool) {
    let root = tree.root();
    let badge = tree.find_element_by_id(BADGE_ID);
    if enabled {
        tree.set_attribute(root, SELECT_MODE_ATTRIBUTE, "on");
        if badge.is_none() {
            if let Some(body) = tree.body() {
                let badge = tree.create_element("div");
                tree.set_attribute(badge, "id", BADGE_ID);
                tree.set_attribute(badge, "class", BADGE_CLASS);
                tree.set_text_content(badge, BADGE_TEXT);
                tree.append_child(body, badge);
            }
        }
    } else {
        tree.remove_attribute(root, SELECT_MODE_ATTRIBUTE);
        if let Some(badge) = badge {
            tree.detach(badge);
        }
    }
}

/// Remove highlight and hover classes from every element.
pub fn clear_markers(tree: &mut DomTree) {
    for node in tree.preorder(tree.root()) {
        tree.remove_class(node, HIGHLIGHT_CLASS);
        tree.remove_class(node, HOVER_CLASS);
    }
}

/// Highlight `node` as the only selected element.
pub fn mark_selected(tree: &mut DomTree, node: NodeId) {
    for other in tree.preorder(tree.root()) {
        if other != node {
            tree.remove_class(other, HIGHLIGHT_CLASS);
        }
    }
    tree.add_class(node, HIGHLIGHT_CLASS);
}

/// Move the hover marker to `node`, or clear it.
pub fn mark_hover(tree: &mut DomTree, node: Option<NodeId>) {
    for other in tree.preorder(tree.root()) {
        if Some(other) != node {
            tree.remove_class(other, HOVER_CLASS);
        }
    }
    if let Some(node) = node {
        tree.add_class(node, HOVER_CLASS);
    }
}
