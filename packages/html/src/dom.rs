//! # Document Tree
//!
//! Arena-backed HTML tree. Nodes live in a flat `Vec` and are addressed by
//! [`NodeId`]; parent/child links are indices, so there is no aliasing and no
//! reference counting. Detached nodes stay in the arena until the whole tree
//! is dropped, which keeps every `NodeId` handed out by a tree valid for that
//! tree's lifetime.
//!
//! `NodeId`s are only meaningful for the tree that created them. Code that
//! needs to refer to a node across tree replacement uses [`NodePath`].

use std::fmt;
use std::str::FromStr;

/// Handle to a node in a [`DomTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in source order, names lowercase and unique
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tags that never have children or an end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Whether `tag` is usable as an element name: an ASCII letter followed by
/// ASCII alphanumerics, `-`, `_` or `:`.
pub fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

/// Mutable HTML tree with a single root element
#[derive(Debug, Clone)]
pub struct DomTree {
    slots: Vec<Slot>,
    root: NodeId,
}

impl DomTree {
    /// Empty `<html><head></head><body></body></html>` document
    pub fn new() -> Self {
        let mut tree = Self::with_root("html");
        let root = tree.root;
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        tree.append_child(root, head);
        tree.append_child(root, body);
        tree
    }

    pub(crate) fn with_root(tag: &str) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.create_element(tag);
        tree
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> &Slot {
        &self.slots[id.0]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.slots[id.0]
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    // ---- Node creation ----------------------------------------------------

    /// Create a detached element. The tag is lowercased.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Detached deep copy of `id` and its subtree
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.slot(id).data.clone();
        let copy = self.push(data);
        let children = self.slot(id).children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Detached deep copy of a subtree that lives in another tree
    pub fn import(&mut self, other: &DomTree, id: NodeId) -> NodeId {
        let copy = self.push(other.slot(id).data.clone());
        for &child in other.children(id) {
            let child_copy = self.import(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    // ---- Structure --------------------------------------------------------

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.slot(id).data
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slot(id).children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.is_any_element(child))
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn head(&self) -> Option<NodeId> {
        self.element_children(self.root)
            .find(|&child| self.is_element(child, "head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.element_children(self.root)
            .find(|&child| self.is_element(child, "body"))
    }

    /// Remove `id` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.slot_mut(id).parent.take() {
            self.slot_mut(parent).children.retain(|&child| child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.slot_mut(child).parent = Some(parent);
        self.slot_mut(parent).children.push(child);
    }

    /// Insert `child` at `index` among `parent`'s children (clamped).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.slot_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.slot_mut(child).parent = Some(parent);
    }

    /// Insert `child` immediately before `reference`, which must be attached.
    pub fn insert_before(&mut self, child: NodeId, reference: NodeId) {
        if child == reference {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(child);
        let index = self.index_in_parent(reference).unwrap_or(0);
        self.insert_child(parent, index, child);
    }

    /// Insert `child` immediately after `reference`, which must be attached.
    pub fn insert_after(&mut self, child: NodeId, reference: NodeId) {
        if child == reference {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(child);
        let index = self.index_in_parent(reference).map_or(0, |i| i + 1);
        self.insert_child(parent, index, child);
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(new, old);
        self.detach(old);
    }

    /// Detach and return every child of `id`, in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.slot_mut(id).children);
        for &child in &children {
            self.slot_mut(child).parent = None;
        }
        children
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&child| child == id)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|&sibling| self.is_any_element(sibling))
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&child| child == id)?;
        siblings[index + 1..]
            .iter()
            .copied()
            .find(|&sibling| self.is_any_element(sibling))
    }

    /// `id` and all of its descendants in document order
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Elements on the path from the top of `id`'s tree down to `id`
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_any_element(node) {
                depth += 1;
            }
            current = self.parent(node);
        }
        depth
    }

    /// Levels of element nesting at and below `id`; 0 for text and comments
    pub fn height(&self, id: NodeId) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(id, 0)];
        while let Some((node, above)) = stack.pop() {
            if !self.is_any_element(node) {
                continue;
            }
            let level = above + 1;
            deepest = deepest.max(level);
            stack.extend(self.children(node).iter().map(|&child| (child, level)));
        }
        deepest
    }

    /// First attached element whose `id` attribute equals `value`
    pub fn find_element_by_id(&self, value: &str) -> Option<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .find(|&node| self.attribute(node, "id") == Some(value))
    }

    // ---- Elements ---------------------------------------------------------

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.slot(id).data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.slot_mut(id).data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|element| element.tag.as_str())
    }

    pub fn is_any_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id)
            .map(|element| element.attributes.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute, keeping its position if it already exists.
    /// No-op on non-element nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match element.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => element.attributes.push(Attribute { name, value }),
        }
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(element) = self.element_mut(id) else {
            return false;
        };
        let before = element.attributes.len();
        element.attributes.retain(|attr| attr.name != name);
        element.attributes.len() != before
    }

    pub fn retain_attributes(&mut self, id: NodeId, mut keep: impl FnMut(&Attribute) -> bool) {
        if let Some(element) = self.element_mut(id) {
            element.attributes.retain(|attr| keep(attr));
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.is_any_element(id) || self.has_class(id, class) {
            return;
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", value);
    }

    /// Remove a class token. Drops the `class` attribute once it is empty.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let remaining: Vec<&str> = self
            .attribute(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .filter(|&c| c != class)
            .collect();
        if remaining.is_empty() {
            self.remove_attribute(id, "class");
        } else {
            let value = remaining.join(" ");
            self.set_attribute(id, "class", value);
        }
    }

    // ---- Text -------------------------------------------------------------

    /// Concatenated text of `id` and its descendants (comments excluded)
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.preorder(id) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace every child of `id` with a single text node (none if empty).
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text(existing) | NodeData::Comment(existing) = &mut self.slot_mut(id).data {
            *existing = text.to_string();
            return;
        }
        self.take_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    // ---- Paths ------------------------------------------------------------

    /// Child-index path from the root, or `None` if `id` is detached.
    pub fn path_of(&self, id: NodeId) -> Option<NodePath> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root {
            indices.push(self.index_in_parent(current)?);
            current = self.parent(current)?;
        }
        indices.reverse();
        Some(NodePath(indices))
    }

    pub fn resolve(&self, path: &NodePath) -> Option<NodeId> {
        let mut current = self.root;
        for &index in &path.0 {
            current = *self.children(current).get(index)?;
        }
        Some(current)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of a node as child indices from the root element.
///
/// Displays as dot-separated indices (`0.2.1`); the root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<NodePath> {
        let (_, rest) = self.0.split_last()?;
        Some(NodePath(rest.to_vec()))
    }

    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{idx}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(NodePath::root());
        }
        s.split('.')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(NodePath)
    }
}
