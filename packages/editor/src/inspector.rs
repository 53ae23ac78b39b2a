//! # Inspector
//!
//! Projects the selected element into a list of editable fields and applies
//! edited field values back onto the tree.
//!
//! ## Field policy
//!
//! Every element shows its tag, `id`, `class`, `title`, `aria-label`, `role`,
//! `style` and text content. `href`, `src`, `alt` show up when present or
//! relevant to the tag, and links, images and form fields get their own
//! extras (see [`project_fields`]).
//!
//! ## Applying a diff
//!
//! [`apply_diff`] may replace the element with one of a different tag. The
//! replacement takes over the children and every attribute except `id`,
//! `class`, `href`, `src` and `style`; those are expected to arrive with
//! the submitted values. An empty value removes the attribute.

use crate::affordances::is_editor_class;
use crate::mutations::MutationError;
use pagecraft_html::{
    is_text_only_element, is_valid_tag_name, is_void_element, raw_text_fits, DomTree, NodeData, NodeId,
};

/// Attributes the inspector may write
pub const EDITABLE_ATTRIBUTES: &[&str] = &[
    "id",
    "class",
    "href",
    "src",
    "style",
    "title",
    "alt",
    "target",
    "rel",
    "download",
    "width",
    "height",
    "name",
    "value",
    "placeholder",
    "aria-label",
    "role",
];

/// Attributes not carried over when the tag changes
const TAG_CHANGE_EXCLUDED: &[&str] = &["id", "class", "href", "src", "style"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Tag,
    Attribute(String),
    Text,
}

impl Field {
    pub fn attribute(name: &str) -> Self {
        Field::Attribute(name.to_ascii_lowercase())
    }

    pub fn label(&self) -> &str {
        match self {
            Field::Tag => "Tag",
            Field::Attribute(name) if name == "style" => "style (inline)",
            Field::Attribute(name) => name,
            Field::Text => "textContent",
        }
    }
}

/// One projected field with its current value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorField {
    pub field: Field,
    pub value: String,
    /// Edited as multi-line text
    pub multiline: bool,
}

/// Submitted field values, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(Vec<(Field, String)>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldValues::set`]
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a value, replacing an earlier value for the same field
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == field) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((field, value)),
        }
    }

    pub fn get(&self, field: &Field) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &str)> {
        self.0.iter().map(|(field, value)| (field, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requested tag, trimmed and lowercased. `None` when blank.
    pub fn tag(&self) -> Option<String> {
        self.get(&Field::Tag)
            .map(|tag| tag.trim().to_ascii_lowercase())
            .filter(|tag| !tag.is_empty())
    }
}

impl From<Vec<InspectorField>> for FieldValues {
    fn from(fields: Vec<InspectorField>) -> Self {
        Self(
            fields
                .into_iter()
                .map(|field| (field.field, field.value))
                .collect(),
        )
    }
}

/// Fields the inspector shows for `node`, in display order.
///
/// The editor's own marker classes are left out of the `class` value.
pub fn project_fields(tree: &DomTree, node: NodeId) -> Vec<InspectorField> {
    let Some(tag) = tree.tag(node) else {
        return Vec::new();
    };
    let has = |name: &str| tree.has_attribute(node, name);
    let mut fields = Vec::new();
    let mut push = |field: Field, value: String| {
        let multiline = field == Field::Text;
        fields.push(InspectorField {
            field,
            value,
            multiline,
        });
    };
    let attr = |name: &str| tree.attribute(node, name).unwrap_or_default().to_string();

    push(Field::Tag, tag.to_string());
    push(Field::attribute("id"), attr("id"));
    push(Field::attribute("class"), visible_classes(tree, node));
    if has("href") || tag == "a" {
        push(Field::attribute("href"), attr("href"));
    }
    if has("src") {
        push(Field::attribute("src"), attr("src"));
    }
    push(Field::attribute("title"), attr("title"));
    if has("alt") || tag == "img" {
        push(Field::attribute("alt"), attr("alt"));
    }
    match tag {
        "a" => {
            push(Field::attribute("target"), attr("target"));
            push(Field::attribute("rel"), attr("rel"));
            if has("download") {
                push(Field::attribute("download"), attr("download"));
            }
        }
        "img" => {
            push(Field::attribute("width"), attr("width"));
            push(Field::attribute("height"), attr("height"));
        }
        "input" | "textarea" => {
            push(Field::attribute("name"), attr("name"));
            if tag == "input" {
                push(Field::attribute("value"), attr("value"));
            }
            push(Field::attribute("placeholder"), attr("placeholder"));
        }
        _ => {}
    }
    push(Field::attribute("aria-label"), attr("aria-label"));
    push(Field::attribute("role"), attr("role"));
    push(Field::attribute("style"), attr("style"));
    push(Field::Text, tree.text_content(node));
    fields
}

/// `class` attribute without the editor's marker classes
pub fn visible_classes(tree: &DomTree, node: NodeId) -> String {
    tree.attribute(node, "class")
        .unwrap_or_default()
        .split_ascii_whitespace()
        .filter(|class| !is_editor_class(class))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check a diff against `node` without touching the tree.
pub fn validate_diff(tree: &DomTree, node: NodeId, values: &FieldValues) -> Result<(), MutationError> {
    let Some(current) = tree.tag(node) else {
        return Err(MutationError::InvalidTarget("not an element".to_string()));
    };
    let requested = values.tag();
    if let Some(requested) = &requested {
        if !is_valid_tag_name(requested) {
            return Err(MutationError::InvalidTagName(requested.clone()));
        }
        if requested != current && is_document_structure(tree, node) {
            return Err(MutationError::InvalidTarget(format!(
                "cannot change the tag of <{current}>"
            )));
        }
    }
    let tag = requested.as_deref().unwrap_or(current);
    validate_content(tree, node, tag, values.get(&Field::Text))
}

/// Content `node` would hold after the diff must still serialize as itself
/// under `tag`. `text` replaces the children when present.
fn validate_content(tree: &DomTree, node: NodeId, tag: &str, text: Option<&str>) -> Result<(), MutationError> {
    if is_void_element(tag) {
        let empty = match text {
            Some(text) => text.is_empty(),
            None => tree.children(node).is_empty(),
        };
        if !empty {
            return Err(MutationError::InvalidTarget(format!("<{tag}> cannot have children")));
        }
    } else if is_text_only_element(tag) {
        let text = match text {
            Some(text) => text.to_string(),
            None => {
                let only_text = tree
                    .children(node)
                    .iter()
                    .all(|&child| matches!(tree.data(child), NodeData::Text(_)));
                if !only_text {
                    return Err(MutationError::InvalidTarget(format!("<{tag}> can only hold text")));
                }
                tree.text_content(node)
            }
        };
        if !raw_text_fits(tag, &text) {
            return Err(MutationError::InvalidTarget(format!("text cannot contain </{tag}>")));
        }
    }
    Ok(())
}

/// Root, head or body
pub(crate) fn is_document_structure(tree: &DomTree, node: NodeId) -> bool {
    node == tree.root() || Some(node) == tree.head() || Some(node) == tree.body()
}

/// Apply `values` to `node`. Returns the node now holding the values, which
/// differs from `node` when the tag changed.
///
/// Callers validate first with [`validate_diff`].
pub fn apply_diff(tree: &mut DomTree, node: NodeId, values: &FieldValues) -> NodeId {
    let mut target = node;

    if let Some(requested) = values.tag() {
        if tree.tag(node) != Some(requested.as_str()) {
            let replacement = tree.create_element(&requested);
            for child in tree.take_children(node) {
                tree.append_child(replacement, child);
            }
            let carried: Vec<(String, String)> = tree
                .attributes(node)
                .iter()
                .filter(|attr| !TAG_CHANGE_EXCLUDED.contains(&attr.name.as_str()))
                .map(|attr| (attr.name.clone(), attr.value.clone()))
                .collect();
            for (name, value) in carried {
                tree.set_attribute(replacement, &name, value);
            }
            tree.replace(node, replacement);
            target = replacement;
        }
    }

    for (field, value) in values.iter() {
        match field {
            Field::Attribute(name) if EDITABLE_ATTRIBUTES.contains(&name.as_str()) => {
                if value.is_empty() {
                    tree.remove_attribute(target, name);
                } else {
                    tree.set_attribute(target, name, value);
                }
            }
            Field::Text => tree.set_text_content(target, value),
            _ => {}
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_html::{outer_html, parse_document};

    fn first_in_body(tree: &DomTree) -> NodeId {
        let body = tree.body().unwrap();
        tree.element_children(body).next().unwrap()
    }

    #[test]
    fn test_tag_change_clears_and_overwrites() {
        let mut tree =
            parse_document(r#"<body><span class="x" id="y">hello</span></body>"#).unwrap();
        let span = first_in_body(&tree);
        let values = FieldValues::new()
            .with(Field::Tag, "div")
            .with(Field::attribute("id"), "")
            .with(Field::attribute("class"), "z");

        validate_diff(&tree, span, &values).unwrap();
        let div = apply_diff(&mut tree, span, &values);
        assert_ne!(div, span);
        assert!(!tree.is_attached(span));
        assert_eq!(outer_html(&tree, div), r#"<div class="z">hello</div>"#);
    }

    #[test]
    fn test_tag_change_carries_other_attributes() {
        let mut tree = parse_document(
            r#"<body><a href="/x" title="t" data-k="1" style="color:red"><b>bold</b></a></body>"#,
        )
        .unwrap();
        let link = first_in_body(&tree);
        let button = apply_diff(&mut tree, link, &FieldValues::new().with(Field::Tag, "BUTTON"));
        assert_eq!(
            outer_html(&tree, button),
            r#"<button title="t" data-k="1"><b>bold</b></button>"#
        );
    }

    #[test]
    fn test_text_field_replaces_children() {
        let mut tree = parse_document("<body><p>one <em>two</em></p></body>").unwrap();
        let p = first_in_body(&tree);
        let values = FieldValues::new().with(Field::Text, "plain");
        let same = apply_diff(&mut tree, p, &values);
        assert_eq!(same, p);
        assert_eq!(outer_html(&tree, p), "<p>plain</p>");
    }

    #[test]
    fn test_unknown_attributes_are_ignored() {
        let mut tree = parse_document("<body><p>x</p></body>").unwrap();
        let p = first_in_body(&tree);
        let values = FieldValues::new().with(Field::attribute("onclick"), "alert(1)");
        apply_diff(&mut tree, p, &values);
        assert!(!tree.has_attribute(p, "onclick"));
    }

    #[test]
    fn test_invalid_tag_rejected() {
        let tree = parse_document("<body><p>x</p></body>").unwrap();
        let p = first_in_body(&tree);
        let values = FieldValues::new().with(Field::Tag, "1bad");
        assert_eq!(
            validate_diff(&tree, p, &values),
            Err(MutationError::InvalidTagName("1bad".to_string()))
        );
        let body = tree.body().unwrap();
        let values = FieldValues::new().with(Field::Tag, "div");
        assert!(matches!(
            validate_diff(&tree, body, &values),
            Err(MutationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_text_only_tags_reject_markup() {
        let tree = parse_document(
            "<head><title>t</title><script>let a = 1;</script></head><body><div><img src=a.png></div><p>x</p></body>",
        )
        .unwrap();
        let head = tree.head().unwrap();
        let mut head_children = tree.element_children(head);
        let title = head_children.next().unwrap();
        let script = head_children.next().unwrap();
        let div = first_in_body(&tree);
        let img = tree.element_children(div).next().unwrap();

        for tag in ["textarea", "title", "script", "style"] {
            let values = FieldValues::new().with(Field::Tag, tag);
            assert!(
                matches!(validate_diff(&tree, div, &values), Err(MutationError::InvalidTarget(_))),
                "{tag}"
            );
        }
        // Text replaces the children, so the same tag change is fine with it
        let values = FieldValues::new().with(Field::Tag, "textarea").with(Field::Text, "<img>");
        assert_eq!(validate_diff(&tree, div, &values), Ok(()));

        let closing = FieldValues::new().with(Field::Text, "x = '</SCRIPT>';");
        assert!(matches!(
            validate_diff(&tree, script, &closing),
            Err(MutationError::InvalidTarget(_))
        ));
        let escaped = FieldValues::new().with(Field::Text, "a < b </title>");
        assert_eq!(validate_diff(&tree, title, &escaped), Ok(()));

        let void_text = FieldValues::new().with(Field::Text, "caption");
        assert!(matches!(
            validate_diff(&tree, img, &void_text),
            Err(MutationError::InvalidTarget(_))
        ));
        let to_void = FieldValues::new().with(Field::Tag, "br");
        assert!(matches!(
            validate_diff(&tree, div, &to_void),
            Err(MutationError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_projection_policy() {
        let tree = parse_document(
            r#"<body><img src="a.png" class="hero _editor-highlight"><a>l</a><input name="q"></body>"#,
        )
        .unwrap();
        let body = tree.body().unwrap();
        let nodes: Vec<NodeId> = tree.element_children(body).collect();

        let img = project_fields(&tree, nodes[0]);
        let keys: Vec<&str> = img.iter().map(|f| f.field.label()).collect();
        assert_eq!(
            keys,
            vec![
                "Tag", "id", "class", "src", "title", "alt", "width", "height", "aria-label",
                "role", "style (inline)", "textContent"
            ]
        );
        assert_eq!(img[2].value, "hero");

        let link: Vec<Field> = project_fields(&tree, nodes[1]).into_iter().map(|f| f.field).collect();
        assert!(link.contains(&Field::attribute("href")));
        assert!(link.contains(&Field::attribute("target")));
        assert!(!link.contains(&Field::attribute("download")));

        let input = project_fields(&tree, nodes[2]);
        let name = input.iter().find(|f| f.field == Field::attribute("name")).unwrap();
        assert_eq!(name.value, "q");
        assert!(input.last().unwrap().multiline);
    }

    #[test]
    fn test_projection_round_trip_is_identity() {
        let mut tree =
            parse_document(r#"<body><a href="/a" rel="me" title="x">go</a></body>"#).unwrap();
        let link = first_in_body(&tree);
        let before = outer_html(&tree, link);
        let values = FieldValues::from(project_fields(&tree, link));
        let after = apply_diff(&mut tree, link, &values);
        assert_eq!(after, link);
        assert_eq!(outer_html(&tree, link), before);
    }
}
