//! Canonical HTML serializer
//!
//! Output is the form the parser reads back to an identical tree, so
//! `serialize(parse(serialize(t))) == serialize(t)` for every tree `t`.

use crate::dom::{is_void_element, DomTree, NodeData, NodeId};
use crate::tokenizer::find_close_tag;

pub const DOCTYPE: &str = "<!DOCTYPE html>\n";

/// Elements whose text children are written verbatim
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements whose content is text only, with character references decoded
pub(crate) fn is_escapable_raw_text_element(tag: &str) -> bool {
    matches!(tag, "title" | "textarea")
}

/// Elements that can only hold a single run of text
pub fn is_text_only_element(tag: &str) -> bool {
    is_raw_text_element(tag) || is_escapable_raw_text_element(tag)
}

/// Whether `text` survives being written verbatim inside `<tag>`.
///
/// Raw text cannot contain its own end tag; everything else is escaped.
pub fn raw_text_fits(tag: &str, text: &str) -> bool {
    !is_raw_text_element(tag) || find_close_tag(text, tag).is_none()
}

/// Full document: doctype line followed by the root element's outer HTML
pub fn serialize_document(tree: &DomTree) -> String {
    let mut out = String::from(DOCTYPE);
    write_node(tree, tree.root(), &mut out);
    out
}

pub fn outer_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

pub fn inner_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_children(tree, id, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.data(id) {
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for attr in &element.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attribute(&attr.value, out);
                out.push('"');
            }
            out.push('>');
            if is_void_element(&element.tag) {
                return;
            }
            write_children(tree, id, out);
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        NodeData::Text(text) => {
            let raw = tree
                .parent(id)
                .and_then(|parent| tree.tag(parent))
                .is_some_and(is_raw_text_element);
            if raw {
                out.push_str(text);
            } else {
                escape_text(text, out);
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

fn write_children(tree: &DomTree, id: NodeId, out: &mut String) {
    for &child in tree.children(id) {
        write_node(tree, child, out);
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}
