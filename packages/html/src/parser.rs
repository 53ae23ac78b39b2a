//! # Tree Builder
//!
//! Builds a [`DomTree`] from the token streams in [`crate::tokenizer`].
//!
//! The builder is lenient rather than standards-complete: it keeps an open
//! element stack, never pushes void elements, ignores end tags that match
//! nothing on the stack and merges adjacent text. Documents are then
//! normalized so the root is always `<html>` with a `<head>` and a `<body>`.
//! Normalization is stable, so serialized output parses back unchanged.

use crate::dom::{is_void_element, DomTree, NodeData, NodeId};
use crate::entities::decode_entities;
use crate::error::{ParseError, ParseResult};
use crate::serializer::{is_escapable_raw_text_element, is_raw_text_element};
use crate::tokenizer::{find_close_tag, Markup, TagPart};
use logos::{Lexer, Logos};

/// Maximum element nesting of a document, counting `<html>` as level 1
pub const MAX_DEPTH: usize = 512;

const HEAD_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "style", "title",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Document,
    Fragment,
}

/// Parse a full document.
pub fn parse_document(source: &str) -> ParseResult<DomTree> {
    let mut builder = TreeBuilder::new(Mode::Document);
    builder.run(source)?;
    let tree = builder.finish_document();
    // Synthesized wrappers and relocated strays add levels the builder never saw
    if tree.height(tree.root()) > MAX_DEPTH {
        return Err(ParseError::nesting_too_deep(source.len(), MAX_DEPTH));
    }
    Ok(tree)
}

/// Parse markup into a detached container element.
///
/// The returned tree's root is a `template` element whose children are the
/// top-level nodes of the fragment. `html`, `head` and `body` tags are
/// dropped and their content kept in place.
pub fn parse_fragment(source: &str) -> ParseResult<DomTree> {
    let mut builder = TreeBuilder::new(Mode::Fragment);
    builder.run(source)?;
    Ok(builder.tree)
}

struct TreeBuilder {
    tree: DomTree,
    container: NodeId,
    open: Vec<NodeId>,
    mode: Mode,
}

impl TreeBuilder {
    fn new(mode: Mode) -> Self {
        let tree = DomTree::with_root("template");
        let container = tree.root();
        Self {
            tree,
            container,
            open: Vec::new(),
            mode,
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.container)
    }

    fn run(&mut self, source: &str) -> ParseResult<()> {
        let mut lex = Markup::lexer(source);
        while let Some(token) = lex.next() {
            match token {
                Ok(Markup::Text(text)) => self.push_text(&decode_entities(text)),
                Ok(Markup::Lt) => self.push_text("<"),
                Ok(Markup::Comment(text)) => {
                    let comment = self.tree.create_comment(text);
                    self.tree.append_child(self.current(), comment);
                }
                Ok(Markup::Doctype) => {}
                Ok(Markup::EndTag(name)) => self.close(&name.to_ascii_lowercase()),
                Ok(Markup::TagOpen(name)) => {
                    let name = name.to_ascii_lowercase();
                    let pos = lex.span().start;
                    let mut tag_lex = lex.morph::<TagPart>();
                    let (attributes, self_closing) = lex_attributes(&mut tag_lex);
                    lex = tag_lex.morph();
                    let opened = self.open_element(&name, attributes, self_closing, pos)?;
                    if opened {
                        self.consume_text_content(&name, &mut lex);
                    }
                }
                // Unmatched input is kept as text
                Err(()) => self.push_text(lex.slice()),
            }
        }
        Ok(())
    }

    /// Returns whether the element was pushed onto the open stack.
    fn open_element(
        &mut self,
        name: &str,
        attributes: Vec<(String, String)>,
        self_closing: bool,
        pos: usize,
    ) -> ParseResult<bool> {
        if self.mode == Mode::Fragment && matches!(name, "html" | "head" | "body") {
            return Ok(false);
        }
        if self.open.len() >= MAX_DEPTH {
            return Err(ParseError::nesting_too_deep(pos, MAX_DEPTH));
        }

        let element = self.tree.create_element(name);
        for (attr_name, value) in attributes {
            if !self.tree.has_attribute(element, &attr_name) {
                self.tree.set_attribute(element, &attr_name, value);
            }
        }
        self.tree.append_child(self.current(), element);

        if self_closing || is_void_element(name) {
            return Ok(false);
        }
        self.open.push(element);
        Ok(true)
    }

    /// Raw text and escapable raw text bodies are taken straight from the
    /// source up to the matching end tag.
    fn consume_text_content<'src>(&mut self, name: &str, lex: &mut Lexer<'src, Markup<'src>>) {
        let raw = is_raw_text_element(name);
        if !raw && !is_escapable_raw_text_element(name) {
            return;
        }
        let rest = lex.remainder();
        let end = find_close_tag(rest, name).unwrap_or(rest.len());
        let body = &rest[..end];
        if raw {
            self.push_text(body);
        } else {
            self.push_text(&decode_entities(body));
        }
        lex.bump(end);
        if end == rest.len() {
            // No end tag before end of input
            self.close(name);
        }
    }

    fn close(&mut self, name: &str) {
        if let Some(index) = self
            .open
            .iter()
            .rposition(|&open| self.tree.is_element(open, name))
        {
            self.open.truncate(index);
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(&last) = self.tree.children(parent).last() {
            if let NodeData::Text(existing) = self.tree.data(last) {
                let merged = format!("{existing}{text}");
                self.tree.set_text_content(last, &merged);
                return;
            }
        }
        let node = self.tree.create_text(text);
        self.tree.append_child(parent, node);
    }

    fn finish_document(mut self) -> DomTree {
        let top: Vec<NodeId> = self.tree.children(self.container).to_vec();
        let html = top
            .iter()
            .copied()
            .find(|&node| self.tree.is_element(node, "html"));

        let (html, stray) = match html {
            Some(html) => {
                let stray: Vec<NodeId> = top
                    .into_iter()
                    .filter(|&node| node != html && !self.is_whitespace_text(node))
                    .collect();
                (html, stray)
            }
            None => {
                let html = self.tree.create_element("html");
                for node in top {
                    self.tree.append_child(html, node);
                }
                (html, Vec::new())
            }
        };

        self.tree.set_root(html);
        let body = normalize_document(&mut self.tree);
        for node in stray {
            self.tree.append_child(body, node);
        }
        self.tree
    }

    fn is_whitespace_text(&self, node: NodeId) -> bool {
        matches!(self.tree.data(node), NodeData::Text(text) if text.trim().is_empty())
    }
}

/// Ensure the root has a `<head>` and a `<body>` child. Returns the body.
///
/// A missing head collects the leading head-only content of the root; a
/// missing body collects everything after the head. Already normalized
/// trees are left untouched.
pub fn normalize_document(tree: &mut DomTree) -> NodeId {
    let root = tree.root();
    let body = tree.body();
    let head = match tree.head() {
        Some(head) => head,
        None => {
            let head = tree.create_element("head");
            let leading: Vec<NodeId> = tree
                .children(root)
                .iter()
                .copied()
                .take_while(|&child| Some(child) != body && is_head_content(tree, child))
                .collect();
            for child in leading {
                tree.append_child(head, child);
            }
            tree.insert_child(root, 0, head);
            head
        }
    };

    match body {
        Some(body) => body,
        None => {
            let body = tree.create_element("body");
            let after_head: Vec<NodeId> = tree
                .children(root)
                .iter()
                .copied()
                .skip_while(|&child| child != head)
                .skip(1)
                .collect();
            for child in after_head {
                tree.append_child(body, child);
            }
            tree.append_child(root, body);
            body
        }
    }
}

fn is_head_content(tree: &DomTree, node: NodeId) -> bool {
    match tree.data(node) {
        NodeData::Text(text) => text.trim().is_empty(),
        NodeData::Comment(_) => true,
        NodeData::Element(element) => HEAD_ELEMENTS.contains(&element.tag.as_str()),
    }
}

/// Lex attributes up to and including the closing `>`.
///
/// Returns lowercase names with decoded values (empty for bare attributes)
/// and whether the tag ended with `/>`.
fn lex_attributes<'src>(lex: &mut Lexer<'src, TagPart<'src>>) -> (Vec<(String, String)>, bool) {
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut pending_value = false;

    while let Some(part) = lex.next() {
        match part {
            Ok(TagPart::End) => return (attributes, false),
            Ok(TagPart::SelfClosingEnd) => return (attributes, true),
            Ok(TagPart::Equals) => pending_value = !attributes.is_empty(),
            Ok(TagPart::Quoted(value)) if pending_value => {
                if let Some(last) = attributes.last_mut() {
                    last.1 = decode_entities(value).into_owned();
                }
                pending_value = false;
            }
            Ok(TagPart::Word(word)) if pending_value => {
                if let Some(last) = attributes.last_mut() {
                    last.1 = decode_entities(word).into_owned();
                }
                pending_value = false;
            }
            Ok(TagPart::Word(word)) => {
                let name = word.trim_end_matches('/');
                if !name.is_empty() {
                    attributes.push((name.to_ascii_lowercase(), String::new()));
                }
                if name.len() != word.len() && lex.remainder().trim_start().starts_with('>') {
                    // `<input checked/>`: the slash belongs to the tag
                    let skip = lex.remainder().find('>').map_or(0, |i| i + 1);
                    lex.bump(skip);
                    return (attributes, true);
                }
            }
            Ok(TagPart::Quoted(_)) | Ok(TagPart::Slash) | Err(()) => pending_value = false,
        }
    }
    (attributes, false)
}
