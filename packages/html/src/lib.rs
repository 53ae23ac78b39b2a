//! # Pagecraft HTML
//!
//! Lenient HTML parsing, an arena-backed document tree and a canonical
//! serializer.
//!
//! ```text
//! source text ──tokenizer──▶ tokens ──parser──▶ DomTree ──serializer──▶ text
//! ```
//!
//! The serializer's output is canonical: parsing it and serializing again
//! yields the same bytes. Editors can therefore store documents as text and
//! compare snapshots byte-for-byte.

pub mod dom;
pub mod entities;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use dom::{
    is_valid_tag_name, is_void_element, Attribute, DomTree, ElementData, NodeData, NodeId,
    NodePath,
};
pub use error::{ParseError, ParseResult};
pub use parser::{normalize_document, parse_document, parse_fragment, MAX_DEPTH};
pub use serializer::{
    inner_html, is_text_only_element, outer_html, raw_text_fits, serialize_document, DOCTYPE,
};
