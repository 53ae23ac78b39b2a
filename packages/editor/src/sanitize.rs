//! # Export Sanitizer
//!
//! Turns an editor snapshot into a publishable document by removing every
//! artifact the editor put there:
//!
//! - the injected style block and the select-mode badge
//! - the highlight and hover marker classes, on every element
//! - `contenteditable`, `draggable` and every `data-editor-*` attribute
//! - `<base>` elements whose `href` starts with the configured source prefix
//!
//! User-authored `<base>` elements with any other `href` survive, as do
//! unrelated `data-*` attributes.
//!
//! Sanitizing is idempotent: the output is canonical and contains nothing
//! the sanitizer would remove.

use crate::affordances::{is_editor_class, BADGE_ID, PRIVATE_ATTRIBUTE_PREFIX, STYLE_ID};
use crate::path::SitePath;
use pagecraft_html::{parse_document, serialize_document, DomTree};
use std::fmt;

/// A document that could not be sanitized and was exported as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeWarning {
    pub path: Option<SitePath>,
    pub reason: String,
}

impl fmt::Display for SanitizeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path} exported unsanitized: {}", self.reason),
            None => write!(f, "Exported unsanitized: {}", self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub html: String,
    pub warning: Option<SanitizeWarning>,
}

#[derive(Debug, Clone)]
pub struct Sanitizer {
    source_prefix: String,
}

impl Sanitizer {
    /// `source_prefix` is the `href` prefix of the `<base>` elements the
    /// editor injects on load.
    pub fn new(source_prefix: impl Into<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
        }
    }

    /// Sanitize a full document. Markup that fails to parse is returned
    /// unchanged along with a warning.
    pub fn sanitize(&self, html: &str) -> Sanitized {
        match parse_document(html) {
            Ok(mut tree) => {
                self.sanitize_tree(&mut tree);
                Sanitized {
                    html: serialize_document(&tree),
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sanitize failed, passing document through");
                Sanitized {
                    html: html.to_string(),
                    warning: Some(SanitizeWarning {
                        path: None,
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Strip editor artifacts from `tree` in place.
    pub fn sanitize_tree(&self, tree: &mut DomTree) {
        let mut removed = 0usize;
        for node in tree.preorder(tree.root()) {
            if !tree.is_any_element(node) {
                continue;
            }
            if self.is_editor_element(tree, node) {
                tree.detach(node);
                removed += 1;
                continue;
            }

            let markers: Vec<String> = tree
                .attribute(node, "class")
                .unwrap_or_default()
                .split_ascii_whitespace()
                .filter(|class| is_editor_class(class))
                .map(str::to_string)
                .collect();
            for class in markers {
                tree.remove_class(node, &class);
            }

            tree.retain_attributes(node, |attr| {
                attr.name != "contenteditable"
                    && attr.name != "draggable"
                    && !attr.name.starts_with(PRIVATE_ATTRIBUTE_PREFIX)
            });
        }
        tracing::debug!(removed, "Sanitized document tree");
    }

    fn is_editor_element(&self, tree: &DomTree, node: pagecraft_html::NodeId) -> bool {
        if node == tree.root() {
            return false;
        }
        if matches!(tree.attribute(node, "id"), Some(STYLE_ID | BADGE_ID)) {
            return true;
        }
        tree.is_element(node, "base")
            && !self.source_prefix.is_empty()
            && tree
                .attribute(node, "href")
                .is_some_and(|href| href.trim().starts_with(&self.source_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affordances::Affordances;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new("/source/")
    }

    #[test]
    fn test_strips_every_affordance() {
        let mut tree = parse_document(
            r#"<html><head><base href="/source/blog/"><title>T</title></head><body><p class="lead _editor-highlight" data-editor-x="1" data-track="k" draggable="true">a</p><span class="_editor-hover">b</span></body></html>"#,
        )
        .unwrap();
        Affordances {
            editable: true,
            select_mode: true,
        }
        .apply(&mut tree);

        let cleaned = sanitizer().sanitize(&serialize_document(&tree));
        assert_eq!(cleaned.warning, None);
        assert_eq!(
            cleaned.html,
            "<!DOCTYPE html>\n<html><head><title>T</title></head><body><p class=\"lead\" data-track=\"k\">a</p><span>b</span></body></html>"
        );
    }

    #[test]
    fn test_keeps_user_base() {
        let source = r#"<html><head><base href="https://cdn.example.com/"></head><body></body></html>"#;
        let cleaned = sanitizer().sanitize(source);
        assert!(cleaned.html.contains(r#"<base href="https://cdn.example.com/">"#));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<p class=_editor-highlight>x",
            r#"<html data-editor-select="on"><head><style id="_editor_style_injected">a{}</style></head><body contenteditable="true"><div id="_editor_select_badge">Select</div></body></html>"#,
            "plain text & <b>bold",
        ];
        for input in inputs {
            let once = sanitizer().sanitize(input).html;
            let twice = sanitizer().sanitize(&once).html;
            assert_eq!(once, twice, "{input}");
        }
    }

    #[test]
    fn test_parse_failure_passes_through() {
        let deep = "<div>".repeat(pagecraft_html::parser::MAX_DEPTH + 8);
        let result = sanitizer().sanitize(&deep);
        assert_eq!(result.html, deep);
        assert!(result.warning.is_some());
    }
}
