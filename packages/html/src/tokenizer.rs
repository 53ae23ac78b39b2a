//! Lexer for HTML markup using logos
//!
//! Markup is lexed in two modes. [`Markup`] covers everything outside of a
//! tag. When it produces a [`Markup::TagOpen`] the parser morphs the lexer
//! into [`TagPart`] until the tag is closed, then morphs back.
//!
//! Neither lexer is allowed to lose input: anything logos cannot match is
//! surfaced as an error and the parser keeps the slice as text.

use logos::{Lexer, Logos};

/// Tokens outside of a tag
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Markup<'src> {
    /// Comment body without the `<!--` / `-->` delimiters
    #[token("<!--", lex_comment)]
    Comment(&'src str),

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>")]
    Doctype,

    /// End tag name as written (not lowercased)
    #[regex(r"</[a-zA-Z][^>]*>", |lex| end_tag_name(lex.slice()))]
    EndTag(&'src str),

    /// Start of a start tag: `<name`
    #[regex(r"<[a-zA-Z][^\t\n\f\r />]*", |lex| &lex.slice()[1..])]
    TagOpen(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    /// A `<` that does not start any markup
    #[token("<")]
    Lt,
}

/// Tokens inside a start tag, after the tag name
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\f\r]+")]
pub enum TagPart<'src> {
    #[token(">")]
    End,

    #[token("/>")]
    SelfClosingEnd,

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, strip_quotes)]
    #[regex(r"'[^']*'", strip_quotes)]
    Quoted(&'src str),

    /// Attribute name or unquoted attribute value
    #[regex(r#"[^ \t\n\f\r"'=<>/`][^ \t\n\f\r"'=<>`]*"#, |lex| lex.slice())]
    Word(&'src str),
}

fn lex_comment<'src>(lex: &mut Lexer<'src, Markup<'src>>) -> &'src str {
    let rest = lex.remainder();
    match rest.find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            &rest[..end]
        }
        None => {
            // Unterminated comments run to the end of input
            lex.bump(rest.len());
            rest
        }
    }
}

fn strip_quotes<'src>(lex: &mut Lexer<'src, TagPart<'src>>) -> &'src str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

fn end_tag_name(slice: &str) -> &str {
    let inner = &slice[2..slice.len() - 1];
    let end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    &inner[..end]
}

/// Find the byte offset of the `</name` that closes a raw text element.
///
/// Matching is ASCII case-insensitive and requires the name to be followed
/// by whitespace, `/` or `>`.
pub fn find_close_tag(haystack: &str, name: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let name = name.as_bytes();
    for (idx, _) in haystack.match_indices("</") {
        let start = idx + 2;
        let end = start + name.len();
        if end > bytes.len() || !bytes[start..end].eq_ignore_ascii_case(name) {
            continue;
        }
        match bytes.get(end) {
            None => return Some(idx),
            Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => return Some(idx),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(source: &str) -> Vec<Result<Markup<'_>, ()>> {
        Markup::lexer(source).collect()
    }

    #[test]
    fn test_markup_tokens() {
        let tokens = markup("<!DOCTYPE html><!-- hi --><p>a &amp; b</P >");
        assert_eq!(
            tokens,
            vec![
                Ok(Markup::Doctype),
                Ok(Markup::Comment(" hi ")),
                Ok(Markup::TagOpen("p")),
                Ok(Markup::Text(">a &amp; b")),
                Ok(Markup::EndTag("P")),
            ]
        );
    }

    #[test]
    fn test_stray_less_than_is_not_markup() {
        let tokens = markup("a < b");
        assert_eq!(
            tokens,
            vec![
                Ok(Markup::Text("a ")),
                Ok(Markup::Lt),
                Ok(Markup::Text(" b")),
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_runs_to_end() {
        let tokens = markup("<!-- open");
        assert_eq!(tokens, vec![Ok(Markup::Comment(" open"))]);
    }

    #[test]
    fn test_tag_parts() {
        let tokens: Vec<_> = TagPart::lexer(r#" src=img/a.png alt='x "y"' hidden />"#).collect();
        assert_eq!(
            tokens,
            vec![
                Ok(TagPart::Word("src")),
                Ok(TagPart::Equals),
                Ok(TagPart::Word("img/a.png")),
                Ok(TagPart::Word("alt")),
                Ok(TagPart::Equals),
                Ok(TagPart::Quoted(r#"x "y""#)),
                Ok(TagPart::Word("hidden")),
                Ok(TagPart::SelfClosingEnd),
            ]
        );
    }

    #[test]
    fn test_find_close_tag() {
        assert_eq!(find_close_tag("a < b </SCRIPT>", "script"), Some(6));
        assert_eq!(find_close_tag("</scripts></script >", "script"), Some(10));
        assert_eq!(find_close_tag("no end", "style"), None);
    }
}
