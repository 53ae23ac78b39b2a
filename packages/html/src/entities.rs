//! Character reference decoding
//!
//! Covers numeric references and the named references that show up in
//! hand-written static sites. Unknown references are left untouched.

use std::borrow::Cow;

const MAX_REFERENCE_LEN: usize = 32;

fn named(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        _ => return None,
    };
    Some(c)
}

fn numeric(body: &str) -> Option<char> {
    let value = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<u32>().ok()?
    };
    match value {
        0 => Some(char::REPLACEMENT_CHARACTER),
        v => Some(char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER)),
    }
}

/// Decode character references in `input`.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= MAX_REFERENCE_LEN)
            .and_then(|semi| {
                let body = &after[..semi];
                let c = match body.strip_prefix('#') {
                    Some(num) => numeric(num),
                    None => named(body),
                }?;
                Some((c, semi))
            });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(decode_entities("hello"), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b &lt;&#62; &#x41;&nbsp;"), "a & b <> A\u{a0}");
    }

    #[test]
    fn test_unknown_reference_kept() {
        assert_eq!(decode_entities("&foo; & &;"), "&foo; & &;");
    }
}
