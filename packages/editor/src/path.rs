//! Site-relative paths
//!
//! Every document and asset is addressed by a path relative to the site's
//! source root. [`SitePath`] normalizes the spellings a page can use for the
//! same file (`./a.html`, `/a.html`, `a//b/../a.html`) and refuses anything
//! that climbs out of the root.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path escapes the source root: {0}")]
    EscapesRoot(String),
}

/// Normalized `/`-separated path relative to the source root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SitePath(String);

impl SitePath {
    pub fn new(raw: &str) -> Result<Self, PathError> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.trim().split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::EscapesRoot(raw.to_string()));
                    }
                }
                segment => segments.push(segment),
            }
        }
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part including the trailing `/`, empty at the root
    pub fn dirname(&self) -> &str {
        match self.0.rfind('/') {
            Some(index) => &self.0[..=index],
            None => "",
        }
    }

    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(index) => &self.0[index + 1..],
            None => &self.0,
        }
    }

    pub fn is_html(&self) -> bool {
        let name = self.file_name().to_ascii_lowercase();
        name.ends_with(".html") || name.ends_with(".htm")
    }
}

impl fmt::Display for SitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SitePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SitePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_equivalent_spellings() {
        let expected = SitePath::new("blog/post.html").unwrap();
        for raw in ["./blog/post.html", "/blog/post.html", "blog//drafts/../post.html"] {
            assert_eq!(SitePath::new(raw).unwrap(), expected, "{raw}");
        }
    }

    #[test]
    fn test_rejects_escape_and_empty() {
        assert_eq!(
            SitePath::new("../secret.html"),
            Err(PathError::EscapesRoot("../secret.html".to_string()))
        );
        assert_eq!(SitePath::new(" ./ "), Err(PathError::Empty));
    }

    #[test]
    fn test_dirname_and_file_name() {
        let nested = SitePath::new("docs/guide/intro.html").unwrap();
        assert_eq!(nested.dirname(), "docs/guide/");
        assert_eq!(nested.file_name(), "intro.html");
        assert!(nested.is_html());

        let top = SitePath::new("index.html").unwrap();
        assert_eq!(top.dirname(), "");
        assert_eq!(top.file_name(), "index.html");

        assert!(!SitePath::new("img/logo.png").unwrap().is_html());
    }
}
