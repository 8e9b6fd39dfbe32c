//! Dotted key paths.
//!
//! Valid keys:
//! - Must be non-empty
//! - Segments are separated by a single `.`
//! - Segments are non-empty and made of ASCII letters, digits and `_`
//! - Must not start or end with `.`

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TreeError};

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A validated dotted key, e.g. `family.me.members`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse and validate a key.
    ///
    /// # Examples
    ///
    /// ```
    /// use memdb_tree::KeyPath;
    ///
    /// let path = KeyPath::parse("dir.list.name").unwrap();
    /// assert_eq!(path.segments(), ["dir", "list", "name"]);
    /// assert!(KeyPath::parse("name-").is_err());
    /// assert!(KeyPath::parse(".name").is_err());
    /// ```
    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(bad_key(key, "key must not be empty"));
        }

        let mut segments = Vec::new();
        for segment in key.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(bad_key(key, "segments must not be empty"));
            }
            if let Some(ch) = segment.chars().find(|c| !is_word_char(*c)) {
                return Err(bad_key(key, &format!("contains forbidden character: {ch:?}")));
            }
            segments.push(segment.to_string());
        }

        Ok(Self {
            raw: key.to_string(),
            segments,
        })
    }

    /// The key as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The terminal segment and the intermediate segments leading to it.
    pub fn split_last(&self) -> (&str, &[String]) {
        match self.segments.split_last() {
            Some((last, parents)) => (last.as_str(), parents),
            // `parse` guarantees at least one segment.
            None => (self.raw.as_str(), &[]),
        }
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn bad_key(key: &str, reason: &str) -> TreeError {
    TreeError::BadKeyFormat {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for KeyPath {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
