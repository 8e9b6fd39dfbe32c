//! Error types for path parsing and tree traversal.

use thiserror::Error;

/// Errors that can occur while addressing the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The key does not match the dotted-path grammar.
    #[error("bad key format: {key:?}: {reason}")]
    BadKeyFormat { key: String, reason: String },

    /// A segment along the path is absent or not a mapping.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },
}

impl TreeError {
    pub(crate) fn not_found(key: &str) -> Self {
        Self::KeyNotFound {
            key: key.to_string(),
        }
    }
}

/// Convenience type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
