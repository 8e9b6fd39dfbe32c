use std::io;
use std::path::PathBuf;

use thiserror::Error;

use memdb_cipher::CipherError;
use memdb_journal::JournalError;
use memdb_tree::TreeError;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not match the dotted-path grammar.
    #[error("bad key format: {key:?}: {reason}")]
    BadKeyFormat { key: String, reason: String },

    /// A segment along the path is absent.
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Reading or replacing a store file failed.
    #[error("file error on {}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },

    /// A store file could not be decrypted or decoded.
    #[error("cannot decode {}: {source}", .path.display())]
    Decryption { path: PathBuf, source: CipherError },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl From<TreeError> for StoreError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::BadKeyFormat { key, reason } => Self::BadKeyFormat { key, reason },
            TreeError::KeyNotFound { key } => Self::KeyNotFound { key },
        }
    }
}

impl From<JournalError> for StoreError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::Io { path, source } => Self::File { path, source },
            JournalError::Decode { path, source } => Self::Decryption { path, source },
            JournalError::Encode(e) => Self::Serialization(e.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
