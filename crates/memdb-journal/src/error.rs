use std::io;
use std::path::PathBuf;

use memdb_cipher::CipherError;

/// Errors produced by the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// I/O failure reading or replacing a store file.
    #[error("io error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// A store file exists but cannot be decoded.
    #[error("cannot decode {}: {source}", .path.display())]
    Decode { path: PathBuf, source: CipherError },

    /// In-memory state could not be encoded for writing.
    #[error("encode error: {0}")]
    Encode(#[from] CipherError),
}

impl JournalError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Convenience alias used throughout the journal crate.
pub type Result<T> = std::result::Result<T, JournalError>;
