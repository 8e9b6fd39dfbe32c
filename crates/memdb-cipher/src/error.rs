/// Errors from encoding or decoding durable payloads.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The value could not be serialized to JSON.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Sealing the plaintext failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Wrong passphrase, corrupt ciphertext, or a payload that is not
    /// ciphertext at all.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Plain (unencrypted) payload is not valid JSON for the requested type.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Convenience alias used throughout the cipher crate.
pub type Result<T> = std::result::Result<T, CipherError>;
