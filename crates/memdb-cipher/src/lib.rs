//! At-rest codec for memdb.
//!
//! Every byte memdb writes to disk (the snapshot and the pending log) passes
//! through a [`Cipher`]. Without a passphrase the codec is plain compact JSON.
//! With a passphrase the JSON text is sealed with AES-256-GCM under a key
//! derived from the passphrase and a per-call random salt, and the result is
//! hex-encoded so the files stay text.
//!
//! Encryption comes from the `aes-gcm` crate and key derivation from `blake3`;
//! nothing here implements a primitive of its own.

pub mod cipher;
pub mod error;

pub use cipher::Cipher;
pub use error::{CipherError, Result};
