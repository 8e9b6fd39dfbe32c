use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CipherError, Result};

/// Envelope format version, first byte of every sealed payload.
const FORMAT_VERSION: u8 = 1;
/// Random salt mixed into key derivation, fresh per encode.
const SALT_LEN: usize = 16;
/// AES-GCM nonce length.
const NONCE_LEN: usize = 12;
/// Version byte + salt + nonce.
const HEADER_LEN: usize = 1 + SALT_LEN + NONCE_LEN;
/// BLAKE3 key-derivation context. Changing it invalidates every sealed file.
const KDF_CONTEXT: &str = "memdb 2024-06-01 at-rest passphrase key v1";

/// Reversible transform between in-memory values and their durable text.
///
/// Sealed envelope layout (hex-encoded on disk):
/// ```text
/// [1 byte:  format version]
/// [16 bytes: salt]
/// [12 bytes: nonce]
/// [N bytes: AES-256-GCM ciphertext + 16-byte tag]
/// ```
///
/// The same passphrase encodes the same value to different text on every
/// call; decoding only needs the passphrase.
///
/// The key comes from `blake3::derive_key`, which does not stretch the
/// passphrase. A weak passphrase is cheap to brute-force from a copy of the
/// files, so use a long random one.
#[derive(Clone)]
pub struct Cipher {
    passphrase: Option<Vec<u8>>,
}

impl Cipher {
    /// Codec that writes plain JSON.
    pub fn plain() -> Self {
        Self { passphrase: None }
    }

    /// Codec that seals every payload under `passphrase`.
    pub fn with_passphrase(passphrase: &str) -> Self {
        Self {
            passphrase: Some(passphrase.as_bytes().to_vec()),
        }
    }

    /// Build from an optional passphrase; `None` means plain.
    pub fn from_option(passphrase: Option<&str>) -> Self {
        match passphrase {
            Some(p) => Self::with_passphrase(p),
            None => Self::plain(),
        }
    }

    /// Returns `true` if payloads are encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.passphrase.is_some()
    }

    /// Encode a value to its durable text form.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json =
            serde_json::to_vec(value).map_err(|e| CipherError::Serialization(e.to_string()))?;

        let Some(passphrase) = &self.passphrase else {
            // serde_json only ever emits UTF-8.
            return String::from_utf8(json).map_err(|e| CipherError::Serialization(e.to_string()));
        };

        let salt: [u8; SALT_LEN] = rand::random();
        let nonce: [u8; NONCE_LEN] = rand::random();
        let aead = Self::aead(passphrase, &salt);

        let sealed = aead
            .encrypt(Nonce::from_slice(&nonce), json.as_slice())
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(HEADER_LEN + sealed.len());
        envelope.push(FORMAT_VERSION);
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&sealed);
        Ok(hex::encode(envelope))
    }

    /// Decode durable text back into a value.
    ///
    /// Fails with [`CipherError::Decryption`] on a wrong passphrase or any
    /// tampering; never returns garbage.
    pub fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        let Some(passphrase) = &self.passphrase else {
            return serde_json::from_str(text).map_err(|e| CipherError::Malformed(e.to_string()));
        };

        let envelope = hex::decode(text.trim())
            .map_err(|e| CipherError::Decryption(format!("not a sealed payload: {e}")))?;

        if envelope.len() < HEADER_LEN {
            return Err(CipherError::Decryption(format!(
                "sealed payload too short: {} bytes",
                envelope.len()
            )));
        }
        if envelope[0] != FORMAT_VERSION {
            return Err(CipherError::Decryption(format!(
                "unsupported envelope version {}",
                envelope[0]
            )));
        }

        let salt = &envelope[1..1 + SALT_LEN];
        let nonce = &envelope[1 + SALT_LEN..HEADER_LEN];
        let aead = Self::aead(passphrase, salt);

        let json = aead
            .decrypt(Nonce::from_slice(nonce), &envelope[HEADER_LEN..])
            .map_err(|_| {
                CipherError::Decryption("wrong passphrase or corrupt ciphertext".into())
            })?;

        serde_json::from_slice(&json).map_err(|e| CipherError::Malformed(e.to_string()))
    }

    fn aead(passphrase: &[u8], salt: &[u8]) -> Aes256Gcm {
        let mut material = Vec::with_capacity(salt.len() + passphrase.len());
        material.extend_from_slice(salt);
        material.extend_from_slice(passphrase);
        let key = blake3::derive_key(KDF_CONTEXT, &material);
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::plain()
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher")
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn plain_roundtrip_strings() {
        let cipher = Cipher::plain();
        let encoded = cipher.encode("Evance").unwrap();
        assert_eq!(cipher.decode::<String>(&encoded).unwrap(), "Evance");

        let encoded = cipher.encode("dir.list.name").unwrap();
        assert_eq!(cipher.decode::<String>(&encoded).unwrap(), "dir.list.name");
    }

    #[test]
    fn plain_output_is_json() {
        let cipher = Cipher::plain();
        let encoded = cipher.encode(&json!({"a": [1, 2, null]})).unwrap();
        assert_eq!(encoded, r#"{"a":[1,2,null]}"#);
    }

    #[test]
    fn sealed_roundtrip_nested_value() {
        let cipher = Cipher::with_passphrase("secret");
        let value = json!({
            "family": {"me": {"members": [{"name": "Alex"}]}},
            "flag": false,
            "zero": 0,
            "empty": "",
            "nothing": null
        });
        let encoded = cipher.encode(&value).unwrap();
        let decoded: Value = cipher.decode(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn sealed_output_hides_plaintext() {
        let cipher = Cipher::with_passphrase("secret");
        let encoded = cipher.encode("visible-marker").unwrap();
        assert!(!encoded.contains("visible-marker"));
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sealed_encodings_differ_per_call() {
        let cipher = Cipher::with_passphrase("secret");
        let a = cipher.encode(&json!({"k": 1})).unwrap();
        let b = cipher.encode(&json!({"k": 1})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let encoded = Cipher::with_passphrase("secret").encode(&json!([1, 2])).unwrap();
        let err = Cipher::with_passphrase("secret1234")
            .decode::<Value>(&encoded)
            .unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = Cipher::with_passphrase("secret");
        let encoded = cipher.encode(&json!({"k": "v"})).unwrap();
        let mut bytes = hex::decode(&encoded).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = cipher.decode::<Value>(&hex::encode(bytes)).unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn plaintext_fed_to_sealed_codec_fails() {
        let err = Cipher::with_passphrase("secret")
            .decode::<Value>(r#"{"k":1}"#)
            .unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn truncated_envelope_fails() {
        let err = Cipher::with_passphrase("secret")
            .decode::<Value>("01abcd")
            .unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn malformed_plain_payload() {
        let err = Cipher::plain().decode::<Value>("{not json").unwrap_err();
        assert!(matches!(err, CipherError::Malformed(_)));
    }

    #[test]
    fn debug_redacts_passphrase() {
        let rendered = format!("{:?}", Cipher::with_passphrase("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("encrypted: true"));
    }
}
