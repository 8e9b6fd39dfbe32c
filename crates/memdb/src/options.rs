use serde::{Deserialize, Serialize};

use memdb_cipher::Cipher;
use memdb_journal::{JournalConfig, SyncMode, DEFAULT_STAGING_THRESHOLD};

use crate::error::{StoreError, StoreResult};

/// Construction options for a [`Store`](crate::Store).
///
/// Every field has a default, so a TOML fragment only needs the keys it
/// changes:
///
/// ```toml
/// staging_threshold = 100
/// encryption_key = "secret"
/// sync_mode = "every_write"
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    /// Pending log records that trigger an automatic flush (default: 600).
    pub staging_threshold: usize,
    /// Passphrase enabling at-rest encryption.
    pub encryption_key: Option<String>,
    /// Sync strategy for store files.
    pub sync_mode: SyncMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            staging_threshold: DEFAULT_STAGING_THRESHOLD,
            encryption_key: None,
            sync_mode: SyncMode::default(),
        }
    }
}

impl StoreOptions {
    /// Parse options from a TOML fragment.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let options: Self =
            toml::from_str(text).map_err(|e| StoreError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_staging_threshold(mut self, threshold: usize) -> Self {
        self.staging_threshold = threshold;
        self
    }

    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Check invariants the store relies on.
    pub fn validate(&self) -> StoreResult<()> {
        if self.staging_threshold == 0 {
            return Err(StoreError::InvalidOptions(
                "staging_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn cipher(&self) -> Cipher {
        Cipher::from_option(self.encryption_key.as_deref())
    }

    pub(crate) fn journal_config(&self) -> JournalConfig {
        JournalConfig {
            staging_threshold: self.staging_threshold,
            sync_mode: self.sync_mode,
        }
    }
}

impl std::fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOptions")
            .field("staging_threshold", &self.staging_threshold)
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.staging_threshold, 600);
        assert_eq!(options.encryption_key, None);
        assert_eq!(options.sync_mode, SyncMode::OsDefault);
    }

    #[test]
    fn builder() {
        let options = StoreOptions::default()
            .with_staging_threshold(10)
            .with_encryption_key("secret")
            .with_sync_mode(SyncMode::EveryWrite);
        assert_eq!(options.staging_threshold, 10);
        assert_eq!(options.encryption_key.as_deref(), Some("secret"));
        assert_eq!(options.sync_mode, SyncMode::EveryWrite);
    }

    #[test]
    fn from_toml_partial() {
        let options = StoreOptions::from_toml_str(r#"encryption_key = "secret""#).unwrap();
        assert_eq!(options.staging_threshold, 600);
        assert_eq!(options.encryption_key.as_deref(), Some("secret"));
    }

    #[test]
    fn from_toml_full() {
        let options = StoreOptions::from_toml_str(
            r#"
            staging_threshold = 25
            sync_mode = "every_write"
            "#,
        )
        .unwrap();
        assert_eq!(options.staging_threshold, 25);
        assert_eq!(options.sync_mode, SyncMode::EveryWrite);
    }

    #[test]
    fn from_toml_rejects_zero_threshold() {
        let err = StoreOptions::from_toml_str("staging_threshold = 0").unwrap_err();
        assert!(matches!(err, StoreError::InvalidOptions(_)));
    }

    #[test]
    fn from_toml_rejects_unknown_keys() {
        assert!(StoreOptions::from_toml_str("staging_size = 5").is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", StoreOptions::default().with_encryption_key("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
