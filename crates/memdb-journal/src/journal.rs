use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use memdb_cipher::Cipher;
use memdb_tree::Document;

use crate::atomic::write_atomic;
use crate::error::{JournalError, Result};
use crate::record::{LogAction, LogRecord};
use crate::snapshot::{SnapshotFile, SnapshotView};
use crate::{LOG_FILE, SNAPSHOT_FILE};

/// Pending records allowed before a flush is due.
pub const DEFAULT_STAGING_THRESHOLD: usize = 600;

/// Flush/sync strategy for store files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` the file and its directory after every replace.
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    #[default]
    OsDefault,
}

/// Configuration for the [`Journal`].
#[derive(Clone, Debug)]
pub struct JournalConfig {
    /// Pending records that make a flush due.
    pub staging_threshold: usize,
    /// Sync strategy for both files.
    pub sync_mode: SyncMode,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            staging_threshold: DEFAULT_STAGING_THRESHOLD,
            sync_mode: SyncMode::default(),
        }
    }
}

/// What happened while opening an existing store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recovery {
    /// `true` if the directory held no store files and was initialized.
    pub created: bool,
    /// Records applied on top of the snapshot.
    pub replayed: usize,
    /// Records already folded into the snapshot and dropped.
    pub stale: usize,
    /// Records that failed to apply and were skipped.
    pub skipped: usize,
}

/// Snapshot + pending log for one store directory.
///
/// The journal does not own the document; callers pass it in for replay
/// and flush. Records are expected to be appended *before* their action is
/// applied to the document (write-ahead).
pub struct Journal {
    snapshot_path: PathBuf,
    log_path: PathBuf,
    cipher: Cipher,
    config: JournalConfig,
    pending: Vec<LogRecord>,
    /// Last sequence handed out.
    sequence: u64,
    /// Last timestamp handed out.
    last_timestamp: u64,
    recovery: Recovery,
}

impl Journal {
    /// Open the store at `dir`, creating it if needed.
    ///
    /// For an existing store the snapshot is loaded, the pending log is
    /// replayed in timestamp order, and the result is flushed before this
    /// returns. Any I/O or decode failure here is fatal.
    pub fn open(dir: &Path, cipher: Cipher, config: JournalConfig) -> Result<(Self, Document)> {
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let log_path = dir.join(LOG_FILE);

        let has_snapshot = snapshot_path
            .try_exists()
            .map_err(JournalError::io(&snapshot_path))?;
        let has_log = log_path.try_exists().map_err(JournalError::io(&log_path))?;

        let mut journal = Self {
            snapshot_path,
            log_path,
            cipher,
            config,
            pending: Vec::new(),
            sequence: 0,
            last_timestamp: 0,
            recovery: Recovery::default(),
        };

        if !has_snapshot && !has_log {
            fs::create_dir_all(dir).map_err(JournalError::io(dir))?;
            let doc = Document::new();
            journal.write_snapshot(&doc)?;
            journal.write_log()?;
            journal.recovery.created = true;
            info!(dir = %dir.display(), encrypted = journal.cipher.is_encrypted(), "store created");
            return Ok((journal, doc));
        }

        let snapshot: SnapshotFile = if has_snapshot {
            journal.load(&journal.snapshot_path)?
        } else {
            warn!(dir = %dir.display(), "snapshot missing; replaying log onto an empty document");
            SnapshotFile::default()
        };
        let records: Vec<LogRecord> = if has_log {
            journal.load(&journal.log_path)?
        } else {
            Vec::new()
        };

        journal.sequence = records
            .iter()
            .map(|r| r.sequence)
            .fold(snapshot.sequence, u64::max);
        journal.last_timestamp = records.iter().map(|r| r.timestamp).max().unwrap_or(0);

        let mut doc = Document::from_parts(snapshot.revision, snapshot.data);
        journal.replay(&mut doc, records, snapshot.sequence);
        journal.flush(&mut doc)?;

        info!(
            dir = %dir.display(),
            revision = doc.revision(),
            replayed = journal.recovery.replayed,
            stale = journal.recovery.stale,
            skipped = journal.recovery.skipped,
            "store opened"
        );
        Ok((journal, doc))
    }

    /// Stamp `action` with the next timestamp and sequence.
    ///
    /// Timestamps never go backwards, so timestamp order equals append order
    /// even if the wall clock steps back.
    pub fn next_record(&mut self, action: LogAction) -> LogRecord {
        self.last_timestamp = now_ms().max(self.last_timestamp);
        self.sequence += 1;
        LogRecord {
            timestamp: self.last_timestamp,
            sequence: self.sequence,
            action,
        }
    }

    /// Stage a record and rewrite the log file.
    ///
    /// If the write fails the record is unstaged, so the in-memory pending
    /// list always matches the durable log.
    pub fn append(&mut self, record: LogRecord) -> Result<()> {
        let sequence = record.sequence;
        self.pending.push(record);
        if let Err(e) = self.write_log() {
            self.pending.pop();
            error!(sequence, error = %e, "log append failed");
            return Err(e);
        }
        debug!(sequence, pending = self.pending.len(), "log append");
        Ok(())
    }

    /// Returns `true` once the pending count reaches the staging threshold.
    pub fn should_flush(&self) -> bool {
        self.pending.len() >= self.config.staging_threshold
    }

    /// Fold pending records into a new snapshot and truncate the log.
    ///
    /// `doc` must already reflect every pending record. The flush commits
    /// once the snapshot is written. If the snapshot write fails, the
    /// revision and the pending list are restored and the error returned;
    /// the next flush retries the same merge. If only the log truncation
    /// fails, the flush still succeeds: the snapshot's sequence marks the
    /// leftover records as folded, and replay drops them.
    pub fn flush(&mut self, doc: &mut Document) -> Result<()> {
        let previous_revision = doc.revision();
        let previous_pending = std::mem::take(&mut self.pending);
        doc.set_revision(previous_revision + 1);

        if let Err(e) = self.write_snapshot(doc) {
            doc.set_revision(previous_revision);
            self.pending = previous_pending;
            error!(
                revision = previous_revision,
                pending = self.pending.len(),
                error = %e,
                "unable to save current state, will retry on next flush"
            );
            return Err(e);
        }

        if let Err(e) = self.write_log() {
            error!(
                revision = doc.revision(),
                folded = previous_pending.len(),
                error = %e,
                "log truncation failed; stale records are dropped on replay"
            );
        }
        info!(
            revision = doc.revision(),
            folded = previous_pending.len(),
            "flush complete"
        );
        Ok(())
    }

    /// Records written since the last flush.
    pub fn pending(&self) -> &[LogRecord] {
        &self.pending
    }

    /// Outcome of the open that produced this journal.
    pub fn recovery(&self) -> Recovery {
        self.recovery
    }

    /// Path to the snapshot file.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Path to the log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn replay(&mut self, doc: &mut Document, mut records: Vec<LogRecord>, folded_through: u64) {
        let total = records.len();
        records.retain(|r| r.sequence > folded_through);
        self.recovery.stale = total - records.len();
        if self.recovery.stale > 0 {
            warn!(
                stale = self.recovery.stale,
                folded_through, "dropping log records already folded into the snapshot"
            );
        }

        // Stable: ties keep their logged order.
        records.sort_by_key(|r| r.timestamp);

        for record in &records {
            match record.action.apply(doc) {
                Ok(()) => {
                    self.recovery.replayed += 1;
                    debug!(sequence = record.sequence, key = record.action.key(), "replayed");
                }
                Err(e) => {
                    self.recovery.skipped += 1;
                    warn!(
                        sequence = record.sequence,
                        key = record.action.key(),
                        error = %e,
                        "skipping log record that no longer applies"
                    );
                }
            }
        }
        self.pending = records;
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let text = fs::read_to_string(path).map_err(JournalError::io(path))?;
        self.cipher
            .decode(&text)
            .map_err(|source| JournalError::Decode {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_snapshot(&self, doc: &Document) -> Result<()> {
        let view = SnapshotView {
            revision: doc.revision(),
            sequence: self.sequence,
            data: doc.root(),
        };
        let encoded = self.cipher.encode(&view)?;
        self.write(&self.snapshot_path, &encoded)
    }

    fn write_log(&self) -> Result<()> {
        let encoded = self.cipher.encode(&self.pending)?;
        self.write(&self.log_path, &encoded)
    }

    fn write(&self, path: &Path, encoded: &str) -> Result<()> {
        let sync = matches!(self.config.sync_mode, SyncMode::EveryWrite);
        write_atomic(path, encoded.as_bytes(), sync).map_err(JournalError::io(path))
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("snapshot_path", &self.snapshot_path)
            .field("log_path", &self.log_path)
            .field("cipher", &self.cipher)
            .field("pending", &self.pending.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
