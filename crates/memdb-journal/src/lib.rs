//! Snapshot and write-log persistence for memdb.
//!
//! A store directory holds two files:
//!
//! - `snapshot` -- the encoded document, its revision, and the highest log
//!   sequence folded into it
//! - `log` -- the encoded list of records written since the last flush
//!
//! Both files are replaced atomically (temp file + rename) on every write.
//! On open the log is replayed on top of the snapshot through the same
//! [`LogAction::apply`] used by live writes, then flushed.

pub mod atomic;
pub mod error;
pub mod journal;
pub mod record;
pub mod snapshot;

pub use error::{JournalError, Result};
pub use journal::{Journal, JournalConfig, Recovery, SyncMode, DEFAULT_STAGING_THRESHOLD};
pub use record::{LogAction, LogRecord};
pub use snapshot::SnapshotFile;

/// File name of the snapshot inside a store directory.
pub const SNAPSHOT_FILE: &str = "snapshot";
/// File name of the pending log inside a store directory.
pub const LOG_FILE: &str = "log";
