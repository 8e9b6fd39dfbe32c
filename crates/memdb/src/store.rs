use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::{debug, error};

use memdb_journal::{Journal, LogAction};
use memdb_tree::{Document, KeyPath};

use crate::error::{StoreError, StoreResult};
use crate::options::StoreOptions;

/// Document and journal, mutated together under one lock.
struct State {
    doc: Document,
    journal: Journal,
}

/// An open store directory.
///
/// Each mutating call runs validate → log → apply → maybe flush under a
/// single lock, so calls on a shared `Store` never interleave.
pub struct Store {
    path: PathBuf,
    options: StoreOptions,
    state: Mutex<State>,
}

impl Store {
    /// Open (or create) the store at `path`.
    ///
    /// Any pending log is replayed and flushed before this returns.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> StoreResult<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let (journal, doc) = Journal::open(&path, options.cipher(), options.journal_config())?;

        Ok(Self {
            path,
            options,
            state: Mutex::new(State { doc, journal }),
        })
    }

    // ---- Writes ----

    /// Assign `value` at `key`. Every intermediate mapping must exist.
    pub fn put(&self, key: &str, value: impl Into<Value>) -> StoreResult<()> {
        self.insert(key, value.into(), false)
    }

    /// Assign `value` at `key`, creating absent intermediate mappings.
    pub fn put_loose(&self, key: &str, value: impl Into<Value>) -> StoreResult<()> {
        self.insert(key, value.into(), true)
    }

    /// Remove the value at `key`.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        KeyPath::parse(key)?;
        self.mutate(LogAction::Delete {
            key: key.to_string(),
        })
    }

    /// Fold pending log records into a new snapshot now.
    pub fn flush(&self) -> StoreResult<()> {
        let mut state = self.lock();
        let State { doc, journal } = &mut *state;
        journal.flush(doc)?;
        Ok(())
    }

    // ---- Reads ----

    /// The value at `key`.
    pub fn get(&self, key: &str) -> StoreResult<Value> {
        let path = KeyPath::parse(key)?;
        let state = self.lock();
        let value = state.doc.get(&path)?;
        Ok(value.clone())
    }

    /// The value at `key`, or `default` if it is absent.
    ///
    /// A malformed key is still an error.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> StoreResult<Value> {
        match self.get(key) {
            Err(StoreError::KeyNotFound { .. }) => Ok(default.into()),
            other => other,
        }
    }

    /// Deep copy of the whole tree, without the revision.
    pub fn all(&self) -> Map<String, Value> {
        self.lock().doc.to_map()
    }

    /// Number of successful flushes.
    pub fn revision(&self) -> u64 {
        self.lock().doc.revision()
    }

    /// Log records written since the last flush.
    pub fn pending(&self) -> usize {
        self.lock().journal.pending().len()
    }

    /// Library version.
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Options the store was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// The store directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&self, key: &str, value: Value, loose: bool) -> StoreResult<()> {
        KeyPath::parse(key)?;
        self.mutate(LogAction::Insert {
            key: key.to_string(),
            value,
            loose,
        })
    }

    fn mutate(&self, action: LogAction) -> StoreResult<()> {
        let mut state = self.lock();
        let State { doc, journal } = &mut *state;

        action.check(doc)?;

        let record = journal.next_record(action);
        let sequence = record.sequence;
        journal.append(record.clone())?;

        // Checked under the same lock; cannot fail here.
        record.action.apply(doc)?;
        debug!(sequence, key = record.action.key(), "applied");

        if journal.should_flush() {
            // The record is durable in the log; a failed flush is retried later.
            if let Err(e) = journal.flush(doc) {
                error!(error = %e, "automatic flush failed");
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store mutex poisoned")
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}
