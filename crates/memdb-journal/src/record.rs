use serde::{Deserialize, Serialize};
use serde_json::Value;

use memdb_tree::{Document, KeyPath, Result as TreeResult};

/// A mutation captured in the log.
///
/// Keys are kept as written and parsed on apply, so a hand-edited log with
/// a bad key fails that one record instead of the whole file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum LogAction {
    /// Assign `value` at `key`; `loose` creates absent intermediates.
    Insert {
        key: String,
        value: Value,
        #[serde(default)]
        loose: bool,
    },
    /// Remove the value at `key`.
    Delete { key: String },
}

impl LogAction {
    /// The key this action addresses.
    pub fn key(&self) -> &str {
        match self {
            Self::Insert { key, .. } | Self::Delete { key } => key.as_str(),
        }
    }

    /// Validate against `doc` without mutating it.
    pub fn check(&self, doc: &Document) -> TreeResult<()> {
        let path = KeyPath::parse(self.key())?;
        match self {
            Self::Insert { loose, .. } => doc.check_put(&path, *loose),
            Self::Delete { .. } => doc.check_delete(&path),
        }
    }

    /// Apply to `doc`. Live writes and boot replay both go through here.
    pub fn apply(&self, doc: &mut Document) -> TreeResult<()> {
        let path = KeyPath::parse(self.key())?;
        match self {
            Self::Insert { value, loose, .. } => doc.put(&path, value.clone(), *loose),
            Self::Delete { .. } => doc.delete(&path).map(|_| ()),
        }
    }
}

/// One durable log entry.
///
/// Serialized form:
/// ```text
/// {"timestamp": 1718000000000, "sequence": 7,
///  "action": "insert", "payload": {"key": "a.b", "value": 1, "loose": false}}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Milliseconds since the UNIX epoch, non-decreasing within a store.
    pub timestamp: u64,
    /// Per-store counter; compared against the snapshot on replay.
    pub sequence: u64,
    #[serde(flatten)]
    pub action: LogAction,
}
