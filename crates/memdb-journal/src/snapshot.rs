use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded snapshot file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Number of successful flushes.
    pub revision: u64,
    /// Highest log sequence whose effect is included in `data`.
    #[serde(default)]
    pub sequence: u64,
    /// The document mapping.
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Borrowed view used when writing, to avoid cloning the tree.
#[derive(Serialize)]
pub(crate) struct SnapshotView<'a> {
    pub revision: u64,
    pub sequence: u64,
    pub data: &'a Map<String, Value>,
}
