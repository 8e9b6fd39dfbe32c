//! Embedded, file-backed document store.
//!
//! memdb keeps a JSON document tree in memory, addressed by dotted keys such
//! as `server.http.port`, and persists it as a snapshot plus a write log.
//! Every mutation is written to the log before it is applied; once the log
//! holds `staging_threshold` records it is folded into a new snapshot.
//!
//! ```no_run
//! use memdb::{Store, StoreOptions};
//! use serde_json::json;
//!
//! let store = Store::open("./data", StoreOptions::default())?;
//! store.put_loose("server.port", 3000)?;
//! assert_eq!(store.get("server.port")?, json!(3000));
//! assert_eq!(store.get_or("server.host", "127.0.0.1")?, json!("127.0.0.1"));
//! # Ok::<(), memdb::StoreError>(())
//! ```

pub mod error;
pub mod options;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use options::StoreOptions;
pub use store::Store;

// Re-export key types
pub use memdb_journal::SyncMode;
pub use memdb_tree::KeyPath;
pub use serde_json::{Map, Value};
