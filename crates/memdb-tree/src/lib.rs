//! Document tree and dotted-path addressing for memdb.
//!
//! A [`Document`] is a root JSON mapping plus a flush revision counter.
//! Values are addressed by a [`KeyPath`] such as `server.http.port`.
//!
//! # Addressing Rules
//!
//! 1. Segments are ASCII word characters (`[A-Za-z0-9_]+`), joined by single dots.
//! 2. Strict writes require every intermediate mapping to exist; loose writes
//!    create absent ones.
//! 3. Only *absent* keys are missing: stored `0`, `""`, `false` and `null` are values.
//!    Sequences are leaves; a digit segment never indexes into one.
//! 4. Strict writes never traverse a non-mapping intermediate. Loose writes
//!    replace it (including `null`) with a fresh mapping.
//! 5. Every mutation is validated before it touches the tree.

pub mod document;
pub mod error;
pub mod path;

pub use document::Document;
pub use error::{Result, TreeError};
pub use path::KeyPath;
