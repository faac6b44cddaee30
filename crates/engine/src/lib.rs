//! # Engine — the SiltKV LSM core
//!
//! An embedded, single-process, ordered key-value store built as a
//! log-structured merge tree over a local directory. Writes land in an
//! in-memory [`memtable::Memtable`]; when it fills, it is flushed as an
//! immutable [`sstable::SsTable`] into tier 0, and tiers that grow past the
//! compaction threshold are k-way merged into a single table one tier down.
//!
//! ```text
//!        put/remove              get/scan
//!            │                       │
//!            ▼                       ▼
//!      ┌──────────┐ newest ──────────────────► oldest
//!      │ Memtable │──flush──► tier 0 ──compact──► tier 1 ──► ...
//!      └──────────┘           (SSTables)          (SSTables)
//! ```
//!
//! Keys and values are arbitrary byte strings ordered lexicographically.
//! Deletes write the [`TOMBSTONE`] marker, which shadows older values until
//! compaction of the last tier that holds them.
//!
//! The engine is single-threaded and synchronous: flush and compaction run
//! inline on the writing call, and the borrow checker guarantees no scan
//! can observe a compaction deleting files under it.
//!
//! ## Example
//! ```no_run
//! use engine::LsmTree;
//!
//! # fn main() -> engine::Result<()> {
//! let mut db = LsmTree::open("./data")?;
//! db.put(b"key", b"value")?;
//! assert_eq!(db.get(b"key"), Some(b"value".to_vec()));
//! db.remove(b"key")?;
//! assert_eq!(db.get(b"key"), None);
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod merge;

use thiserror::Error;

pub use config::Config;
pub use engine::LsmTree;
pub use merge::{MergeIterator, MergeSource};

/// Distinguished value marking a deleted key until compaction physically
/// drops the record. The public API converts a hit on this marker into an
/// absent-key response, which also means a user value equal to these bytes
/// is indistinguishable from a delete.
pub const TOMBSTONE: &[u8] = b"__TOMBSTONE__";

/// Scan result cap applied when the caller has no better idea.
pub const DEFAULT_SCAN_LIMIT: usize = 1000;

/// Errors surfaced by engine operations.
///
/// Read-path I/O problems never surface here — a table that cannot be read
/// simply reports misses (see [`LsmTree::get`]). These errors come from the
/// write path (flush or compaction failing to produce a table) and from
/// configuration validation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sstable error: {0}")]
    Sstable(#[from] sstable::SstError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
