//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk storage files for the SiltKV storage engine.
//!
//! When the in-memory memtable exceeds its size threshold the engine
//! flushes it to disk as an SSTable, and tiered compaction merges whole
//! tiers of SSTables into single larger ones.
//! SSTables are **write-once, read-many** — once created they are never
//! modified, only deleted after compaction has written their successor.
//!
//! ## File layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ HEADER (12 bytes)                               │
//! │                                                 │
//! │ magic (u32 LE = "SSTB") | num_entries (u32 LE)  │
//! │ | bloom_offset (u32 LE)                         │
//! ├─────────────────────────────────────────────────┤
//! │ DATA SECTION (sorted key/value records)         │
//! │                                                 │
//! │ key_size (u32 LE) | value_size (u32 LE)         │
//! │ | key bytes | value bytes                       │
//! │                                                 │
//! │ ... repeated for each entry ...                 │
//! ├─────────────────────────────────────────────────┤
//! │ FILTER SECTION (packed membership filter bits)  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. The magic value `0x5353_5442` ("SSTB")
//! identifies the format. `bloom_offset` is the byte offset of the filter
//! section, which runs to end of file. Entries are stored in strictly
//! ascending key order with no padding or separators.

mod format;
mod iter;
mod table;

use std::io;
use thiserror::Error;

pub use format::{HEADER_BYTES, SSTABLE_MAGIC};
pub use iter::TableIterator;
pub use table::SsTable;

/// Errors produced while creating or reading an SSTable.
#[derive(Debug, Error)]
pub enum SstError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid sstable magic: {0:#010x}")]
    BadMagic(u32),
    #[error("corrupt sstable: {0}")]
    Corrupt(String),
}

/// Result alias for SSTable operations.
pub type Result<T> = std::result::Result<T, SstError>;
