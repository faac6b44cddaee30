//! SSTable binary format constants and header read/write helpers.
//!
//! The header is always the **first 12 bytes** of an SSTable file:
//!
//! ```text
//! [magic: u32 LE = 0x5353_5442][num_entries: u32 LE][bloom_offset: u32 LE]
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result as IoResult, Seek, SeekFrom, Write};

/// Magic number identifying SSTable files (ASCII "SSTB").
pub const SSTABLE_MAGIC: u32 = 0x5353_5442;

/// Size of the header in bytes: 4 (`magic`) + 4 (`num_entries`) + 4
/// (`bloom_offset`). The data section starts immediately after.
pub const HEADER_BYTES: u64 = 4 + 4 + 4;

/// Writes the SSTable header at the start of `w`.
///
/// Called last during construction: the writer reserves the header region,
/// streams the data and filter sections, then seeks back here to backpatch
/// the final `num_entries` and `bloom_offset`.
pub fn write_header<W: Write + Seek>(w: &mut W, num_entries: u32, bloom_offset: u32) -> IoResult<()> {
    w.seek(SeekFrom::Start(0))?;
    w.write_u32::<LittleEndian>(SSTABLE_MAGIC)?;
    w.write_u32::<LittleEndian>(num_entries)?;
    w.write_u32::<LittleEndian>(bloom_offset)?;
    Ok(())
}

/// Reads the SSTable header from the current position of `r`, returning
/// `(magic, num_entries, bloom_offset)`. The caller validates the magic.
pub fn read_header<R: Read>(r: &mut R) -> IoResult<(u32, u32, u32)> {
    let magic = r.read_u32::<LittleEndian>()?;
    let num_entries = r.read_u32::<LittleEndian>()?;
    let bloom_offset = r.read_u32::<LittleEndian>()?;
    Ok((magic, num_entries, bloom_offset))
}
