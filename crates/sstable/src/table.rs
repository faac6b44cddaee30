use bloom::BloomFilter;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Ordering;
use std::fs::{rename, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::format::{read_header, write_header, HEADER_BYTES, SSTABLE_MAGIC};
use crate::iter::TableIterator;
use crate::{Result, SstError};

/// A read handle to one immutable SSTable file.
///
/// The handle caches everything needed to answer lookups cheaply: the entry
/// count, the deserialized membership filter, and a memory-only index of
/// per-entry byte offsets. The filter is consulted before the file is
/// touched at all, so lookups for absent keys usually cost nothing.
///
/// The data file is **not** kept open between lookups — each
/// [`get`](SsTable::get) or [`scan`](SsTable::scan) call opens the file,
/// reads what it needs, and drops the handle. This keeps ownership simple
/// and avoids holding long-lived file descriptors across compactions.
pub struct SsTable {
    /// Path to the `.sst` file on disk.
    path: PathBuf,
    /// Number of records in the data section.
    num_entries: u32,
    /// In-memory copy of the file's membership filter.
    filter: BloomFilter,
    /// Byte offset of each entry in file order. Built during construction
    /// (or one header walk on open) and never persisted; the on-disk format
    /// carries no index.
    offsets: Vec<u64>,
    /// Byte offset where the data section ends and the filter begins.
    data_end: u64,
}

impl SsTable {
    /// Writes a new SSTable at `path` from already-sorted entries and
    /// returns its read handle.
    ///
    /// `entries` must be in strictly ascending key order with unique keys —
    /// memtable snapshots and merge output both satisfy this by
    /// construction. Each key is added to a freshly allocated filter with
    /// the given geometry while the data section streams out.
    ///
    /// # Crash safety
    ///
    /// Writes to `<path>.tmp`, backpatches the header, calls `sync_all()`,
    /// then atomically renames into place. On any failure the temp file is
    /// removed and no handle is produced, so a partial table can never be
    /// installed into a tier.
    pub fn create_from_sorted_data(
        path: &Path,
        entries: &[(Vec<u8>, Vec<u8>)],
        filter_bits: usize,
        filter_hashes: u32,
    ) -> Result<Self> {
        let tmp_path = tmp_sibling(path);
        match write_table(&tmp_path, entries, filter_bits, filter_hashes) {
            Ok((filter, offsets, data_end)) => {
                rename(&tmp_path, path).map_err(|e| {
                    let _ = std::fs::remove_file(&tmp_path);
                    SstError::Io(e)
                })?;
                Ok(Self {
                    path: path.to_path_buf(),
                    num_entries: entries.len() as u32,
                    filter,
                    offsets,
                    data_end,
                })
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    /// Opens an existing SSTable file, validating its header and rebuilding
    /// the in-memory state (filter and offset index) with one pass over the
    /// entry headers.
    ///
    /// The filter's width is recovered from the file length; the probe
    /// count is assumed to be the default, since the format does not record
    /// it. A file with a wrong magic or a data section that does not line
    /// up with `bloom_offset` is rejected.
    ///
    /// The engine never calls this on its own: tier state is not persisted,
    /// so files from an earlier process are orphans unless a higher layer
    /// adopts them through here.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut r = BufReader::new(file);

        let (magic, num_entries, bloom_offset) = read_header(&mut r)?;
        if magic != SSTABLE_MAGIC {
            return Err(SstError::BadMagic(magic));
        }
        let data_end = bloom_offset as u64;

        // Walk the entry headers to rebuild the offset index.
        let mut offsets = Vec::with_capacity(num_entries as usize);
        let mut offset = HEADER_BYTES;
        for i in 0..num_entries {
            if offset >= data_end {
                return Err(SstError::Corrupt(format!(
                    "entry {} starts at {} beyond data section end {}",
                    i, offset, data_end
                )));
            }
            offsets.push(offset);
            let key_size = r.read_u32::<LittleEndian>()? as u64;
            let value_size = r.read_u32::<LittleEndian>()? as u64;
            r.seek_relative((key_size + value_size) as i64)?;
            offset += 8 + key_size + value_size;
        }
        if offset != data_end {
            return Err(SstError::Corrupt(format!(
                "data section ends at {} but header claims {}",
                offset, data_end
            )));
        }

        // The filter region runs from bloom_offset to end of file.
        r.seek(SeekFrom::Start(data_end))?;
        let mut filter_bytes = Vec::new();
        r.read_to_end(&mut filter_bytes)?;
        let filter = BloomFilter::from_bytes(
            &filter_bytes,
            filter_bytes.len() * 8,
            bloom::DEFAULT_NUM_HASHES,
        );

        Ok(Self {
            path: path.to_path_buf(),
            num_entries,
            filter,
            offsets,
            data_end,
        })
    }

    /// Point lookup for a single key.
    ///
    /// The membership filter is consulted first; a negative answer returns
    /// `Ok(None)` without touching the file. Otherwise the offset index is
    /// binary-searched with one seek and one key read per probe. The value
    /// may be the engine's tombstone marker — that is the caller's concern.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.filter.might_contain(key) {
            return Ok(None);
        }

        let mut file = File::open(&self.path)?;
        let mut lo = 0usize;
        let mut hi = self.offsets.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            file.seek(SeekFrom::Start(self.offsets[mid]))?;
            let key_size = file.read_u32::<LittleEndian>()? as usize;
            let value_size = file.read_u32::<LittleEndian>()? as usize;
            let mut entry_key = vec![0u8; key_size];
            file.read_exact(&mut entry_key)?;

            match entry_key.as_slice().cmp(key) {
                Ordering::Equal => {
                    let mut value = vec![0u8; value_size];
                    file.read_exact(&mut value)?;
                    return Ok(Some(value));
                }
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }

    /// Collects up to `limit` entries with keys in `[start, end]`, in file
    /// (= ascending key) order.
    ///
    /// Streams the data section from the top: values of keys below the
    /// range are skipped without being read, and the scan stops at the
    /// first key past `end`, at `limit` results, or at the end of the data
    /// section.
    pub fn scan(&self, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut result = Vec::new();
        if start > end || limit == 0 {
            return Ok(result);
        }

        let file = File::open(&self.path)?;
        let mut r = BufReader::new(file);
        r.seek(SeekFrom::Start(HEADER_BYTES))?;

        let mut pos = HEADER_BYTES;
        while pos < self.data_end && result.len() < limit {
            let key_size = r.read_u32::<LittleEndian>()? as usize;
            let value_size = r.read_u32::<LittleEndian>()? as usize;
            let mut key = vec![0u8; key_size];
            r.read_exact(&mut key)?;
            pos += 8 + key_size as u64 + value_size as u64;

            if key.as_slice() < start {
                r.seek_relative(value_size as i64)?;
                continue;
            }
            if key.as_slice() > end {
                break;
            }
            let mut value = vec![0u8; value_size];
            r.read_exact(&mut value)?;
            result.push((key, value));
        }
        Ok(result)
    }

    /// Forward iterator over every entry in this table, tagged with the
    /// caller-supplied recency `order` (smaller = newer).
    ///
    /// The iterator owns its own file handle; a table whose file has gone
    /// missing or corrupt underneath simply yields nothing.
    pub fn iter(&self, order: usize) -> TableIterator {
        TableIterator::new(&self.path, order)
    }

    /// Number of records in the data section.
    pub fn num_entries(&self) -> u32 {
        self.num_entries
    }

    /// Path of the backing `.sst` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only access to the cached membership filter.
    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }
}

/// `<path>.tmp` next to the target, for write-then-rename construction.
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Streams the table to `tmp_path`: reserved header, data section (adding
/// each key to the filter and recording its offset), filter bytes, then the
/// backpatched header. Returns the cached state for the handle.
fn write_table(
    tmp_path: &Path,
    entries: &[(Vec<u8>, Vec<u8>)],
    filter_bits: usize,
    filter_hashes: u32,
) -> Result<(BloomFilter, Vec<u64>, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp_path)?;
    let mut w = BufWriter::new(file);

    // Reserve the header; its final values are known only after the data
    // section has been sized.
    w.write_all(&[0u8; HEADER_BYTES as usize])?;

    let mut filter = BloomFilter::with_params(filter_bits, filter_hashes);
    let mut offsets = Vec::with_capacity(entries.len());
    let mut offset = HEADER_BYTES;
    for (key, value) in entries {
        filter.add(key);
        offsets.push(offset);
        w.write_u32::<LittleEndian>(key.len() as u32)?;
        w.write_u32::<LittleEndian>(value.len() as u32)?;
        w.write_all(key)?;
        w.write_all(value)?;
        offset += 8 + key.len() as u64 + value.len() as u64;
    }

    let bloom_offset = offset;
    w.write_all(filter.to_bytes())?;

    let mut file = w.into_inner().map_err(|e| SstError::Io(e.into()))?;
    write_header(&mut file, entries.len() as u32, bloom_offset as u32)?;
    file.sync_all()?;

    Ok((filter, offsets, bloom_offset))
}
