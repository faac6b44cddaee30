use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::format::{read_header, SSTABLE_MAGIC};

/// A forward iterator over every entry of one SSTable, in file order.
///
/// The iterator owns its file handle, positioned just past the header;
/// dropping the iterator closes the file. It carries an opaque recency
/// `order` tag supplied by the caller (smaller = newer) which the engine's
/// merge uses to break ties between tables holding the same key.
///
/// Degraded files degrade quietly: an unopenable or malformed table yields
/// an empty iterator, and a read error mid-stream ends it — the source
/// simply contributes no further records.
pub struct TableIterator {
    reader: Option<BufReader<File>>,
    num_entries: u32,
    returned: u32,
    order: usize,
}

impl TableIterator {
    /// Opens `path` and positions the cursor at the first entry.
    pub fn new(path: &Path, order: usize) -> Self {
        match Self::open_at_data(path) {
            Ok((reader, num_entries)) => Self {
                reader: Some(reader),
                num_entries,
                returned: 0,
                order,
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "sstable unreadable, iterating nothing");
                Self {
                    reader: None,
                    num_entries: 0,
                    returned: 0,
                    order,
                }
            }
        }
    }

    /// The recency tag this iterator was created with.
    pub fn order(&self) -> usize {
        self.order
    }

    fn open_at_data(path: &Path) -> io::Result<(BufReader<File>, u32)> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let (magic, num_entries, _bloom_offset) = read_header(&mut reader)?;
        if magic != SSTABLE_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid sstable magic: {:#010x}", magic),
            ));
        }
        Ok((reader, num_entries))
    }

    fn read_entry(reader: &mut BufReader<File>) -> io::Result<(Vec<u8>, Vec<u8>)> {
        let key_size = reader.read_u32::<LittleEndian>()? as usize;
        let value_size = reader.read_u32::<LittleEndian>()? as usize;
        let mut key = vec![0u8; key_size];
        reader.read_exact(&mut key)?;
        let mut value = vec![0u8; value_size];
        reader.read_exact(&mut value)?;
        Ok((key, value))
    }
}

impl Iterator for TableIterator {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.returned >= self.num_entries {
            return None;
        }
        let reader = self.reader.as_mut()?;
        match Self::read_entry(reader) {
            Ok(entry) => {
                self.returned += 1;
                Some(entry)
            }
            Err(e) => {
                tracing::warn!(error = %e, "sstable read failed mid-iteration, ending stream");
                self.reader = None;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.num_entries - self.returned) as usize;
        (0, Some(remaining))
    }
}
