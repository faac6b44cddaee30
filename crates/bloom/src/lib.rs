//! # Bloom — membership filter
//!
//! A fixed-width Bloom filter used by SiltKV SSTables to skip files that
//! cannot contain a key. Every SSTable embeds one serialized filter; the
//! engine consults the in-memory copy before touching the file at all.
//!
//! ## Key properties
//! - **No false negatives**: every key added to the filter reports present.
//! - **Reproducible**: the probe positions depend only on the key bytes and
//!   the filter geometry, so a filter written by one process reads back
//!   identically in another.
//! - **Serialization-friendly**: bits are stored packed, LSB-first within
//!   each byte, so the in-memory representation *is* the on-disk form.
//!
//! ## Example
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut f = BloomFilter::new();
//! f.add(b"hello");
//! assert!(f.might_contain(b"hello"));
//!
//! let restored = BloomFilter::from_bytes(f.to_bytes(), f.num_bits(), f.num_hashes());
//! assert!(restored.might_contain(b"hello"));
//! ```

/// Default filter width in bits (2^20, i.e. 128 KiB serialized).
pub const DEFAULT_FILTER_BITS: usize = 1 << 20;

/// Default number of hash probes per key.
pub const DEFAULT_NUM_HASHES: u32 = 3;

/// A fixed-width Bloom filter with `k` polynomial rolling-hash probes.
///
/// The bit array is packed into bytes, LSB-first: logical bit `j` of byte
/// `b` is bit `8*b + j`. [`to_bytes`](BloomFilter::to_bytes) exposes that
/// packed form directly for embedding in an SSTable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    bits: Vec<u8>,
    num_bits: usize,
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates an empty filter with the default geometry
    /// ([`DEFAULT_FILTER_BITS`] bits, [`DEFAULT_NUM_HASHES`] probes).
    pub fn new() -> Self {
        Self::with_params(DEFAULT_FILTER_BITS, DEFAULT_NUM_HASHES)
    }

    /// Creates an empty filter with a custom geometry.
    ///
    /// `num_bits` is the logical width of the bit array; the backing
    /// storage is `ceil(num_bits / 8)` bytes. Tests use small widths to
    /// make collisions observable.
    pub fn with_params(num_bits: usize, num_hashes: u32) -> Self {
        Self {
            bits: vec![0u8; num_bits.div_ceil(8)],
            num_bits,
            num_hashes,
        }
    }

    /// Reconstructs a filter from its serialized bytes.
    ///
    /// Inverse of [`to_bytes`](BloomFilter::to_bytes) for a filter of the
    /// same geometry. Input longer than `ceil(num_bits / 8)` bytes is
    /// truncated; shorter input is zero-filled, leaving the remaining bits
    /// unset.
    pub fn from_bytes(data: &[u8], num_bits: usize, num_hashes: u32) -> Self {
        let len = num_bits.div_ceil(8);
        let mut bits = vec![0u8; len];
        let n = data.len().min(len);
        bits[..n].copy_from_slice(&data[..n]);
        Self {
            bits,
            num_bits,
            num_hashes,
        }
    }

    /// Adds a key to the filter by setting all of its probe bits.
    pub fn add(&mut self, key: &[u8]) {
        for seed in 1..=self.num_hashes as u64 {
            let pos = self.probe(key, seed);
            self.bits[pos / 8] |= 1 << (pos % 8);
        }
    }

    /// Returns `true` if the key *may* have been added.
    ///
    /// A `false` result is definitive: the key was never added. A `true`
    /// result may be a false positive.
    pub fn might_contain(&self, key: &[u8]) -> bool {
        (1..=self.num_hashes as u64).all(|seed| {
            let pos = self.probe(key, seed);
            self.bits[pos / 8] & (1 << (pos % 8)) != 0
        })
    }

    /// The packed bit array, `ceil(num_bits / 8)` bytes, LSB-first within
    /// each byte. Written verbatim into the SSTable's filter region.
    pub fn to_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Serialized size in bytes.
    pub fn serialized_len(&self) -> usize {
        self.bits.len()
    }

    /// Logical width of the bit array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of hash probes per key.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    // Polynomial rolling hash over the key bytes with the given seed,
    // in wrapping u64 arithmetic, reduced modulo the filter width.
    fn probe(&self, key: &[u8], seed: u64) -> usize {
        let mut h: u64 = 0;
        for &b in key {
            h = h.wrapping_mul(seed).wrapping_add(b as u64);
        }
        (h % self.num_bits as u64) as usize
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new()
    }
}
