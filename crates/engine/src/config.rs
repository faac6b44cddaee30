use std::path::PathBuf;

/// Configuration for an [`LsmTree`](crate::LsmTree).
///
/// Every tunable affects behavior only, never the on-disk format. Tests use
/// tiny thresholds to force flushes and compactions with little data.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the store's SSTable files. Created if missing.
    pub dir: PathBuf,

    /// Memtable byte budget before an automatic flush (default: 4 MiB).
    pub memtable_flush_threshold: usize,

    /// Number of files a tier may hold before it is compacted into the next
    /// tier (default: 10). Must be at least 2 — a threshold of 1 would
    /// recompact the freshly merged table forever.
    pub tier_compaction_threshold: usize,

    /// Width of each SSTable's membership filter in bits (default: 2^20).
    pub filter_bits: usize,

    /// Hash probes per key in the membership filter (default: 3).
    pub filter_hashes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./siltkv"),
            memtable_flush_threshold: memtable::DEFAULT_FLUSH_THRESHOLD,
            tier_compaction_threshold: 10,
            filter_bits: bloom::DEFAULT_FILTER_BITS,
            filter_hashes: bloom::DEFAULT_NUM_HASHES,
        }
    }
}

impl Config {
    /// Creates a config with the given data directory and default tunables.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Sets the memtable byte budget before an automatic flush.
    pub fn memtable_flush_threshold(mut self, bytes: usize) -> Self {
        self.memtable_flush_threshold = bytes;
        self
    }

    /// Sets the files-per-tier count that triggers compaction.
    pub fn tier_compaction_threshold(mut self, files: usize) -> Self {
        self.tier_compaction_threshold = files;
        self
    }

    /// Sets the membership filter width in bits.
    pub fn filter_bits(mut self, bits: usize) -> Self {
        self.filter_bits = bits;
        self
    }

    /// Sets the membership filter probe count.
    pub fn filter_hashes(mut self, hashes: u32) -> Self {
        self.filter_hashes = hashes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.dir, PathBuf::from("./siltkv"));
        assert_eq!(config.memtable_flush_threshold, 4 * 1024 * 1024);
        assert_eq!(config.tier_compaction_threshold, 10);
        assert_eq!(config.filter_bits, 1 << 20);
        assert_eq!(config.filter_hashes, 3);
    }

    #[test]
    fn config_builder() {
        let config = Config::new("/tmp/test")
            .memtable_flush_threshold(256)
            .tier_compaction_threshold(2)
            .filter_bits(4096)
            .filter_hashes(2);

        assert_eq!(config.dir, PathBuf::from("/tmp/test"));
        assert_eq!(config.memtable_flush_threshold, 256);
        assert_eq!(config.tier_compaction_threshold, 2);
        assert_eq!(config.filter_bits, 4096);
        assert_eq!(config.filter_hashes, 2);
    }
}
