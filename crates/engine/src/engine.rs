use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use memtable::Memtable;
use sstable::SsTable;

use crate::merge::{MergeIterator, MergeSource};
use crate::{Config, EngineError, Result, TOMBSTONE};

/// The LSM store: one memtable plus a sequence of SSTable tiers.
///
/// Tier 0 receives memtable flushes; when any tier reaches the compaction
/// threshold, all of its files are merged into a single table appended to
/// the next tier, cascading as far as needed. Within a tier, later list
/// positions are newer; across tiers, lower indices are newer. The
/// memtable is newer than everything on disk.
///
/// Dropping the tree releases resources without flushing — callers that
/// want buffered writes on disk invoke [`manual_flush`](Self::manual_flush)
/// first. Tier membership is not persisted: a reopened directory starts
/// empty and existing `.sst` files are orphans unless a higher layer
/// adopts them via [`SsTable::open`].
pub struct LsmTree {
    config: Config,
    memtable: Memtable,
    tiers: Vec<Vec<SsTable>>,
    /// Suffix for generated filenames; timestamps alone collide under
    /// sub-millisecond bursts.
    file_seq: u64,
}

impl LsmTree {
    /// Opens a store on `dir` with default configuration, creating the
    /// directory if missing. Starts with an empty memtable and one empty
    /// tier.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_config(Config::new(dir))
    }

    /// Opens a store with a custom [`Config`].
    ///
    /// Rejects a tier compaction threshold below 2: compacting a tier into
    /// a single file that immediately re-qualifies would recurse forever.
    pub fn open_with_config(config: Config) -> Result<Self> {
        if config.tier_compaction_threshold < 2 {
            return Err(EngineError::Config(format!(
                "tier compaction threshold must be at least 2, got {}",
                config.tier_compaction_threshold
            )));
        }
        fs::create_dir_all(&config.dir)?;
        let memtable = Memtable::with_threshold(config.memtable_flush_threshold);
        Ok(Self {
            config,
            memtable,
            tiers: vec![Vec::new()],
            file_seq: 0,
        })
    }

    /// Inserts or replaces a key, flushing inline if the memtable fills.
    ///
    /// On a flush failure the write itself is retained in the memtable and
    /// the error reports the failed table creation; a later write or
    /// [`manual_flush`](Self::manual_flush) retries.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.memtable.put(key.to_vec(), value.to_vec());
        if self.memtable.should_flush() {
            self.flush_memtable()?;
        }
        Ok(())
    }

    /// Deletes a key by writing the tombstone marker, flushing inline if
    /// the memtable fills.
    pub fn remove(&mut self, key: &[u8]) -> Result<()> {
        self.memtable.put(key.to_vec(), TOMBSTONE.to_vec());
        if self.memtable.should_flush() {
            self.flush_memtable()?;
        }
        Ok(())
    }

    /// Looks up the newest value for a key.
    ///
    /// Consults the memtable, then each tier from 0 upward walking that
    /// tier's files newest-first; the first table that knows the key
    /// decides. `None` covers both never-written and deleted keys; the
    /// core does not distinguish them.
    ///
    /// A table that fails to read is logged and treated as a miss so the
    /// remaining sources still answer.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(value) = self.memtable.get(key) {
            return live(value.to_vec());
        }

        for tier in &self.tiers {
            for sst in tier.iter().rev() {
                match sst.get(key) {
                    Ok(Some(value)) => return live(value),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            path = %sst.path().display(),
                            error = %e,
                            "sstable read failed during get, treating as miss"
                        );
                    }
                }
            }
        }
        None
    }

    /// Collects up to `limit` live entries with keys in `[start, end]`,
    /// ascending.
    ///
    /// The memtable and each table of each tier feed a streaming k-way
    /// merge tagged by recency (memtable first, then tiers top-down, each
    /// tier newest-first), so for every key the newest record wins. Keys
    /// whose newest record is a tombstone are suppressed and do not count
    /// against `limit`.
    pub fn scan(&self, start: &[u8], end: &[u8], limit: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
        if start > end || limit == 0 {
            return Vec::new();
        }

        let mut sources: Vec<MergeSource> = Vec::new();
        sources.push(MergeSource::new(
            Box::new(
                self.memtable
                    .range(start, end)
                    .map(|(k, v)| (k.to_vec(), v.to_vec())),
            ),
            0,
        ));

        let mut order = 1;
        for tier in &self.tiers {
            for sst in tier.iter().rev() {
                let range_start = start.to_vec();
                let range_end = end.to_vec();
                let in_range = sst
                    .iter(order)
                    .skip_while(move |(k, _)| k.as_slice() < range_start.as_slice())
                    .take_while(move |(k, _)| k.as_slice() <= range_end.as_slice());
                sources.push(MergeSource::new(Box::new(in_range), order));
                order += 1;
            }
        }

        MergeIterator::new(sources)
            .filter(|(_, v)| v.as_slice() != TOMBSTONE)
            .take(limit)
            .collect()
    }

    /// Flushes the memtable to a tier-0 SSTable now. A no-op when the
    /// memtable is empty.
    pub fn manual_flush(&mut self) -> Result<()> {
        self.flush_memtable()
    }

    /// Number of tiers, including any empty ones left by compaction.
    pub fn get_tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Logs memtable and per-tier occupancy for diagnostics.
    pub fn print_stats(&self) {
        tracing::info!(
            memtable_bytes = self.memtable.size_bytes(),
            memtable_entries = self.memtable.len(),
            tiers = self.tiers.len(),
            "lsm tree stats"
        );
        for (tier, tables) in self.tiers.iter().enumerate() {
            let entries: u64 = tables.iter().map(|t| t.num_entries() as u64).sum();
            tracing::info!(tier, files = tables.len(), entries, "tier stats");
        }
    }

    fn flush_memtable(&mut self) -> Result<()> {
        if self.memtable.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            bytes = self.memtable.size_bytes(),
            entries = self.memtable.len(),
            "flushing memtable"
        );

        let sorted = self.memtable.sorted_entries();
        let path = self.next_sstable_path();
        let sst = SsTable::create_from_sorted_data(
            &path,
            &sorted,
            self.config.filter_bits,
            self.config.filter_hashes,
        )?;

        self.tiers[0].push(sst);
        self.memtable.clear();
        self.compact_tier(0)
    }

    /// Compacts tier `tier` if it has reached the threshold, cascading into
    /// the tiers below it as they fill in turn.
    ///
    /// The merged table is written first; only on success are the input
    /// files deleted and the tier emptied, so a failed compaction leaves
    /// the source tier fully intact for a later retry.
    fn compact_tier(&mut self, tier: usize) -> Result<()> {
        assert!(
            tier < self.tiers.len(),
            "compaction requested for out-of-range tier {tier}"
        );
        if self.tiers[tier].len() < self.config.tier_compaction_threshold {
            return Ok(());
        }
        tracing::debug!(tier, files = self.tiers[tier].len(), "compacting tier");

        if tier + 1 >= self.tiers.len() {
            self.tiers.resize_with(tier + 2, Vec::new);
        }

        let path = self.next_sstable_path();
        let merged = self.merge_tier(tier, &path)?;

        for sst in &self.tiers[tier] {
            if let Err(e) = fs::remove_file(sst.path()) {
                tracing::warn!(
                    path = %sst.path().display(),
                    error = %e,
                    "failed to remove compacted sstable"
                );
            }
        }
        self.tiers[tier].clear();
        self.tiers[tier + 1].push(merged);

        self.compact_tier(tier + 1)
    }

    /// K-way merges every file currently in `tier` into one new table at
    /// `path`. The newest file (last in the tier's list) merges with order
    /// 0, so on duplicate keys its record wins. Tombstones are retained —
    /// they may still shadow older tiers that have not compacted yet.
    fn merge_tier(&self, tier: usize, path: &Path) -> Result<SsTable> {
        let tables = &self.tiers[tier];
        let sources: Vec<MergeSource> = tables
            .iter()
            .enumerate()
            .map(|(i, sst)| {
                let order = tables.len() - 1 - i;
                MergeSource::new(Box::new(sst.iter(order)), order)
            })
            .collect();

        let merged: Vec<(Vec<u8>, Vec<u8>)> = MergeIterator::new(sources).collect();
        tracing::debug!(tier, unique_keys = merged.len(), "tier merge complete");

        SsTable::create_from_sorted_data(
            path,
            &merged,
            self.config.filter_bits,
            self.config.filter_hashes,
        )
        .map_err(Into::into)
    }

    /// `sst_<ms-since-epoch><seq>.sst` under the data directory. The
    /// monotonic suffix keeps names unique when several tables are written
    /// within one millisecond.
    fn next_sstable_path(&mut self) -> PathBuf {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        self.file_seq += 1;
        self.config
            .dir
            .join(format!("sst_{}{:03}.sst", timestamp_ms, self.file_seq))
    }
}

/// Maps the tombstone marker to an absent-key response.
fn live(value: Vec<u8>) -> Option<Vec<u8>> {
    if value == TOMBSTONE {
        None
    } else {
        Some(value)
    }
}


#[cfg(test)]
impl LsmTree {
    /// Test-only visibility into tier occupancy.
    fn tier_file_counts(&self) -> Vec<usize> {
        self.tiers.iter().map(|t| t.len()).collect()
    }

    /// Test-only: whether the memtable has been drained.
    fn memtable_is_empty(&self) -> bool {
        self.memtable.is_empty()
    }
}
