//! Smoke driver for SiltKV: fills a store, reads it back, runs a bounded
//! scan, and prints engine stats. Usage:
//!
//! ```text
//! siltkv [DIR] [NUM_OPS]
//! ```
//!
//! Defaults to `./siltkv-data` and 10,000 operations.

use std::time::Instant;

use anyhow::Result;
use engine::{LsmTree, DEFAULT_SCAN_LIMIT};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "./siltkv-data".to_string());
    let num_ops: usize = match args.next() {
        Some(n) => n.parse()?,
        None => 10_000,
    };

    let mut db = LsmTree::open(&dir)?;

    let start = Instant::now();
    for i in 0..num_ops {
        let key = format!("key_{}", i);
        let value = format!("value_{}_{}", i, "x".repeat(100));
        db.put(key.as_bytes(), value.as_bytes())?;
    }
    db.manual_flush()?;
    let elapsed = start.elapsed();
    tracing::info!(
        ops = num_ops,
        ms = elapsed.as_millis() as u64,
        ops_per_sec = (num_ops as f64 / elapsed.as_secs_f64()) as u64,
        "insert phase done"
    );

    let start = Instant::now();
    let mut found = 0usize;
    for i in 0..num_ops {
        let key = format!("key_{}", i);
        if db.get(key.as_bytes()).is_some() {
            found += 1;
        }
    }
    let elapsed = start.elapsed();
    tracing::info!(
        ops = num_ops,
        found,
        ms = elapsed.as_millis() as u64,
        "get phase done"
    );

    let results = db.scan(b"key_100", b"key_199", DEFAULT_SCAN_LIMIT);
    tracing::info!(results = results.len(), "scan key_100..=key_199 done");

    db.print_stats();
    Ok(())
}
