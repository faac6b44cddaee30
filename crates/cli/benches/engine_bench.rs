use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine::{Config, LsmTree};
use tempfile::tempdir;

const N: usize = 1_000;
const VAL_SIZE: usize = 100;

fn engine_put_no_flush(c: &mut Criterion) {
    c.bench_function("engine_put_no_flush_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let db = LsmTree::open(dir.path()).unwrap();
                (dir, db)
            },
            |(_dir, mut db)| {
                for i in 0..N {
                    let key = format!("k{}", i).into_bytes();
                    let val = vec![b'x'; VAL_SIZE];
                    db.put(&key, &val).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn engine_put_with_flush(c: &mut Criterion) {
    c.bench_function("engine_put_with_flush_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                // Small budget so the run flushes several times.
                let config = Config::new(dir.path())
                    .memtable_flush_threshold(4096)
                    .filter_bits(1 << 16);
                let db = LsmTree::open_with_config(config).unwrap();
                (dir, db)
            },
            |(_dir, mut db)| {
                for i in 0..N {
                    let key = format!("k{}", i).into_bytes();
                    let val = vec![b'x'; VAL_SIZE];
                    db.put(&key, &val).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn engine_get_memtable_hit(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut db = LsmTree::open(dir.path()).unwrap();
    for i in 0..N {
        db.put(format!("k{:06}", i).as_bytes(), &vec![b'x'; VAL_SIZE])
            .unwrap();
    }

    c.bench_function("engine_get_memtable_hit_1k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("k{:06}", i).into_bytes();
                criterion::black_box(db.get(&key));
            }
        });
    });
}

fn engine_get_sstable_hit(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut db = LsmTree::open(dir.path()).unwrap();
    for i in 0..N {
        db.put(format!("k{:06}", i).as_bytes(), &vec![b'x'; VAL_SIZE])
            .unwrap();
    }
    db.manual_flush().unwrap();

    c.bench_function("engine_get_sstable_hit_1k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("k{:06}", i).into_bytes();
                criterion::black_box(db.get(&key));
            }
        });
    });
}

fn engine_scan_merged(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut db = LsmTree::open(dir.path()).unwrap();
    for i in 0..N {
        db.put(format!("k{:06}", i).as_bytes(), &vec![b'x'; VAL_SIZE])
            .unwrap();
    }
    db.manual_flush().unwrap();
    // Leave some fresher records in the memtable so the scan really merges.
    for i in (0..N).step_by(10) {
        db.put(format!("k{:06}", i).as_bytes(), &vec![b'y'; VAL_SIZE])
            .unwrap();
    }

    c.bench_function("engine_scan_100_of_1k", |b| {
        b.iter(|| {
            let result = db.scan(b"k000100", b"k000199", 1000);
            criterion::black_box(result.len());
        });
    });
}

fn engine_mixed_workload(c: &mut Criterion) {
    c.bench_function("engine_mixed_put_get_del_1k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let db = LsmTree::open(dir.path()).unwrap();
                (dir, db)
            },
            |(_dir, mut db)| {
                for i in 0..N {
                    let key = format!("k{:06}", i).into_bytes();
                    db.put(&key, &vec![b'x'; VAL_SIZE]).unwrap();
                    criterion::black_box(db.get(&key));
                    if i % 5 == 0 {
                        db.remove(&key).unwrap();
                    }
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    engine_put_no_flush,
    engine_put_with_flush,
    engine_get_memtable_hit,
    engine_get_sstable_hit,
    engine_scan_merged,
    engine_mixed_workload,
);

criterion_main!(benches);
