use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use sstable::SsTable;
use tempfile::tempdir;

const N: usize = 1_000;
const VAL_SIZE: usize = 100;
const FILTER_BITS: usize = 1 << 20;

fn entries() -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..N)
        .map(|i| (format!("k{:06}", i).into_bytes(), vec![b'x'; VAL_SIZE]))
        .collect()
}

fn sstable_create_1k(c: &mut Criterion) {
    let data = entries();
    c.bench_function("sstable_create_1k", |b| {
        b.iter_batched(
            || tempdir().unwrap(),
            |dir| {
                let path = dir.path().join("bench.sst");
                SsTable::create_from_sorted_data(&path, &data, FILTER_BITS, 3).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn sstable_get_hit(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hit.sst");
    let sst = SsTable::create_from_sorted_data(&path, &entries(), FILTER_BITS, 3).unwrap();

    c.bench_function("sstable_get_hit_1k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("k{:06}", i).into_bytes();
                criterion::black_box(sst.get(&key).unwrap());
            }
        });
    });
}

fn sstable_get_miss_filtered(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("miss.sst");
    let sst = SsTable::create_from_sorted_data(&path, &entries(), FILTER_BITS, 3).unwrap();

    // Nearly every probe is rejected by the filter without touching disk.
    c.bench_function("sstable_get_miss_1k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("miss{:06}", i).into_bytes();
                criterion::black_box(sst.get(&key).unwrap());
            }
        });
    });
}

fn sstable_scan_range(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.sst");
    let sst = SsTable::create_from_sorted_data(&path, &entries(), FILTER_BITS, 3).unwrap();

    c.bench_function("sstable_scan_100_of_1k", |b| {
        b.iter(|| {
            let result = sst.scan(b"k000100", b"k000199", 1000).unwrap();
            criterion::black_box(result.len());
        });
    });
}

fn sstable_full_iteration(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("iter.sst");
    let sst = SsTable::create_from_sorted_data(&path, &entries(), FILTER_BITS, 3).unwrap();

    c.bench_function("sstable_iterate_1k", |b| {
        b.iter(|| {
            let count = sst.iter(0).count();
            criterion::black_box(count);
        });
    });
}

criterion_group!(
    benches,
    sstable_create_1k,
    sstable_get_hit,
    sstable_get_miss_filtered,
    sstable_scan_range,
    sstable_full_iteration,
);

criterion_main!(benches);
