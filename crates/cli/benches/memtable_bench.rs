use criterion::{criterion_group, criterion_main, Criterion};
use engine::TOMBSTONE;
use memtable::Memtable;

const N: u64 = 10_000;
const VAL_SIZE: usize = 100;

fn memtable_fill_until_flush(c: &mut Criterion) {
    // put + should_flush is the engine's entire buffered write path.
    c.bench_function("memtable_fill_until_flush_256k", |b| {
        b.iter(|| {
            let mut m = Memtable::with_threshold(256 * 1024);
            let mut i = 0u64;
            while !m.should_flush() {
                m.put(format!("k{:06}", i).into_bytes(), vec![b'x'; VAL_SIZE]);
                i += 1;
            }
            criterion::black_box(m.len());
        });
    });
}

fn memtable_value_replacement_churn(c: &mut Criterion) {
    // Replacements take the accounting's other branch: subtract the
    // previous value, re-add key + value. Varying value sizes keep the
    // byte counter moving in both directions.
    c.bench_function("memtable_value_replacement_churn_10k", |b| {
        b.iter(|| {
            let mut m = Memtable::new();
            for i in 0..N {
                m.put(
                    format!("k{:04}", i % 1_000).into_bytes(),
                    vec![b'x'; (i % 200) as usize],
                );
            }
            criterion::black_box(m.size_bytes());
        });
    });
}

fn memtable_tombstone_churn(c: &mut Criterion) {
    // Deletes are ordinary puts of the tombstone marker; alternate live
    // values and markers over a churning key set.
    c.bench_function("memtable_tombstone_churn_10k", |b| {
        b.iter(|| {
            let mut m = Memtable::new();
            for i in 0..N {
                let key = format!("k{:04}", i % 1_000).into_bytes();
                if i % 2 == 0 {
                    m.put(key, vec![b'x'; VAL_SIZE]);
                } else {
                    m.put(key, TOMBSTONE.to_vec());
                }
            }
            criterion::black_box(m.len());
        });
    });
}

fn memtable_get_through_tombstones(c: &mut Criterion) {
    // The read path the engine actually runs: fetch the raw entry, then
    // decide whether it is a live value or a deletion marker.
    let mut m = Memtable::new();
    for i in 0..N {
        let value = if i % 2 == 0 {
            vec![b'x'; VAL_SIZE]
        } else {
            TOMBSTONE.to_vec()
        };
        m.put(format!("k{:06}", i).into_bytes(), value);
    }

    c.bench_function("memtable_get_through_tombstones_10k", |b| {
        b.iter(|| {
            for i in 0..N {
                let key = format!("k{:06}", i).into_bytes();
                criterion::black_box(m.get(&key).map(|v| v == TOMBSTONE));
            }
        });
    });
}

fn memtable_scan_range(c: &mut Criterion) {
    let mut m = Memtable::new();
    for i in 0..N {
        m.put(format!("k{:06}", i).into_bytes(), vec![b'x'; VAL_SIZE]);
    }

    c.bench_function("memtable_scan_1k_of_10k", |b| {
        b.iter(|| {
            let result = m.scan(b"k001000", b"k001999", 1000);
            criterion::black_box(result.len());
        });
    });
}

fn memtable_sorted_snapshot(c: &mut Criterion) {
    let mut m = Memtable::new();
    for i in 0..N {
        m.put(format!("k{:06}", i).into_bytes(), vec![b'x'; VAL_SIZE]);
    }

    c.bench_function("memtable_sorted_snapshot_10k", |b| {
        b.iter(|| {
            let snapshot = m.sorted_entries();
            criterion::black_box(snapshot.len());
        });
    });
}

criterion_group!(
    benches,
    memtable_fill_until_flush,
    memtable_value_replacement_churn,
    memtable_tombstone_churn,
    memtable_get_through_tombstones,
    memtable_scan_range,
    memtable_sorted_snapshot,
);

criterion_main!(benches);
