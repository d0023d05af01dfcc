//! Buffer pool and trie benchmarks for OpalDB.
//!
//! Measures the hot paths that dominate workload cost: cached fetch/unpin
//! round trips, eviction churn under a tight pool, and trie point
//! operations under growing key populations.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use opaldb::{AccessType, BufferPoolManager, MemoryDiskManager, Trie};

fn bench_cached_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_cached_fetch");

    let bpm = BufferPoolManager::new(64, 2, Arc::new(MemoryDiskManager::new())).unwrap();
    let page_id = {
        let page = bpm.new_page().unwrap();
        let id = page.page_id();
        bpm.unpin_page(id, false, AccessType::Unknown);
        id
    };

    group.throughput(Throughput::Elements(1));
    group.bench_function("fetch_unpin_hit", |b| {
        b.iter(|| {
            let page = bpm.fetch_page(black_box(page_id), AccessType::Lookup).unwrap();
            black_box(page.page_id());
            bpm.unpin_page(page_id, false, AccessType::Unknown);
        });
    });

    group.finish();
}

fn bench_eviction_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_eviction_churn");

    // Working set double the pool size: every fetch round evicts.
    let bpm = BufferPoolManager::new(8, 2, Arc::new(MemoryDiskManager::new())).unwrap();
    let ids: Vec<_> = (0..16)
        .map(|_| {
            let page = bpm.new_page().unwrap();
            let id = page.page_id();
            bpm.unpin_page(id, true, AccessType::Unknown);
            id
        })
        .collect();

    group.throughput(Throughput::Elements(ids.len() as u64));
    group.bench_function("sweep_16_pages_pool_8", |b| {
        b.iter(|| {
            for &id in &ids {
                let page = bpm.fetch_page(id, AccessType::Scan).unwrap();
                black_box(page.frame_id());
                bpm.unpin_page(id, false, AccessType::Unknown);
            }
        });
    });

    group.finish();
}

fn bench_trie_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_ops");

    for count in [100usize, 1000] {
        let keys: Vec<Vec<u8>> = (0..count)
            .map(|i| format!("key/{i:08}").into_bytes())
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("put", count), &keys, |b, keys| {
            b.iter(|| {
                let mut trie = Trie::new();
                for (i, key) in keys.iter().enumerate() {
                    trie = trie.put(key, i as u64);
                }
                black_box(trie)
            });
        });

        let populated = keys
            .iter()
            .enumerate()
            .fold(Trie::new(), |t, (i, key)| t.put(key, i as u64));

        group.bench_with_input(BenchmarkId::new("get", count), &keys, |b, keys| {
            b.iter(|| {
                for key in keys {
                    black_box(populated.get::<u64>(key));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached_fetch, bench_eviction_churn, bench_trie_ops);
criterion_main!(benches);
