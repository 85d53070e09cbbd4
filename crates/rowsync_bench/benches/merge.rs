//! Page merge and synchronizer benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowsync_bench::{generate_rows, perturb};
use rowsync_engine::{
    merge_page, ListConfig, ListSynchronizer, LoadIntent, MemorySource, NoopObserver, Record,
    RowMatcher, RowSet,
};

fn row_set(rows: Vec<Record>) -> RowSet<Record> {
    let mut set = RowSet::new(RowMatcher::Identity);
    set.adopt(rows);
    set
}

/// Benchmark a replace merge against a lightly changed page.
fn bench_merge_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_replace");
    let config = ListConfig::default();

    for count in [100, 1_000] {
        let current = row_set(generate_rows(count));
        let page = perturb(current.as_slice(), 10);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let merged = merge_page(
                    black_box(&current),
                    page.clone(),
                    LoadIntent::Replace,
                    &config,
                );
                black_box(merged);
            });
        });
    }

    group.finish();
}

/// Benchmark appending a page.
fn bench_merge_more(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_more");
    let config = ListConfig::paginated(50);

    for count in [100, 1_000, 10_000] {
        let rows = generate_rows(count + 50);
        let current = row_set(rows[..count].to_vec());
        let page = rows[count..].to_vec();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let merged = merge_page(black_box(&current), page.clone(), LoadIntent::More, &config);
                black_box(merged);
            });
        });
    }

    group.finish();
}

/// Benchmark paging through an in-memory source end to end.
fn bench_paginate(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let dataset = generate_rows(1_000);

    c.bench_function("paginate_1000_by_50", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let source = MemorySource::new(dataset.clone());
                let mut list =
                    ListSynchronizer::new(ListConfig::paginated(50), source, NoopObserver);
                list.load_and_wait(LoadIntent::Initial).await;
                while list.load_and_wait(LoadIntent::More).await.is_some() {}
                black_box(list.len());
            });
        });
    });
}

criterion_group!(benches, bench_merge_replace, bench_merge_more, bench_paginate);

criterion_main!(benches);
