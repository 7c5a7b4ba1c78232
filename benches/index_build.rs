//! Index build and search benchmarks
//!
//! ## Groups
//!
//! - `build/*`: insert N random vectors through the facade, per entry policy
//! - `search/*`: single-query latency at several beam widths
//! - `reorder/*`: reverse Cuthill-McKee renumbering of a built graph
//!
//! ## Running
//!
//! ```bash
//! cargo bench --bench index_build
//! cargo bench --bench index_build -- "search"  # specific group
//! ```

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use vecnav::prelude::*;

const DIM: usize = 64;

// =============================================================================
// Utilities - all allocation happens here, outside timed loops
// =============================================================================

fn random_vectors(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n * DIM).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

fn build(vectors: &[f32], policy: EntryPolicy) -> IndexHandle {
    let n = vectors.len() / DIM;
    let options = EngineOptions {
        max_edges_per_node: 16,
        ef_construction: 64,
        ..Default::default()
    };
    let mut index = IndexFactory::new()
        .create_with_options(MetricType::L2, DataType::Float32, DIM, n, policy, options)
        .unwrap();
    let labels: Vec<u64> = (0..n as u64).collect();
    index.add(vectors, &labels).unwrap();
    index
}

// =============================================================================
// Build
// =============================================================================

fn build_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for &n in &[1_000usize, 5_000] {
        let vectors = random_vectors(n, 7);
        group.throughput(Throughput::Elements(n as u64));
        for policy in EntryPolicy::ALL {
            group.bench_with_input(BenchmarkId::new(policy.name(), n), &vectors, |b, v| {
                b.iter(|| black_box(build(v, policy)));
            });
        }
    }

    group.finish();
}

// =============================================================================
// Search
// =============================================================================

fn search_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.throughput(Throughput::Elements(1));

    let index = build(&random_vectors(10_000, 11), EntryPolicy::SampledGreedy);
    let queries = random_vectors(256, 13);

    for &ef in &[16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("ef", ef), &ef, |b, &ef| {
            let mut i = 0;
            b.iter(|| {
                let query = &queries[i * DIM..(i + 1) * DIM];
                i = (i + 1) % 256;
                black_box(index.search_with_ef(query, 10, ef).unwrap())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Reorder
// =============================================================================

fn reorder_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    let vectors = random_vectors(5_000, 17);

    group.bench_function("rcm/5000", |b| {
        b.iter_batched(
            || build(&vectors, EntryPolicy::FirstNode),
            |mut index| {
                index.reorder(ReorderStrategy::ReverseCuthillMckee);
                index
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

// =============================================================================
// Benchmark Groups
// =============================================================================

criterion_group!(
    name = index;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(10);
    targets = build_benchmarks, search_benchmarks, reorder_benchmarks
);

criterion_main!(index);
