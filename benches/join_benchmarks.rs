use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gridjoin::{BoundingBox, Config, SpatialItem, SpatialJoin, nested_loop_join};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn dataset(seed: u64, count: usize, id_base: u64, extent: f64) -> Vec<SpatialItem> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let x = rng.gen_range(0.0..extent);
            let y = rng.gen_range(0.0..extent);
            let w = rng.gen_range(0.0..extent / 50.0);
            let h = rng.gen_range(0.0..extent / 50.0);
            SpatialItem::new(id_base + i as u64, BoundingBox::new(x, y, x + w, y + h))
        })
        .collect()
}

fn benchmark_pbsm_vs_nested_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("pbsm_vs_nested_loop");

    for &size in &[500, 2_000, 8_000] {
        let a = dataset(1, size, 0, 1_000.0);
        let b = dataset(2, size, 1_000_000, 1_000.0);

        group.bench_with_input(BenchmarkId::new("pbsm", size), &size, |bench, _| {
            bench.iter(|| {
                let results = SpatialJoin::new()
                    .run(black_box(&a), black_box(&b))
                    .unwrap();
                results.count()
            })
        });

        if size <= 2_000 {
            group.bench_with_input(
                BenchmarkId::new("nested_loop", size),
                &size,
                |bench, _| {
                    bench.iter(|| nested_loop_join(black_box(&a), black_box(&b)).len())
                },
            );
        }
    }

    group.finish();
}

fn benchmark_grid_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_resolution");

    let a = dataset(3, 5_000, 0, 1_000.0);
    let b = dataset(4, 5_000, 1_000_000, 1_000.0);

    for &n in &[1, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, &n| {
            let config = Config::default().with_partitions(n);
            bench.iter(|| {
                let results = SpatialJoin::new()
                    .config(config.clone())
                    .run(black_box(&a), black_box(&b))
                    .unwrap();
                results.count()
            })
        });
    }

    group.finish();
}

fn benchmark_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_execution");

    let a = dataset(5, 10_000, 0, 1_000.0);
    let b = dataset(6, 10_000, 1_000_000, 1_000.0);
    let config = Config::default().with_partitions(16);

    group.bench_function("sequential", |bench| {
        bench.iter(|| {
            let results = SpatialJoin::new()
                .config(config.clone())
                .run(black_box(&a), black_box(&b))
                .unwrap();
            results.count()
        })
    });

    group.bench_function("rayon", |bench| {
        bench.iter(|| {
            SpatialJoin::new()
                .config(config.clone())
                .run_parallel(black_box(&a), black_box(&b))
                .unwrap()
                .pairs
                .len()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_pbsm_vs_nested_loop,
    benchmark_grid_resolution,
    benchmark_parallel
);
criterion_main!(benches);
