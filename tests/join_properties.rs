use gridjoin::{BoundingBox, Config, SpatialItem, SpatialJoin, nested_loop_join};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random_items(rng: &mut StdRng, count: usize, id_base: u64, extent: f64) -> Vec<SpatialItem> {
    (0..count)
        .map(|i| {
            let x = rng.gen_range(0.0..extent);
            let y = rng.gen_range(0.0..extent);
            let w = rng.gen_range(0.0..extent / 20.0);
            let h = rng.gen_range(0.0..extent / 20.0);
            SpatialItem::new(id_base + i as u64, BoundingBox::new(x, y, x + w, y + h))
        })
        .collect()
}

fn sorted_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> Vec<(u64, u64)> {
    let mut pairs: Vec<_> = pairs.into_iter().collect();
    pairs.sort_unstable();
    pairs
}

/// Test 1: Completeness against the brute-force oracle
///
/// Every truly overlapping pair appears exactly once: no misses, no
/// duplicates, across several random datasets.
#[test]
fn test_completeness_vs_brute_force() {
    let _ = env_logger::builder().is_test(true).try_init();

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = random_items(&mut rng, 300, 0, 100.0);
        let b = random_items(&mut rng, 300, 10_000, 100.0);

        let config = Config::default().with_partitions(8);
        let results = SpatialJoin::new()
            .config(config)
            .run(&a, &b)
            .expect("join failed");

        let actual = sorted_pairs(results);
        let expected = sorted_pairs(nested_loop_join(&a, &b));
        assert_eq!(actual, expected, "mismatch for seed {}", seed);
    }
}

/// Test 2: No false positives
///
/// Every emitted pair has genuinely overlapping bounding boxes.
#[test]
fn test_no_false_positives() {
    let mut rng = StdRng::seed_from_u64(99);
    let a = random_items(&mut rng, 200, 0, 50.0);
    let b = random_items(&mut rng, 200, 10_000, 50.0);

    let box_of = |items: &[SpatialItem], id: u64| -> BoundingBox {
        items.iter().find(|i| i.id == id).expect("unknown id").bbox
    };

    let results = SpatialJoin::new()
        .config(Config::default().with_partitions(5))
        .run(&a, &b)
        .expect("join failed");

    for (id_a, id_b) in results {
        let bbox_a = box_of(&a, id_a);
        let bbox_b = box_of(&b, id_b);
        assert!(
            bbox_a.intersects(&bbox_b),
            "emitted pair ({}, {}) does not overlap",
            id_a,
            id_b
        );
    }
}

/// Test 3: Idempotence under re-gridding
///
/// The result multiset is identical for n = 1, 4, 16 on the same dataset;
/// only performance may vary with the resolution.
#[test]
fn test_idempotence_under_regrid() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_items(&mut rng, 400, 0, 80.0);
    let b = random_items(&mut rng, 400, 10_000, 80.0);

    let run_with = |n: usize| {
        let results = SpatialJoin::new()
            .config(Config::default().with_partitions(n))
            .run(&a, &b)
            .expect("join failed");
        sorted_pairs(results)
    };

    let n1 = run_with(1);
    let n4 = run_with(4);
    let n16 = run_with(16);

    assert_eq!(n1, n4);
    assert_eq!(n4, n16);
}

/// Test 4: Input-order independence
///
/// Shuffling A and/or B yields the same result multiset.
#[test]
fn test_order_independence() {
    let mut rng = StdRng::seed_from_u64(21);
    let a = random_items(&mut rng, 250, 0, 60.0);
    let b = random_items(&mut rng, 250, 10_000, 60.0);

    let config = Config::default().with_partitions(6);
    let baseline = sorted_pairs(
        SpatialJoin::new()
            .config(config.clone())
            .run(&a, &b)
            .expect("join failed"),
    );

    let mut a_shuffled = a.clone();
    let mut b_shuffled = b.clone();
    a_shuffled.shuffle(&mut rng);
    b_shuffled.shuffle(&mut rng);

    let shuffled = sorted_pairs(
        SpatialJoin::new()
            .config(config)
            .run(&a_shuffled, &b_shuffled)
            .expect("join failed"),
    );

    assert_eq!(baseline, shuffled);
}

/// Test 5: Boundary straddling emits exactly once
///
/// A box spanning exactly two adjacent cells, with a partner overlapping
/// it only within the shared region, produces one pair regardless of cell
/// scan order.
#[test]
fn test_boundary_straddling_pair_once() {
    // Universe (0,0)-(8,8) with n = 4: boundaries at x = 2, 4, 6
    let config = Config::default()
        .with_universe(BoundingBox::new(0.0, 0.0, 8.0, 8.0))
        .with_partitions(4);

    // Spans cells (0,0) and (0,1) across x = 2
    let a = vec![SpatialItem::new(1, BoundingBox::new(1.2, 0.5, 2.8, 1.5))];
    // Overlaps only within (1.8, 0.8)-(2.2, 1.2), itself straddling x = 2
    let b = vec![SpatialItem::new(2, BoundingBox::new(1.8, 0.8, 2.2, 1.2))];

    let pairs: Vec<_> = SpatialJoin::new()
        .config(config)
        .run(&a, &b)
        .expect("join failed")
        .collect();
    assert_eq!(pairs, vec![(1, 2)]);
}

/// Test 6: Deterministic output for identical invocations
#[test]
fn test_reproducible_output_order() {
    let mut rng = StdRng::seed_from_u64(13);
    let a = random_items(&mut rng, 150, 0, 40.0);
    let b = random_items(&mut rng, 150, 10_000, 40.0);

    let config = Config::default().with_partitions(4);
    let first: Vec<_> = SpatialJoin::new()
        .config(config.clone())
        .run(&a, &b)
        .expect("join failed")
        .collect();
    let second: Vec<_> = SpatialJoin::new()
        .config(config)
        .run(&a, &b)
        .expect("join failed")
        .collect();

    // Not just the same multiset: the exact same sequence
    assert_eq!(first, second);
}

/// Test 7: Parallel execution produces the same multiset
#[test]
fn test_parallel_multiset_equality() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_items(&mut rng, 350, 0, 70.0);
    let b = random_items(&mut rng, 350, 10_000, 70.0);

    let config = Config::default().with_partitions(7);
    let sequential = sorted_pairs(
        SpatialJoin::new()
            .config(config.clone())
            .run(&a, &b)
            .expect("join failed"),
    );
    let parallel = SpatialJoin::new()
        .config(config)
        .run_parallel(&a, &b)
        .expect("parallel join failed");

    assert_eq!(sequential, sorted_pairs(parallel.pairs));
}

/// Test 8: Auto-sized grid stays correct
///
/// Leaving the resolution unset picks n from the dataset sizes; the
/// result must still match the oracle.
#[test]
fn test_auto_resolution_correctness() {
    let mut rng = StdRng::seed_from_u64(31);
    let a = random_items(&mut rng, 500, 0, 120.0);
    let b = random_items(&mut rng, 500, 10_000, 120.0);

    let config = Config::default().with_cell_capacity(50);
    let results = SpatialJoin::new()
        .config(config)
        .run(&a, &b)
        .expect("join failed");

    let actual = sorted_pairs(results);
    let expected = sorted_pairs(nested_loop_join(&a, &b));
    assert_eq!(actual, expected);
}

/// Test 9: Stats account for every candidate
#[test]
fn test_stats_consistency() {
    let mut rng = StdRng::seed_from_u64(17);
    let a = random_items(&mut rng, 200, 0, 50.0);
    let b = random_items(&mut rng, 200, 10_000, 50.0);

    let mut results = SpatialJoin::new()
        .config(Config::default().with_partitions(5))
        .run(&a, &b)
        .expect("join failed");
    let emitted = results.by_ref().count();

    let stats = results.stats();
    assert_eq!(stats.pairs_emitted, emitted);
    assert_eq!(
        stats.candidate_pairs,
        stats.pairs_emitted + stats.pairs_suppressed
    );
    assert!(stats.cells_populated > 0);
}
