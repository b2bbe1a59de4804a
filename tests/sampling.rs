use std::time::Duration;

use durable_topk::{
    base::Dataset,
    exact::PrefixSumIndex,
    index::{ResultSet, Window},
    metrics::Accuracy,
    pruning::{SamplingIndex, SamplingOptions},
};
use helpers::{datasets::ar1_dataset, init_logger};
use ntest::timeout;
use rand::{rngs::StdRng, SeedableRng};
use rstest::rstest;

/// Objects 0-2 lead 9 timestamps out of 10, objects 3-5 the remaining
/// ones, and objects 6-9 never make it to the top-3
fn leaders() -> Dataset {
    let objects = (0..10)
        .map(|id| {
            let series = (1..=100).map(move |t| {
                let score = match (id, t % 10 == 0) {
                    (0..=2, false) | (3..=5, true) => 10. + id as f64,
                    _ => id as f64 / 10.,
                };
                (t, score)
            });
            durable_topk::TemporalObject::with_series(id, series).unwrap()
        })
        .collect();
    Dataset::new(objects).unwrap()
}

#[rstest]
#[timeout(Duration::from_secs(10))]
fn test_sampling_recovers_clear_answer(#[values(1, 2, 3, 42)] seed: u64) {
    init_logger();
    let dataset = leaders();
    let expected = PrefixSumIndex::new(&dataset, 3, Window::new(1, 100).unwrap())
        .unwrap()
        .query(1, 100, 0.5)
        .unwrap();
    assert_eq!(expected, ResultSet::from([0, 1, 2]));

    let options = SamplingOptions {
        sample_size: 2000,
        seed: Some(seed),
    };
    let index = SamplingIndex::new(&dataset, 3, options).unwrap();
    assert_eq!(index.query(1, 100, 0.5).unwrap(), expected);
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let dataset = ar1_dataset(30, 200, 0.8, Some(3));
    let options = SamplingOptions {
        sample_size: 15,
        seed: Some(17),
    };
    let index = SamplingIndex::new(&dataset, 5, options).unwrap();
    let other = SamplingIndex::new(&dataset, 5, index.options().clone()).unwrap();

    let result = index.query(10, 150, 0.2).unwrap();
    assert_eq!(index.query(10, 150, 0.2).unwrap(), result);
    assert_eq!(other.query(10, 150, 0.2).unwrap(), result);

    // Same generator state, same samples
    let unseeded = SamplingIndex::new(&dataset, 5, Default::default()).unwrap();
    let first = unseeded
        .query_with_rng(10, 150, 0.2, &mut StdRng::seed_from_u64(99))
        .unwrap();
    let second = unseeded
        .query_with_rng(10, 150, 0.2, &mut StdRng::seed_from_u64(99))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
#[timeout(20000)]
fn test_larger_samples_are_more_accurate() {
    let dataset = leaders();
    let expected = ResultSet::from([0, 1, 2]);

    let mean_f1 = |sample_size: usize| {
        let options = SamplingOptions {
            sample_size,
            seed: None,
        };
        let index = SamplingIndex::new(&dataset, 3, options).unwrap();
        let total: f64 = (0..50)
            .map(|seed| {
                let result = index
                    .query_with_rng(1, 100, 0.5, &mut StdRng::seed_from_u64(seed))
                    .unwrap();
                Accuracy::compute(&result, &expected).f1
            })
            .sum();
        total / 50.
    };

    let small = mean_f1(1);
    let large = mean_f1(500);
    assert!(large >= small, "{} < {}", large, small);
    assert!(large > 0.99);
}
