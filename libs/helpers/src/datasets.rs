use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use durable_topk::base::{Dataset, ObjectId, TemporalObject, Timestamp};

fn make_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_entropy()
    }
}

/// Random AR(1) series: `x[t] = mean + phi * (x[t-1] - mean) + noise`.
///
/// Each object has a different mean (so that rankings are persistent
/// but not constant); an object is observed at each timestamp with
/// probability `density`, and always at t = 1.
pub fn ar1_dataset(
    object_count: ObjectId,
    total_time: Timestamp,
    density: f64,
    seed: Option<u64>,
) -> Dataset {
    let mut rng = make_rng(seed);
    let noise = Normal::new(0., 1.).unwrap();
    let phi = 0.8;

    let objects: Vec<TemporalObject> = (0..object_count)
        .map(|id| {
            let mean = rng.gen_range(0. ..5.);
            let mut value = mean;
            let mut object = TemporalObject::new(id);
            for t in 1..=total_time {
                value = mean + phi * (value - mean) + noise.sample(&mut rng);
                if t == 1 || rng.gen_bool(density) {
                    object.insert(t, value).unwrap();
                }
            }
            object
        })
        .collect();

    debug!(
        "Generated {} objects over {} timestamps (density {})",
        object_count, total_time, density
    );
    Dataset::new(objects).unwrap()
}

/// Builds a dataset from score tables: `scores[i][t - 1]` is the score of
/// object `i` at time t (None when absent)
pub fn from_table(scores: &[Vec<Option<f64>>]) -> Dataset {
    let objects = scores
        .iter()
        .enumerate()
        .map(|(id, row)| {
            let series = row
                .iter()
                .enumerate()
                .filter_map(|(ix, score)| score.map(|s| (ix as Timestamp + 1, s)));
            TemporalObject::with_series(id as ObjectId, series).unwrap()
        })
        .collect();
    Dataset::new(objects).unwrap()
}
