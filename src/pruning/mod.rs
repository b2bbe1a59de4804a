//! Engines that rank snapshots at query time
//!
//! Both keep the timestamp index of the dataset and a fixed k:
//! - [`geometric`] ranks every snapshot of the window
//! - [`sampling`] ranks a random sample of timestamps of the window

pub mod geometric;
pub mod sampling;

use std::collections::HashMap;

use crate::{
    base::{Count, ObjectId, Timestamp},
    snapshot::TimeIndex,
};

pub use geometric::GeometricIndex;
pub use sampling::{SamplingIndex, SamplingOptions};

/// Adds one to the count of every object in the top-k at time t
fn tally_top_k(counts: &mut HashMap<ObjectId, Count>, index: &TimeIndex, t: Timestamp, k: usize) {
    for id in index.top_k(t, k) {
        *counts.entry(id).or_insert(0) += 1;
    }
}
