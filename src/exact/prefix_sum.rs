//! Prefix-sum index
//!
//! For each object, stores the running number of timestamps where it was
//! ranked within the top-k, so that the count over any sub-window of the
//! indexed range is a difference of two prefix values.
//!
//! Indexing is O(n T) in memory and time, querying is O(n).

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    base::{Count, Dataset, ObjectId, Timestamp},
    error::Result,
    index::{
        check_fixed_k, check_k, check_tau, select_durable, DurableQuery, DurableTopKIndex,
        ResultSet, Window,
    },
    snapshot::TimeIndex,
};

#[derive(Serialize, Deserialize)]
pub struct PrefixSumIndex {
    k: usize,
    range: Window,

    /// `prefix[id][i]` is the number of top-k appearances of `id` in
    /// [range.start, range.start + i - 1] (so `prefix[id][0] = 0`)
    prefix: HashMap<ObjectId, Vec<Count>>,
}

impl PrefixSumIndex {
    /// Builds the index for `k` over the timestamps of `range`
    pub fn new(dataset: &Dataset, k: usize, range: Window) -> Result<Self> {
        check_k(k)?;

        let timeline = TimeIndex::with_range(dataset, range.start(), range.end()).ranked();
        let length = range.len() as usize;

        let mut prefix: HashMap<ObjectId, Vec<Count>> = HashMap::new();
        for (t, snapshot) in timeline.iter() {
            let offset = (t - range.start()) as usize + 1;
            for object in &snapshot[..k.min(snapshot.len())] {
                prefix
                    .entry(object.id)
                    .or_insert_with(|| vec![0; length + 1])[offset] += 1;
            }
        }

        for counts in prefix.values_mut() {
            for i in 1..=length {
                counts[i] += counts[i - 1];
            }
        }

        debug!(
            "Prefix sums for k={} over {}: {} objects in the top-k",
            k,
            range,
            prefix.len()
        );

        Ok(Self { k, range, prefix })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The range given at construction time
    pub fn range(&self) -> Window {
        self.range
    }

    /// Objects in the top-k for at least a fraction `tau` of [start, end],
    /// which must lie within the indexed range
    pub fn query(&self, start: Timestamp, end: Timestamp, tau: f64) -> Result<ResultSet> {
        check_tau(tau)?;
        self.query_window(&Window::new(start, end)?, tau)
    }

    fn query_window(&self, window: &Window, tau: f64) -> Result<ResultSet> {
        window.check_within(&self.range)?;

        let lower = (window.start() - self.range.start()) as usize;
        let upper = (window.end() - self.range.start()) as usize + 1;

        Ok(select_durable(
            self.prefix
                .iter()
                .map(|(&id, counts)| (id, counts[upper] - counts[lower])),
            window.len(),
            tau,
        ))
    }
}

#[typetag::serde]
impl DurableTopKIndex for PrefixSumIndex {
    fn name(&self) -> &'static str {
        "PrefixSum"
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        check_fixed_k(self.k, query.k)?;
        self.query_window(&query.window.unwrap_or(self.range), query.tau)
    }
}
