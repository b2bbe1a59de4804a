//! Oblivious index
//!
//! Keeps, for every indexed k, the top-k list of each timestamp. A query
//! uses the lists of the indexed k nearest to the requested one (which can
//! be larger than it) and supports any window within the timeline.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use super::{check_horizon, check_indexed_ks, nearest_k};
use crate::{
    base::{Count, Dataset, Len, ObjectId, Timestamp},
    error::Result,
    index::{check_k, check_tau, select_durable, DurableQuery, DurableTopKIndex, ResultSet, Window},
    snapshot::RankedTimeline,
};

#[derive(Serialize, Deserialize)]
pub struct ObliviousIndex {
    indexed_ks: Vec<usize>,
    horizon: Window,

    /// For each indexed k (same order as `indexed_ks`), the top-k objects
    /// at each timestamp
    top_k_at_time: Vec<BTreeMap<Timestamp, Vec<ObjectId>>>,
}

impl ObliviousIndex {
    pub fn new(dataset: &Dataset, indexed_ks: &[usize], total_time: Timestamp) -> Result<Self> {
        check_indexed_ks(indexed_ks)?;
        check_horizon(dataset, total_time)?;

        let timeline = RankedTimeline::new(dataset);
        let top_k_at_time: Vec<_> = indexed_ks
            .iter()
            .map(|&k| {
                timeline
                    .iter()
                    .map(|(t, snapshot)| {
                        let ids: Vec<ObjectId> = snapshot[..k.min(snapshot.len())]
                            .iter()
                            .map(|o| o.id)
                            .collect();
                        (t, ids)
                    })
                    .collect::<BTreeMap<_, _>>()
            })
            .collect();

        debug!(
            "Oblivious index over {} timestamps for k in {:?}",
            timeline.len(),
            indexed_ks
        );

        Ok(Self {
            indexed_ks: indexed_ks.to_vec(),
            horizon: Window::new(1, total_time)?,
            top_k_at_time,
        })
    }

    pub fn indexed_ks(&self) -> &[usize] {
        &self.indexed_ks
    }

    /// The indexed k used to answer queries for `k`
    pub fn nearest_indexed_k(&self, k: usize) -> usize {
        self.indexed_ks[nearest_k(&self.indexed_ks, k)]
    }

    pub fn query(&self, k: usize, start: Timestamp, end: Timestamp, tau: f64) -> Result<ResultSet> {
        check_k(k)?;
        check_tau(tau)?;
        self.query_window(k, &Window::new(start, end)?, tau)
    }

    fn query_window(&self, k: usize, window: &Window, tau: f64) -> Result<ResultSet> {
        window.check_within(&self.horizon)?;

        let lists = &self.top_k_at_time[nearest_k(&self.indexed_ks, k)];
        let mut counts: HashMap<ObjectId, Count> = HashMap::new();
        for (_, ids) in lists.range(window.start()..=window.end()) {
            for &id in ids {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        Ok(select_durable(counts, window.len(), tau))
    }
}

#[typetag::serde]
impl DurableTopKIndex for ObliviousIndex {
    fn name(&self) -> &'static str {
        "ObliviousIndex"
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        self.query_window(query.k, &query.window.unwrap_or(self.horizon), query.tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{base::TemporalObject, error::DurableTopKError};

    fn dataset() -> Dataset {
        // At every timestamp, object i has score 10 - i, except that object
        // 3 jumps to the top at t = 4
        let objects = (0..4)
            .map(|id| {
                let series = (1..=4).map(move |t| {
                    let score = if id == 3 && t == 4 { 20. } else { 10. - id as f64 };
                    (t, score)
                });
                TemporalObject::with_series(id, series).unwrap()
            })
            .collect();
        Dataset::new(objects).unwrap()
    }

    #[test]
    fn test_nearest() {
        let index = ObliviousIndex::new(&dataset(), &[1, 3], 4).unwrap();
        assert_eq!(index.nearest_indexed_k(1), 1);
        // Ties go to the first indexed k
        assert_eq!(index.nearest_indexed_k(2), 1);
        assert_eq!(index.nearest_indexed_k(5), 3);

        // k = 2 answered with k = 1
        assert_eq!(index.query(2, 1, 4, 0.7).unwrap(), ResultSet::from([0]));
        assert_eq!(index.query(2, 4, 4, 1.).unwrap(), ResultSet::from([3]));
        // k = 4 answered with k = 3
        assert_eq!(index.query(4, 1, 3, 1.).unwrap(), ResultSet::from([0, 1, 2]));
        assert_eq!(index.query(4, 1, 4, 0.8).unwrap(), ResultSet::from([0, 1]));
    }

    #[test]
    fn test_horizon() {
        let index = ObliviousIndex::new(&dataset(), &[1], 10).unwrap();
        assert!(index.query(1, 5, 10, 0.).unwrap().is_empty());
        assert!(matches!(
            index.query(1, 5, 11, 0.),
            Err(DurableTopKError::WindowOutOfRange { .. })
        ));

        // Full timeline by default: object 0 leads 3 of 10 timestamps
        let result = DurableTopKIndex::query(&index, &DurableQuery::new(1, 0.3)).unwrap();
        assert_eq!(result, ResultSet::from([0]));
    }
}
