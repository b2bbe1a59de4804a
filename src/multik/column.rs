//! Column index
//!
//! Stores one full-timeline top-k count per (object, indexed k). Queries
//! pick the nearest indexed k and always measure durability over the whole
//! timeline, with `total_time` as denominator: there is no window.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{check_horizon, check_indexed_ks, nearest_k};
use crate::{
    base::{Count, Dataset, Len, ObjectId, Timestamp},
    error::{DurableTopKError, Result},
    index::{check_k, check_tau, select_durable, DurableQuery, DurableTopKIndex, ResultSet},
    snapshot::RankedTimeline,
};

#[derive(Serialize, Deserialize)]
pub struct ColumnIndex {
    indexed_ks: Vec<usize>,
    total_time: Timestamp,

    /// Number of timestamps in the top-k, for each indexed k (same order as
    /// `indexed_ks`)
    durability: HashMap<ObjectId, Vec<Count>>,
}

impl ColumnIndex {
    pub fn new(dataset: &Dataset, indexed_ks: &[usize], total_time: Timestamp) -> Result<Self> {
        check_indexed_ks(indexed_ks)?;
        check_horizon(dataset, total_time)?;

        let timeline = RankedTimeline::new(dataset);
        let mut durability: HashMap<ObjectId, Vec<Count>> = HashMap::new();
        for (_, snapshot) in timeline.iter() {
            for (column, &k) in indexed_ks.iter().enumerate() {
                for object in &snapshot[..k.min(snapshot.len())] {
                    durability
                        .entry(object.id)
                        .or_insert_with(|| vec![0; indexed_ks.len()])[column] += 1;
                }
            }
        }

        debug!(
            "Column index over {} timestamps for k in {:?}: {} objects",
            timeline.len(),
            indexed_ks,
            durability.len()
        );

        Ok(Self {
            indexed_ks: indexed_ks.to_vec(),
            total_time,
            durability,
        })
    }

    pub fn indexed_ks(&self) -> &[usize] {
        &self.indexed_ks
    }

    pub fn total_time(&self) -> Timestamp {
        self.total_time
    }

    /// The indexed k used to answer queries for `k`
    pub fn nearest_indexed_k(&self, k: usize) -> usize {
        self.indexed_ks[nearest_k(&self.indexed_ks, k)]
    }

    /// Full-timeline top-k count of an object for the indexed k at `column`
    pub fn durability(&self, id: ObjectId, column: usize) -> Option<Count> {
        self.durability
            .get(&id)
            .and_then(|counts| counts.get(column))
            .copied()
    }

    /// Objects in the top-k for at least a fraction `tau` of [1, total_time]
    pub fn query(&self, k: usize, tau: f64) -> Result<ResultSet> {
        check_k(k)?;
        check_tau(tau)?;

        let column = nearest_k(&self.indexed_ks, k);
        Ok(select_durable(
            self.durability
                .iter()
                .map(|(&id, counts)| (id, counts[column])),
            self.total_time,
            tau,
        ))
    }
}

#[typetag::serde]
impl DurableTopKIndex for ColumnIndex {
    fn name(&self) -> &'static str {
        "ColumnIndex"
    }

    fn supports_window(&self) -> bool {
        false
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        if query.window.is_some() {
            return Err(DurableTopKError::WindowNotSupported(self.name()));
        }
        ColumnIndex::query(self, query.k, query.tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{base::TemporalObject, index::Window};

    #[test]
    fn test_query() {
        // Ranking 0 > 1 > 2 at t = 1..=3, and 2 > 1 > 0 at t = 4
        let objects = (0..3)
            .map(|id| {
                let series = (1..=4).map(move |t| {
                    let score = if t == 4 { id as f64 } else { -(id as f64) };
                    (t, score)
                });
                TemporalObject::with_series(id, series).unwrap()
            })
            .collect();
        let dataset = Dataset::new(objects).unwrap();
        let index = ColumnIndex::new(&dataset, &[2, 1], 4).unwrap();

        assert_eq!(index.durability(0, 0), Some(3));
        assert_eq!(index.durability(0, 1), Some(3));
        assert_eq!(index.durability(2, 0), Some(1));
        assert_eq!(index.durability(1, 1), Some(0));
        assert_eq!(index.durability(7, 0), None);

        assert_eq!(index.query(1, 0.75).unwrap(), ResultSet::from([0]));
        assert_eq!(index.query(1, 0.25).unwrap(), ResultSet::from([0, 2]));
        assert_eq!(index.query(2, 1.).unwrap(), ResultSet::from([1]));
        // k = 3 uses k = 2 (nearest)
        assert_eq!(index.query(3, 0.2).unwrap(), ResultSet::from([0, 1, 2]));

        // A larger horizon lowers every durability
        let index = ColumnIndex::new(&dataset, &[1], 8).unwrap();
        assert_eq!(index.query(1, 0.375).unwrap(), ResultSet::from([0]));
        assert!(index.query(1, 0.5).unwrap().is_empty());

        let windowed = DurableQuery::new(1, 0.5).with_window(Window::new(1, 8).unwrap());
        assert!(matches!(
            DurableTopKIndex::query(&index, &windowed),
            Err(DurableTopKError::WindowNotSupported(_))
        ));
    }
}
