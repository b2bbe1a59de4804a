//! Geometric engine
//!
//! Nothing is precomputed beyond the timestamp index: each query ranks the
//! snapshots of its window (keeping only the k best objects of each) and
//! counts top-k appearances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::tally_top_k;
use crate::{
    base::{Count, Dataset, ObjectId, Timestamp},
    error::Result,
    index::{
        check_fixed_k, check_k, check_tau, resolve_window, select_durable, DurableQuery,
        DurableTopKIndex, ResultSet, Window,
    },
    snapshot::TimeIndex,
};

#[derive(Serialize, Deserialize)]
pub struct GeometricIndex {
    k: usize,
    index: TimeIndex,
}

impl GeometricIndex {
    pub fn new(dataset: &Dataset, k: usize) -> Result<Self> {
        check_k(k)?;
        Ok(Self {
            k,
            index: TimeIndex::new(dataset),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Fails if [start, end] exceeds [1, last observed timestamp]
    pub fn query(&self, start: Timestamp, end: Timestamp, tau: f64) -> Result<ResultSet> {
        check_tau(tau)?;
        self.answer(Some(Window::new(start, end)?), tau)
    }

    fn answer(&self, window: Option<Window>, tau: f64) -> Result<ResultSet> {
        let horizon = Window::observed(self.index.last_timestamp());
        Ok(match resolve_window(window, horizon)? {
            Some(window) => self.query_window(&window, tau),
            None => ResultSet::new(),
        })
    }

    fn query_window(&self, window: &Window, tau: f64) -> ResultSet {
        let mut counts: HashMap<ObjectId, Count> = HashMap::new();
        // Timestamps without any snapshot contribute nothing
        for (&t, _) in self.index.range(window.start(), window.end()) {
            tally_top_k(&mut counts, &self.index, t, self.k);
        }
        select_durable(counts, window.len(), tau)
    }
}

#[typetag::serde]
impl DurableTopKIndex for GeometricIndex {
    fn name(&self) -> &'static str {
        "Geometric"
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        check_fixed_k(self.k, query.k)?;
        self.answer(query.window, query.tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{base::TemporalObject, error::DurableTopKError};

    #[test]
    fn test_query() {
        let dataset = Dataset::new(vec![
            TemporalObject::with_series(1, [(1, 2.), (2, 2.), (3, 2.), (4, 2.)]).unwrap(),
            TemporalObject::with_series(2, [(1, 3.), (2, 1.), (3, 3.), (4, 1.)]).unwrap(),
            TemporalObject::with_series(3, [(2, 4.)]).unwrap(),
        ])
        .unwrap();
        let index = GeometricIndex::new(&dataset, 1).unwrap();

        // Top-1: t1 -> 2, t2 -> 3, t3 -> 2, t4 -> 1
        assert_eq!(index.query(1, 4, 0.5).unwrap(), ResultSet::from([2]));
        assert_eq!(index.query(1, 4, 0.25).unwrap(), ResultSet::from([1, 2, 3]));
        assert_eq!(index.query(4, 4, 1.).unwrap(), ResultSet::from([1]));
        assert!(matches!(
            index.query(4, 8, 0.2),
            Err(DurableTopKError::WindowOutOfRange { .. })
        ));

        assert!(matches!(
            DurableTopKIndex::query(&index, &DurableQuery::new(2, 0.5)),
            Err(DurableTopKError::UnsupportedK { built: 1, requested: 2 })
        ));
    }
}
