//! Interval index
//!
//! Stores, for each object, the timestamps where it was ranked within the
//! top-k over the whole timeline. A query filters each list to the window,
//! so its cost grows with k relative to the number of objects.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    base::{Count, Dataset, Len, ObjectId, Timestamp},
    error::Result,
    index::{
        check_fixed_k, check_k, check_tau, resolve_window, select_durable, DurableQuery,
        DurableTopKIndex, ResultSet, Window,
    },
    snapshot::RankedTimeline,
};

#[derive(Serialize, Deserialize)]
pub struct IntervalIndex {
    k: usize,

    /// [1, last observed timestamp]
    horizon: Option<Window>,

    /// Increasing timestamps where each object is in the top-k
    top_k_times: HashMap<ObjectId, Vec<Timestamp>>,
}

impl IntervalIndex {
    pub fn new(dataset: &Dataset, k: usize) -> Result<Self> {
        check_k(k)?;

        let timeline = RankedTimeline::new(dataset);
        let mut top_k_times: HashMap<ObjectId, Vec<Timestamp>> = HashMap::new();
        for (t, snapshot) in timeline.iter() {
            for object in &snapshot[..k.min(snapshot.len())] {
                top_k_times.entry(object.id).or_default().push(t);
            }
        }

        debug!(
            "Interval index for k={}: {} timestamps, {} objects in the top-k",
            k,
            timeline.len(),
            top_k_times.len()
        );

        Ok(Self {
            k,
            horizon: Window::observed(dataset.max_timestamp()),
            top_k_times,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Objects in the top-k for at least a fraction `tau` of [start, end],
    /// which must lie within [1, last observed timestamp]
    pub fn query(&self, start: Timestamp, end: Timestamp, tau: f64) -> Result<ResultSet> {
        check_tau(tau)?;
        self.answer(Some(Window::new(start, end)?), tau)
    }

    fn answer(&self, window: Option<Window>, tau: f64) -> Result<ResultSet> {
        Ok(match resolve_window(window, self.horizon)? {
            Some(window) => self.query_window(&window, tau),
            None => ResultSet::new(),
        })
    }

    fn query_window(&self, window: &Window, tau: f64) -> ResultSet {
        select_durable(
            self.top_k_times.iter().map(|(&id, times)| {
                let count = times.iter().filter(|&&t| window.contains(t)).count();
                (id, count as Count)
            }),
            window.len(),
            tau,
        )
    }
}

#[typetag::serde]
impl DurableTopKIndex for IntervalIndex {
    fn name(&self) -> &'static str {
        "IntervalIndex"
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
    fn test_windows() {
        let dataset = Dataset::new(vec![
            TemporalObject::with_series(4, [(1, 3.), (2, 3.), (3, 0.), (6, 1.)]).unwrap(),
            TemporalObject::with_series(8, [(1, 1.), (2, 4.), (3, 1.)]).unwrap(),
        ])
        .unwrap();
        let index = IntervalIndex::new(&dataset, 1).unwrap();

        // Top-1: t1 -> 4, t2 -> 8, t3 -> 8, t6 -> 4
        assert_eq!(index.query(1, 3, 0.6).unwrap(), ResultSet::from([8]));
        assert_eq!(index.query(1, 6, 0.3).unwrap(), ResultSet::from([4, 8]));
        assert_eq!(index.query(5, 6, 0.5).unwrap(), ResultSet::from([4]));
        assert!(index.query(4, 5, 0.).unwrap().is_empty());
        assert!(matches!(
            index.query(6, 9, 0.25),
            Err(DurableTopKError::WindowOutOfRange { max: 6, .. })
        ));

        // Default window is [1, 6]
        let result = DurableTopKIndex::query(&index, &DurableQuery::new(1, 0.3)).unwrap();
        assert_eq!(result, ResultSet::from([4, 8]));
    }
}
