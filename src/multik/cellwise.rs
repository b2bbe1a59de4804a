//! Cell-wise index
//!
//! A two-phase greedy approximation:
//!
//! 1. the durability matrix counts, for every object (row) and indexed k
//!    (column, in increasing k order), the timestamps of [1, total_time]
//!    where the object was ranked within the top-k;
//! 2. the approximation map chooses, for every object and query k in
//!    `1..=max_query_k`, the column whose durability ratio is closest to
//!    `query_k / max_query_k`, among the columns whose indexed k does not
//!    exceed the query k.
//!
//! Queries read one cell per object. Above `max_query_k`, the column is
//! chosen at query time with a target of 1 among the indexed k up to the
//! query k. When no indexed k is small enough for a query k, there is no
//! column for it and the object is never part of the answer.

use std::collections::HashMap;

use derivative::Derivative;
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{check_horizon, check_indexed_ks};
use crate::{
    base::{Count, Dataset, ObjectId, Timestamp},
    error::{DurableTopKError, Result},
    index::{check_k, check_tau, select_durable, DurableQuery, DurableTopKIndex, ResultSet},
    snapshot::RankedTimeline,
};

/// How object IDs are mapped to matrix rows
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdLayout {
    /// Row = object ID (`max_id + 1` rows, wasteful for sparse ID spaces)
    Dense,
    /// One row per object, looked up through a hash map
    Hashed,
}

#[derive(Derivative, Serialize, Deserialize, Clone, Debug)]
#[derivative(Default)]
pub struct CellWiseOptions {
    /// Largest query k of the approximation map; larger k aim at a ratio of 1
    #[derivative(Default(value = "50"))]
    pub max_query_k: usize,

    #[derivative(Default(value = "IdLayout::Dense"))]
    pub layout: IdLayout,
}

#[derive(Serialize, Deserialize)]
enum Rows {
    Dense { count: usize },
    Hashed {
        ids: Vec<ObjectId>,
        rows: HashMap<ObjectId, usize>,
    },
}

impl Rows {
    fn new(dataset: &Dataset, layout: IdLayout) -> Self {
        match layout {
            IdLayout::Dense => Rows::Dense {
                count: dataset.max_id().map_or(0, |m| m as usize + 1),
            },
            IdLayout::Hashed => {
                let ids: Vec<ObjectId> = dataset.iter().map(|o| o.id()).collect();
                let rows = ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();
                Rows::Hashed { ids, rows }
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Rows::Dense { count } => *count,
            Rows::Hashed { ids, .. } => ids.len(),
        }
    }

    fn row(&self, id: ObjectId) -> Option<usize> {
        match self {
            Rows::Dense { count } => Some(id as usize).filter(|&row| row < *count),
            Rows::Hashed { rows, .. } => rows.get(&id).copied(),
        }
    }

    fn id(&self, row: usize) -> ObjectId {
        match self {
            Rows::Dense { .. } => row as ObjectId,
            Rows::Hashed { ids, .. } => ids[row],
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CellWiseIndex {
    options: CellWiseOptions,
    total_time: Timestamp,

    /// Indexed k values, increasing
    indexed_ks: Vec<usize>,

    rows: Rows,

    /// [row, column] = number of timestamps in the top-indexed_ks[column]
    durability: Array2<Count>,

    /// [row, query_k] = best column for query_k (`NO_COLUMN` if no indexed
    /// k is at most query_k); query_k = 0 is unused
    approximation: Array2<u32>,
}

/// Approximation map cell with no eligible column
const NO_COLUMN: u32 = u32::MAX;

/// Among the columns whose indexed k is at most `max_k`, the one whose
/// ratio `count / total_time` is the closest to `target` (first one on ties)
fn best_column<I>(
    counts: I,
    indexed_ks: &[usize],
    total_time: Timestamp,
    max_k: usize,
    target: f64,
) -> Option<usize>
where
    I: IntoIterator<Item = Count>,
{
    let total_time = total_time as f64;
    let mut min_error = f64::MAX;
    let mut best = None;
    // Indexed k are increasing: stop at the first one too large
    for (column, count) in counts
        .into_iter()
        .zip(indexed_ks)
        .enumerate()
        .take_while(|&(_, (_, &k))| k <= max_k)
        .map(|(column, (count, _))| (column, count))
    {
        let error = (count as f64 / total_time - target).abs();
        if error < min_error {
            min_error = error;
            best = Some(column);
        }
    }
    best
}

impl CellWiseIndex {
    pub fn new(
        dataset: &Dataset,
        indexed_ks: &[usize],
        total_time: Timestamp,
        options: CellWiseOptions,
    ) -> Result<Self> {
        check_indexed_ks(indexed_ks)?;
        check_horizon(dataset, total_time)?;
        check_k(options.max_query_k)?;

        let mut indexed_ks = indexed_ks.to_vec();
        indexed_ks.sort_unstable();

        let rows = Rows::new(dataset, options.layout);
        let durability = Self::durability_matrix(dataset, &rows, &indexed_ks);
        let approximation =
            Self::approximation_map(&durability, &indexed_ks, total_time, options.max_query_k);

        debug!(
            "Cell-wise index: {} rows, k in {:?}, total time {}",
            rows.len(),
            indexed_ks,
            total_time
        );

        Ok(Self {
            options,
            total_time,
            indexed_ks,
            rows,
            durability,
            approximation,
        })
    }

    /// Phase 1: counts per (object, indexed k) over the full timeline
    fn durability_matrix(dataset: &Dataset, rows: &Rows, indexed_ks: &[usize]) -> Array2<Count> {
        let mut durability = Array2::<Count>::zeros((rows.len(), indexed_ks.len()));
        let timeline = RankedTimeline::new(dataset);

        for (_, snapshot) in timeline.iter() {
            for (column, &k) in indexed_ks.iter().enumerate() {
                for object in &snapshot[..k.min(snapshot.len())] {
                    if let Some(row) = rows.row(object.id) {
                        durability[[row, column]] += 1;
                    }
                }
            }
        }
        durability
    }

    /// Phase 2: for each object and query k, the column minimizing the
    /// distance between its durability ratio and query_k / max_query_k
    fn approximation_map(
        durability: &Array2<Count>,
        indexed_ks: &[usize],
        total_time: Timestamp,
        max_query_k: usize,
    ) -> Array2<u32> {
        let mut approximation =
            Array2::<u32>::from_elem((durability.nrows(), max_query_k + 1), NO_COLUMN);

        for (row, counts) in durability.outer_iter().enumerate() {
            for query_k in 1..=max_query_k {
                let target = query_k as f64 / max_query_k as f64;
                if let Some(column) =
                    best_column(counts.iter().copied(), indexed_ks, total_time, query_k, target)
                {
                    approximation[[row, query_k]] = column as u32;
                }
            }
        }
        approximation
    }

    /// Column used for a row and query k; above `max_query_k`, the target
    /// stays at 1 but every indexed k up to k is eligible
    fn column(&self, row: usize, k: usize) -> Option<usize> {
        if k > self.options.max_query_k {
            return best_column(
                self.durability.row(row).iter().copied(),
                &self.indexed_ks,
                self.total_time,
                k,
                1.,
            );
        }
        match self.approximation[[row, k]] {
            NO_COLUMN => None,
            column => Some(column as usize),
        }
    }

    pub fn options(&self) -> &CellWiseOptions {
        &self.options
    }

    pub fn total_time(&self) -> Timestamp {
        self.total_time
    }

    /// Indexed k values (increasing; columns follow this order)
    pub fn indexed_ks(&self) -> &[usize] {
        &self.indexed_ks
    }

    /// Top-k count of the object over the full timeline for the indexed k
    /// at `column`
    pub fn durability(&self, id: ObjectId, column: usize) -> Option<Count> {
        let row = self.rows.row(id)?;
        self.durability.get((row, column)).copied()
    }

    /// The column chosen for the object and query k, or `None` when no
    /// indexed k is small enough
    pub fn approximation(&self, id: ObjectId, k: usize) -> Option<usize> {
        let row = self.rows.row(id)?;
        if k == 0 {
            return None;
        }
        self.column(row, k)
    }

    /// Objects in the top-k for at least a fraction `tau` of [1, total_time]
    /// (approximated through the chosen columns)
    pub fn query(&self, k: usize, tau: f64) -> Result<ResultSet> {
        check_k(k)?;
        check_tau(tau)?;

        let counts = (0..self.rows.len()).filter_map(|row| {
            let column = self.column(row, k)?;
            Some((self.rows.id(row), self.durability[[row, column]]))
        });
        Ok(select_durable(counts, self.total_time, tau))
    }
}

#[typetag::serde]
impl DurableTopKIndex for CellWiseIndex {
    fn name(&self) -> &'static str {
        "CellWiseIndex"
    }

    fn supports_window(&self) -> bool {
        false
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        if query.window.is_some() {
            return Err(DurableTopKError::WindowNotSupported(self.name()));
        }
        CellWiseIndex::query(self, query.k, query.tau)
    }
}
