//! Multi-k approximation engines
//!
//! These engines compute exact statistics for a small set of "indexed" k
//! values over the full timeline [1, total_time], and approximate any other
//! query k without rebuilding:
//!
//! - [`oblivious`]: per-timestamp top-k lists, nearest indexed k, any window
//! - [`column`]: full-timeline counts, nearest indexed k, no window
//! - [`cellwise`]: full-timeline durability matrix, and a per-object choice
//!   of the indexed k (column) that best approximates each query k

pub mod cellwise;
pub mod column;
pub mod oblivious;

use std::collections::HashSet;

use crate::{
    base::{Dataset, Timestamp},
    error::{DurableTopKError, Result},
};

pub use cellwise::{CellWiseIndex, CellWiseOptions, IdLayout};
pub use column::ColumnIndex;
pub use oblivious::ObliviousIndex;

/// Indexed k values must be a non-empty set of positive integers
pub(crate) fn check_indexed_ks(indexed_ks: &[usize]) -> Result<()> {
    if indexed_ks.is_empty() {
        return Err(DurableTopKError::EmptyIndexedKs);
    }
    let mut seen = HashSet::with_capacity(indexed_ks.len());
    for &k in indexed_ks {
        if k == 0 {
            return Err(DurableTopKError::InvalidK);
        }
        if !seen.insert(k) {
            return Err(DurableTopKError::DuplicateIndexedK(k));
        }
    }
    Ok(())
}

/// Every observed timestamp must lie in [1, total_time]
pub(crate) fn check_horizon(dataset: &Dataset, total_time: Timestamp) -> Result<()> {
    if total_time == 0 {
        return Err(DurableTopKError::InvalidTotalTime);
    }
    if let Some(t) = dataset.max_timestamp().filter(|&t| t > total_time) {
        return Err(DurableTopKError::TimestampOutOfHorizon { t, total_time });
    }
    if let Some(t) = dataset.min_timestamp().filter(|&t| t == 0) {
        return Err(DurableTopKError::TimestampOutOfHorizon { t, total_time });
    }
    Ok(())
}

/// Position of the indexed k closest to `k`; the first one wins ties, and
/// it may be larger than `k`
pub(crate) fn nearest_k(indexed_ks: &[usize], k: usize) -> usize {
    let mut best = 0;
    let mut min_diff = usize::MAX;
    for (ix, &indexed_k) in indexed_ks.iter().enumerate() {
        let diff = k.abs_diff(indexed_k);
        if diff < min_diff {
            min_diff = diff;
            best = ix;
        }
    }
    best
}
