//! Exact engines for a k fixed at construction
//!
//! - [`prefix_sum`]: running top-k counts over a fixed window, O(1) per object at query time
//! - [`interval`]: the list of top-k timestamps of each object, over the whole timeline

pub mod interval;
pub mod prefix_sum;

pub use interval::IntervalIndex;
pub use prefix_sum::PrefixSumIndex;
