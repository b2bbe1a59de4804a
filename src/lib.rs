//! Durable top-k queries over temporal score data.
//!
//! Given objects carrying sparse time series of scores, a durable top-k
//! query returns the objects ranked within the top-k for at least a fraction
//! τ of a time window. Seven engines answer it with different trade-offs:
//!
//! - exact, for a k fixed at construction: [`exact::PrefixSumIndex`],
//!   [`exact::IntervalIndex`]
//! - ranking at query time, for a fixed k: [`pruning::GeometricIndex`]
//!   (exact) and [`pruning::SamplingIndex`] (estimated)
//! - approximations for any k from a few indexed ones:
//!   [`multik::ObliviousIndex`], [`multik::ColumnIndex`] and
//!   [`multik::CellWiseIndex`]
//!
//! All of them implement [`index::DurableTopKIndex`].

pub mod base;
pub mod error;
pub mod exact;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod multik;
pub mod pruning;
pub mod runner;
pub mod snapshot;

pub use base::{Dataset, ObjectId, Score, TemporalObject, Timestamp};
pub use error::{DurableTopKError, Result};
pub use index::{DurableQuery, DurableTopKIndex, ResultSet, Window};
