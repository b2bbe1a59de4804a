//! Errors raised when building or querying an index

use thiserror::Error;

use crate::base::{ObjectId, Timestamp};

#[derive(Error, Debug)]
pub enum DurableTopKError {
    #[error("k must be strictly positive")]
    InvalidK,

    #[error("durability threshold {0} is outside [0, 1]")]
    InvalidTau(f64),

    #[error("invalid window [{start}, {end}] (timestamps start at 1 and start <= end)")]
    InvalidWindow { start: Timestamp, end: Timestamp },

    #[error("window [{start}, {end}] is outside the indexed range [{min}, {max}]")]
    WindowOutOfRange {
        start: Timestamp,
        end: Timestamp,
        min: Timestamp,
        max: Timestamp,
    },

    #[error("the set of indexed k values is empty")]
    EmptyIndexedKs,

    #[error("indexed k {0} appears more than once")]
    DuplicateIndexedK(usize),

    #[error("total time must be strictly positive")]
    InvalidTotalTime,

    #[error("timestamp {t} is outside the horizon [1, {total_time}]")]
    TimestampOutOfHorizon { t: Timestamp, total_time: Timestamp },

    #[error("sample size must be strictly positive")]
    InvalidSampleSize,

    #[error("index was built for k={built}, cannot answer k={requested}")]
    UnsupportedK { built: usize, requested: usize },

    #[error("{0} only answers over the full timeline")]
    WindowNotSupported(&'static str),

    #[error("object {0} appears more than once")]
    DuplicateObject(ObjectId),

    #[error("object {0} has no score")]
    EmptySeries(ObjectId),

    #[error("object {id} has a NaN score at time {t}")]
    NaNScore { id: ObjectId, t: Timestamp },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DurableTopKError>;
