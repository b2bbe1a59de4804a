//! Common interface of durable top-k indices

use std::{
    collections::BTreeSet,
    fmt,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    base::{Count, ObjectId, Timestamp},
    error::{DurableTopKError, Result},
};

pub const INDEX_CBOR: &str = "index.cbor";

/// Object IDs answering a durable top-k query (the order carries no meaning)
pub type ResultSet = BTreeSet<ObjectId>;

/// An inclusive range of timestamps [start, end], with 1 <= start <= end
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    start: Timestamp,
    end: Timestamp,
}

impl Window {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self> {
        if start == 0 || start > end {
            return Err(DurableTopKError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    #[inline]
    pub fn start(&self) -> Timestamp {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Number of timestamps in the window (never 0)
    #[inline]
    pub fn len(&self) -> Count {
        self.end - self.start + 1
    }

    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        t >= self.start && t <= self.end
    }

    /// Fails if this window is not included in `horizon`
    pub fn check_within(&self, horizon: &Window) -> Result<()> {
        if self.start < horizon.start || self.end > horizon.end {
            return Err(DurableTopKError::WindowOutOfRange {
                start: self.start,
                end: self.end,
                min: horizon.start,
                max: horizon.end,
            });
        }
        Ok(())
    }

    /// [1, last] for an index whose last observed timestamp is `last`
    pub(crate) fn observed(last: Option<Timestamp>) -> Option<Self> {
        last.and_then(|last| Window::new(1, last).ok())
    }

    fn validate(&self) -> Result<()> {
        Window::new(self.start, self.end).map(|_| ())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A durable top-k query: objects ranked within the top-`k` for at least
/// a fraction `tau` of the window
#[derive(Clone, Copy, Debug)]
pub struct DurableQuery {
    pub k: usize,
    pub tau: f64,
    /// When `None`, the full horizon of the index is used
    pub window: Option<Window>,
}

impl DurableQuery {
    pub fn new(k: usize, tau: f64) -> Self {
        Self {
            k,
            tau,
            window: None,
        }
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    /// Checks k, tau and the window (if any)
    pub fn validate(&self) -> Result<()> {
        check_k(self.k)?;
        check_tau(self.tau)?;
        if let Some(window) = &self.window {
            window.validate()?;
        }
        Ok(())
    }
}

pub fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(DurableTopKError::InvalidK);
    }
    Ok(())
}

pub fn check_tau(tau: f64) -> Result<()> {
    if !(0. ..=1.).contains(&tau) {
        return Err(DurableTopKError::InvalidTau(tau));
    }
    Ok(())
}

/// Fails when a fixed-k index is asked for another k
pub(crate) fn check_fixed_k(built: usize, requested: usize) -> Result<()> {
    check_k(requested)?;
    if built != requested {
        return Err(DurableTopKError::UnsupportedK { built, requested });
    }
    Ok(())
}

/// The window to measure for an index covering `horizon`: a requested
/// window must lie within the horizon, which is the default. `None` when
/// the index observed nothing.
pub(crate) fn resolve_window(
    window: Option<Window>,
    horizon: Option<Window>,
) -> Result<Option<Window>> {
    match (window, horizon) {
        (Some(window), Some(horizon)) => {
            window.check_within(&horizon)?;
            Ok(Some(window))
        }
        (None, horizon) => Ok(horizon),
        (Some(_), None) => Ok(None),
    }
}

/// Keeps the objects that were in the top-k at least once and whose
/// durability `count / denominator` reaches `tau`
pub(crate) fn select_durable<I>(counts: I, denominator: Count, tau: f64) -> ResultSet
where
    I: IntoIterator<Item = (ObjectId, Count)>,
{
    debug_assert!(denominator > 0);
    let denominator = denominator as f64;
    counts
        .into_iter()
        .filter(|&(_, count)| count > 0 && (count as f64) / denominator >= tau)
        .map(|(id, _)| id)
        .collect()
}

/// A durable top-k index, built once and queried many times
#[typetag::serde(tag = "type")]
pub trait DurableTopKIndex: Send + Sync {
    /// Name of the algorithm
    fn name(&self) -> &'static str;

    /// Whether arbitrary windows can be queried (otherwise, only the full
    /// timeline is)
    fn supports_window(&self) -> bool;

    /// Returns the objects that are durable for this query
    fn query(&self, query: &DurableQuery) -> Result<ResultSet>;
}

/// Saves a built index in the `path` folder
pub fn save_index(index: &dyn DurableTopKIndex, path: &Path) -> Result<()> {
    let info_file = File::options()
        .write(true)
        .truncate(true)
        .create(true)
        .open(path.join(INDEX_CBOR))?;

    ciborium::ser::into_writer(index, BufWriter::new(info_file))
        .map_err(|e| DurableTopKError::Serialization(e.to_string()))
}

/// Loads an index saved with [`save_index`]
pub fn load_index(path: &Path) -> Result<Box<dyn DurableTopKIndex>> {
    let info_file = File::options().read(true).open(path.join(INDEX_CBOR))?;

    ciborium::de::from_reader(BufReader::new(info_file))
        .map_err(|e| DurableTopKError::Serialization(e.to_string()))
}
