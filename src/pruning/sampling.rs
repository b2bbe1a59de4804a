//! Sampling engine
//!
//! Estimates durability by drawing timestamps uniformly (with replacement)
//! from the window and counting top-k appearances among the samples. The
//! estimator variance decreases as 1 / sample size.

use std::collections::HashMap;

use derivative::Derivative;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tally_top_k;
use crate::{
    base::{Count, Dataset, ObjectId, Timestamp},
    error::{DurableTopKError, Result},
    index::{
        check_fixed_k, check_k, check_tau, resolve_window, select_durable, DurableQuery,
        DurableTopKIndex, ResultSet, Window,
    },
    snapshot::TimeIndex,
};

#[derive(Derivative, Serialize, Deserialize, Clone, Debug)]
#[derivative(Default)]
pub struct SamplingOptions {
    /// Number of timestamps drawn per query
    #[derivative(Default(value = "20"))]
    pub sample_size: usize,

    /// When set, each query draws its samples from a generator seeded
    /// with this value (results are then reproducible)
    pub seed: Option<u64>,
}

#[derive(Serialize, Deserialize)]
pub struct SamplingIndex {
    k: usize,
    options: SamplingOptions,
    index: TimeIndex,
}

impl SamplingIndex {
    pub fn new(dataset: &Dataset, k: usize, options: SamplingOptions) -> Result<Self> {
        check_k(k)?;
        if options.sample_size == 0 {
            return Err(DurableTopKError::InvalidSampleSize);
        }
        Ok(Self {
            k,
            options,
            index: TimeIndex::new(dataset),
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Samples with the configured seed (or entropy if none)
    pub fn query(&self, start: Timestamp, end: Timestamp, tau: f64) -> Result<ResultSet> {
        let mut rng = self.rng();
        self.query_with_rng(start, end, tau, &mut rng)
    }

    /// Samples using the given random generator; [start, end] must lie
    /// within [1, last observed timestamp]
    pub fn query_with_rng<R: Rng + ?Sized>(
        &self,
        start: Timestamp,
        end: Timestamp,
        tau: f64,
        rng: &mut R,
    ) -> Result<ResultSet> {
        check_tau(tau)?;
        self.answer(Some(Window::new(start, end)?), tau, rng)
    }

    fn answer<R: Rng + ?Sized>(
        &self,
        window: Option<Window>,
        tau: f64,
        rng: &mut R,
    ) -> Result<ResultSet> {
        let horizon = Window::observed(self.index.last_timestamp());
        Ok(match resolve_window(window, horizon)? {
            Some(window) => self.query_window(&window, tau, rng),
            None => ResultSet::new(),
        })
    }

    fn rng(&self) -> StdRng {
        match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn query_window<R: Rng + ?Sized>(&self, window: &Window, tau: f64, rng: &mut R) -> ResultSet {
        let mut counts: HashMap<ObjectId, Count> = HashMap::new();
        for _ in 0..self.options.sample_size {
            let t = rng.gen_range(window.start()..=window.end());
            tally_top_k(&mut counts, &self.index, t, self.k);
        }
        debug!(
            "Sampled {} timestamps in {}: {} objects seen in the top-{}",
            self.options.sample_size,
            window,
            counts.len(),
            self.k
        );
        select_durable(counts, self.options.sample_size as Count, tau)
    }
}

#[typetag::serde]
impl DurableTopKIndex for SamplingIndex {
    fn name(&self) -> &'static str {
        "Sampling"
    }

    fn supports_window(&self) -> bool {
        true
    }

    fn query(&self, query: &DurableQuery) -> Result<ResultSet> {
        query.validate()?;
        check_fixed_k(self.k, query.k)?;
        self.answer(query.window, query.tau, &mut self.rng())
    }
}
