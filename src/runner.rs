//! Runs every engine on a dataset and records accuracy and timings

use std::time::Instant;

use derivative::Derivative;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::{
    base::{Dataset, Timestamp},
    error::Result,
    exact::{IntervalIndex, PrefixSumIndex},
    index::{DurableQuery, DurableTopKIndex, ResultSet, Window},
    metrics::ResultsLog,
    multik::{CellWiseIndex, CellWiseOptions, ColumnIndex, ObliviousIndex},
    pruning::{GeometricIndex, SamplingIndex, SamplingOptions},
};

const DEFAULT_PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

fn pb_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(DEFAULT_PROGRESS_TEMPLATE)
        .progress_chars("=> ")
}

#[derive(Derivative, Clone, Debug)]
#[derivative(Default)]
pub struct ExperimentConfig {
    /// The k values to query (fixed-k engines are rebuilt for each)
    #[derivative(Default(value = "vec![10]"))]
    pub query_ks: Vec<usize>,

    #[derivative(Default(value = "0.05"))]
    pub tau: f64,

    /// Query window, the end being clamped to the dataset total time
    #[derivative(Default(value = "1"))]
    pub start: Timestamp,
    #[derivative(Default(value = "1000"))]
    pub end: Timestamp,

    /// Indexed k values of the multi-k engines
    #[derivative(Default(value = "vec![5, 10, 15, 20]"))]
    pub indexed_ks: Vec<usize>,

    pub sampling: SamplingOptions,
    pub cellwise: CellWiseOptions,
}

impl ExperimentConfig {
    /// The query window for a dataset
    pub fn window(&self, dataset: &Dataset) -> Result<Window> {
        Window::new(self.start, self.end.min(dataset.total_time()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    PrefixSum,
    IntervalIndex,
    Geometric,
    Sampling,
    ObliviousIndex,
    ColumnIndex,
    CellWiseIndex,
}

impl EngineKind {
    /// All engines, the exact baseline first
    pub const ALL: [EngineKind; 7] = [
        EngineKind::PrefixSum,
        EngineKind::IntervalIndex,
        EngineKind::Geometric,
        EngineKind::Sampling,
        EngineKind::ObliviousIndex,
        EngineKind::ColumnIndex,
        EngineKind::CellWiseIndex,
    ];

    /// Multi-k engines answer any k from the indexed ones, and are built
    /// once for all query k
    pub fn is_multi_k(&self) -> bool {
        matches!(
            self,
            EngineKind::ObliviousIndex | EngineKind::ColumnIndex | EngineKind::CellWiseIndex
        )
    }

    /// Builds the engine to answer queries for `k` (ignored by multi-k
    /// engines)
    pub fn build(
        &self,
        dataset: &Dataset,
        k: usize,
        config: &ExperimentConfig,
    ) -> Result<Box<dyn DurableTopKIndex>> {
        let total_time = dataset.total_time();
        let index: Box<dyn DurableTopKIndex> = match self {
            EngineKind::PrefixSum => {
                Box::new(PrefixSumIndex::new(dataset, k, config.window(dataset)?)?)
            }
            EngineKind::IntervalIndex => Box::new(IntervalIndex::new(dataset, k)?),
            EngineKind::Geometric => Box::new(GeometricIndex::new(dataset, k)?),
            EngineKind::Sampling => {
                Box::new(SamplingIndex::new(dataset, k, config.sampling.clone())?)
            }
            EngineKind::ObliviousIndex => Box::new(ObliviousIndex::new(
                dataset,
                &config.indexed_ks,
                total_time,
            )?),
            EngineKind::ColumnIndex => {
                Box::new(ColumnIndex::new(dataset, &config.indexed_ks, total_time)?)
            }
            EngineKind::CellWiseIndex => Box::new(CellWiseIndex::new(
                dataset,
                &config.indexed_ks,
                total_time,
                config.cellwise.clone(),
            )?),
        };
        Ok(index)
    }
}

/// Builds all the engines for `k`
pub fn build_engines(
    dataset: &Dataset,
    k: usize,
    config: &ExperimentConfig,
) -> Result<Vec<(EngineKind, Box<dyn DurableTopKIndex>)>> {
    EngineKind::ALL
        .iter()
        .map(|kind| Ok((*kind, kind.build(dataset, k, config)?)))
        .collect()
}

/// The configured query for an engine: engines that cannot restrict the
/// window answer over the full timeline
pub fn query_for(
    index: &dyn DurableTopKIndex,
    k: usize,
    config: &ExperimentConfig,
    window: Window,
) -> DurableQuery {
    let query = DurableQuery::new(k, config.tau);
    if index.supports_window() {
        query.with_window(window)
    } else {
        query
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.
}

/// Builds and queries every engine for each configured k, logging the
/// results (with their accuracy against the prefix-sum baseline). Fixed-k
/// engines are built for each k, multi-k engines once.
pub fn run_experiment(
    dataset: &Dataset,
    config: &ExperimentConfig,
    log: &mut ResultsLog,
) -> Result<Vec<(EngineKind, usize, ResultSet)>> {
    let window = config.window(dataset)?;
    info!(
        "Running {} engines: window={}, k in {:?}, tau={}",
        EngineKind::ALL.len(),
        window,
        config.query_ks,
        config.tau
    );

    let progress = ProgressBar::new((config.query_ks.len() * EngineKind::ALL.len()) as u64);
    progress.set_style(pb_style());

    // Any k will do for multi-k engines
    let mut multi_k: Vec<(EngineKind, Box<dyn DurableTopKIndex>, f64)> = Vec::new();
    for kind in EngineKind::ALL.iter().filter(|kind| kind.is_multi_k()) {
        progress.set_message(&format!("Building {:?}", kind));
        let start = Instant::now();
        let index = kind.build(dataset, 1, config)?;
        multi_k.push((*kind, index, elapsed_ms(start)));
    }

    let mut results = Vec::new();
    for &k in config.query_ks.iter() {
        for kind in EngineKind::ALL.iter() {
            progress.set_message(&format!("{:?} k={}", kind, k));

            let built;
            let (index, build_ms) = match multi_k.iter().find(|(other, _, _)| other == kind) {
                Some((_, index, build_ms)) => (&**index, *build_ms),
                None => {
                    let start = Instant::now();
                    built = kind.build(dataset, k, config)?;
                    (&*built, elapsed_ms(start))
                }
            };

            let start = Instant::now();
            let result = index.query(&query_for(index, k, config, window))?;
            let query_ms = elapsed_ms(start);

            log.log(index.name(), k, &result, build_ms, query_ms);
            results.push((*kind, k, result));
            progress.inc(1);
        }
    }
    progress.finish_and_clear();

    Ok(results)
}
