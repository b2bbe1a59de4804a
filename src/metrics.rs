//! Accuracy and timing of engines against an exact baseline

use std::{fs::File, io::BufWriter, path::Path};

use log::info;
use serde::Serialize;

use crate::{
    error::{DurableTopKError, Result},
    index::ResultSet,
};

/// Name of the engine whose results are used as baseline
pub const BASELINE: &str = "PrefixSum";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Accuracy {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl Accuracy {
    /// Precision and recall of `result` with respect to `baseline`
    pub fn compute(result: &ResultSet, baseline: &ResultSet) -> Self {
        let common = result.intersection(baseline).count() as f64;

        let precision = if result.is_empty() || baseline.is_empty() {
            0.
        } else {
            common / result.len() as f64
        };
        let recall = if baseline.is_empty() {
            0.
        } else {
            common / baseline.len() as f64
        };
        let f1 = if precision + recall > 0. {
            2. * precision * recall / (precision + recall)
        } else {
            0.
        };

        Self {
            precision,
            recall,
            f1,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct RunRecord {
    pub engine: String,
    pub k: usize,
    pub result_count: usize,
    pub build_ms: f64,
    pub query_ms: f64,
    #[serde(flatten)]
    pub accuracy: Accuracy,
}

/// Collects run records; the first baseline run of each k is the reference
/// for the records logged after it
#[derive(Default)]
pub struct ResultsLog {
    records: Vec<RunRecord>,
    baselines: Vec<(usize, ResultSet)>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(
        &mut self,
        engine: &str,
        k: usize,
        result: &ResultSet,
        build_ms: f64,
        query_ms: f64,
    ) -> &RunRecord {
        if engine == BASELINE && self.baseline(k).is_none() {
            self.baselines.push((k, result.clone()));
        }

        let accuracy = match self.baseline(k) {
            Some(baseline) => Accuracy::compute(result, baseline),
            None => Accuracy::default(),
        };

        info!(
            "{} (k={}): {} objects, build {:.2} ms, query {:.2} ms, precision {:.2}, recall {:.2}",
            engine,
            k,
            result.len(),
            build_ms,
            query_ms,
            accuracy.precision,
            accuracy.recall
        );

        self.records.push(RunRecord {
            engine: engine.to_string(),
            k,
            result_count: result.len(),
            build_ms,
            query_ms,
            accuracy,
        });
        &self.records[self.records.len() - 1]
    }

    fn baseline(&self, k: usize) -> Option<&ResultSet> {
        self.baselines
            .iter()
            .find(|(baseline_k, _)| *baseline_k == k)
            .map(|(_, result)| result)
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Writes the records as a JSON array
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &self.records)
            .map_err(|e| DurableTopKError::Serialization(e.to_string()))?;
        info!("Exported {} records to {}", self.records.len(), path.display());
        Ok(())
    }
}
