use std::collections::HashMap;

use durable_topk::{
    base::{Count, Dataset, ObjectId, Score},
    index::{ResultSet, Window},
};

/// Durable top-k by brute force: ranks all objects (absent ones score
/// -infinity and are never counted) at every timestamp of the window
pub fn durable_top_k(dataset: &Dataset, k: usize, window: &Window, tau: f64) -> ResultSet {
    let mut counts: HashMap<ObjectId, Count> = HashMap::new();
    for t in window.start()..=window.end() {
        let mut scores: Vec<(ObjectId, Score)> =
            dataset.iter().map(|o| (o.id(), o.value_at(t))).collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        for &(id, score) in scores.iter().take(k) {
            if score > Score::NEG_INFINITY {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count as f64 / window.len() as f64 >= tau)
        .map(|(id, _)| id)
        .collect()
}
