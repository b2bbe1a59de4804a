//! Per-timestamp snapshots and their rankings
//!
//! A snapshot is the list of objects present at one timestamp. Rankings
//! are always descending by score; equal scores keep the dataset order,
//! so that every engine agrees on who is in the top-k.

use std::{
    cmp::Ordering,
    collections::{btree_map, BTreeMap, BinaryHeap},
};

use serde::{Deserialize, Serialize};

use crate::base::{Dataset, Len, ObjectId, ScoredObject, Timestamp};

/// Sorts a snapshot by decreasing score (stable)
pub fn rank(snapshot: &mut [ScoredObject]) {
    snapshot.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Objects present at each timestamp, in dataset order
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct TimeIndex {
    snapshots: BTreeMap<Timestamp, Vec<ScoredObject>>,
}

impl TimeIndex {
    pub fn new(dataset: &Dataset) -> Self {
        Self::with_range(dataset, Timestamp::MIN, Timestamp::MAX)
    }

    /// Only keeps the timestamps within [start, end]
    pub fn with_range(dataset: &Dataset, start: Timestamp, end: Timestamp) -> Self {
        let mut snapshots: BTreeMap<Timestamp, Vec<ScoredObject>> = BTreeMap::new();
        for object in dataset {
            for (t, score) in object.series() {
                if t >= start && t <= end {
                    snapshots.entry(t).or_default().push(ScoredObject {
                        id: object.id(),
                        score,
                    });
                }
            }
        }
        Self { snapshots }
    }

    /// Returns the (unranked) snapshot at time t
    pub fn snapshot(&self, t: Timestamp) -> &[ScoredObject] {
        match self.snapshots.get(&t) {
            Some(snapshot) => snapshot,
            None => &[],
        }
    }

    /// Ranks the snapshot at time `t` and returns its top-k object IDs
    pub fn top_k(&self, t: Timestamp, k: usize) -> Vec<ObjectId> {
        let mut selector = TopKSelector::new(k);
        for object in self.snapshot(t) {
            selector.add(*object);
        }
        selector.into_sorted_vec().iter().map(|o| o.id).collect()
    }

    pub fn range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> btree_map::Range<'_, Timestamp, Vec<ScoredObject>> {
        self.snapshots.range(start..=end)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.snapshots.keys().copied()
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.snapshots.keys().next_back().copied()
    }

    /// Ranks every snapshot once
    pub fn ranked(self) -> RankedTimeline {
        let mut snapshots = self.snapshots;
        for snapshot in snapshots.values_mut() {
            rank(snapshot);
        }
        RankedTimeline { snapshots }
    }
}

impl Len for TimeIndex {
    /// Number of distinct timestamps
    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

/// Snapshots ranked by decreasing score
pub struct RankedTimeline {
    snapshots: BTreeMap<Timestamp, Vec<ScoredObject>>,
}

impl RankedTimeline {
    pub fn new(dataset: &Dataset) -> Self {
        TimeIndex::new(dataset).ranked()
    }

    /// The first min(k, |snapshot|) objects at time t
    pub fn top_k(&self, t: Timestamp, k: usize) -> &[ScoredObject] {
        match self.snapshots.get(&t) {
            Some(snapshot) => &snapshot[..k.min(snapshot.len())],
            None => &[],
        }
    }

    /// Iterates over (timestamp, ranked snapshot) in increasing time
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &[ScoredObject])> + '_ {
        self.snapshots.iter().map(|(&t, s)| (t, s.as_slice()))
    }
}

impl Len for RankedTimeline {
    fn len(&self) -> usize {
        self.snapshots.len()
    }
}

/// A snapshot entry together with its position in the snapshot
struct Candidate {
    object: ScoredObject,
    position: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// The "greatest" candidate is the worst ranked one: lowest score, and for
// equal scores, the one that comes last in the snapshot
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .object
            .score
            .total_cmp(&self.object.score)
            .then(self.position.cmp(&other.position))
    }
}

/// Bounded heap keeping the k best objects of a snapshot.
///
/// Objects must be added in snapshot order; the selection is then the same
/// as the first k entries of [`rank`].
pub struct TopKSelector {
    heap: BinaryHeap<Candidate>,
    top_k: usize,
    position: usize,
}

impl TopKSelector {
    pub fn new(top_k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(top_k),
            top_k,
            position: 0,
        }
    }

    /// Add a new candidate
    pub fn add(&mut self, object: ScoredObject) {
        let candidate = Candidate {
            object,
            position: self.position,
        };
        self.position += 1;

        if self.heap.len() < self.top_k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Returns the selected objects, best first
    pub fn into_sorted_vec(self) -> Vec<ScoredObject> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| c.object)
            .collect()
    }
}
