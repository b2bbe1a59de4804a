use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DurableTopKError, Result};

pub type ObjectId = u32;
pub type Timestamp = u32;
pub type Score = f64;
pub type Count = u32;
pub type BoxResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Marks object that have a length
pub trait Len {
    fn len(&self) -> usize;
}

/// Object ID + score at some timestamp
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ScoredObject {
    pub id: ObjectId,
    pub score: Score,
}

impl std::fmt::Display for ScoredObject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.id, self.score)
    }
}

/// An object with a sparse series of scores over discrete timestamps
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TemporalObject {
    id: ObjectId,
    series: BTreeMap<Timestamp, Score>,
}

impl TemporalObject {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            series: BTreeMap::new(),
        }
    }

    /// Builds an object from (timestamp, score) pairs
    pub fn with_series<I>(id: ObjectId, series: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Timestamp, Score)>,
    {
        let mut object = Self::new(id);
        for (t, score) in series {
            object.insert(t, score)?;
        }
        Ok(object)
    }

    /// Sets the score at a given timestamp (overwriting any previous one)
    pub fn insert(&mut self, t: Timestamp, score: Score) -> Result<()> {
        if score.is_nan() {
            return Err(DurableTopKError::NaNScore { id: self.id, t });
        }
        self.series.insert(t, score);
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the score at `t`, or -infinity when the object has no entry
    /// there, so that it never wins a comparison at that timestamp
    #[inline]
    pub fn value_at(&self, t: Timestamp) -> Score {
        self.series.get(&t).copied().unwrap_or(Score::NEG_INFINITY)
    }

    /// Iterates over the (timestamp, score) entries in increasing time
    pub fn series(&self) -> impl Iterator<Item = (Timestamp, Score)> + '_ {
        self.series.iter().map(|(&t, &s)| (t, s))
    }

    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.series.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.series.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl Len for TemporalObject {
    fn len(&self) -> usize {
        self.series.len()
    }
}

/// The frozen collection of ingested objects.
///
/// Engines only ever borrow a dataset immutably: once built, nothing can
/// modify the objects, so every engine sees the same data.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    objects: Vec<TemporalObject>,
    min_timestamp: Option<Timestamp>,
    max_timestamp: Option<Timestamp>,
    max_id: Option<ObjectId>,
}

impl Dataset {
    /// Freezes a collection of objects; ids must be unique and every
    /// object must carry at least one score
    pub fn new(objects: Vec<TemporalObject>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(objects.len());
        let mut min_timestamp: Option<Timestamp> = None;
        let mut max_timestamp: Option<Timestamp> = None;
        let mut max_id: Option<ObjectId> = None;

        for object in objects.iter() {
            if !seen.insert(object.id) {
                return Err(DurableTopKError::DuplicateObject(object.id));
            }
            let (first, last) = match (object.first_timestamp(), object.last_timestamp()) {
                (Some(first), Some(last)) => (first, last),
                _ => return Err(DurableTopKError::EmptySeries(object.id)),
            };
            min_timestamp = Some(min_timestamp.map_or(first, |m| m.min(first)));
            max_timestamp = Some(max_timestamp.map_or(last, |m| m.max(last)));
            max_id = Some(max_id.map_or(object.id, |m| m.max(object.id)));
        }

        Ok(Self {
            objects,
            min_timestamp,
            max_timestamp,
            max_id,
        })
    }

    pub fn objects(&self) -> &[TemporalObject] {
        &self.objects
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TemporalObject> {
        self.objects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Smallest observed timestamp
    pub fn min_timestamp(&self) -> Option<Timestamp> {
        self.min_timestamp
    }

    /// Largest observed timestamp, i.e. the natural `total_time` horizon
    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.max_timestamp
    }

    pub fn total_time(&self) -> Timestamp {
        self.max_timestamp.unwrap_or(0)
    }

    pub fn max_id(&self) -> Option<ObjectId> {
        self.max_id
    }
}

impl Len for Dataset {
    fn len(&self) -> usize {
        self.objects.len()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TemporalObject;
    type IntoIter = std::slice::Iter<'a, TemporalObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_at_sentinel() {
        let object = TemporalObject::with_series(3, [(1, 2.5), (4, -1.)]).unwrap();
        assert_eq!(object.value_at(1), 2.5);
        assert_eq!(object.value_at(4), -1.);
        assert_eq!(object.value_at(2), Score::NEG_INFINITY);
        assert_eq!(object.len(), 2);
        assert_eq!(object.first_timestamp(), Some(1));
        assert_eq!(object.last_timestamp(), Some(4));
    }

    #[test]
    fn test_nan_rejected() {
        let mut object = TemporalObject::new(1);
        assert!(matches!(
            object.insert(2, f64::NAN),
            Err(DurableTopKError::NaNScore { id: 1, t: 2 })
        ));
    }

    #[test]
    fn test_dataset_validation() {
        let a = TemporalObject::with_series(1, [(2, 1.)]).unwrap();
        let b = TemporalObject::with_series(1, [(3, 1.)]).unwrap();
        assert!(matches!(
            Dataset::new(vec![a.clone(), b]),
            Err(DurableTopKError::DuplicateObject(1))
        ));
        assert!(matches!(
            Dataset::new(vec![a.clone(), TemporalObject::new(7)]),
            Err(DurableTopKError::EmptySeries(7))
        ));

        let c = TemporalObject::with_series(9, [(5, 1.), (7, 0.)]).unwrap();
        let dataset = Dataset::new(vec![a, c]).unwrap();
        assert_eq!(dataset.min_timestamp(), Some(2));
        assert_eq!(dataset.total_time(), 7);
        assert_eq!(dataset.max_id(), Some(9));
        assert_eq!(dataset.len(), 2);
    }
}
