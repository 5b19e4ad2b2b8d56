//! The cumulative keyed store and the finalized result.
use crate::entity::{HarvestKey, RankedEntity};
use serde::Serialize;
use std::collections::HashMap;

/// Counts produced by one [`HarvestStore::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Keys seen for the first time.
    pub inserted: usize,
    /// Known keys whose entity was replaced.
    pub updated: usize,
    /// Placeholder observations ignored because the key already resolved.
    pub kept: usize,
}

impl MergeStats {
    pub fn absorb(&mut self, other: MergeStats) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.kept += other.kept;
    }
}

/// Every entity observed during one run, keyed by [`HarvestKey`].
///
/// Created once per run and never reset between pagination steps.
#[derive(Debug, Default)]
pub struct HarvestStore {
    entries: HashMap<HarvestKey, RankedEntity>,
}

impl HarvestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &HarvestKey) -> Option<&RankedEntity> {
        self.entries.get(key)
    }

    /// Merge a batch of observations.
    ///
    /// A later observation replaces an earlier one for the same key, except
    /// that a placeholder never replaces an entity that already resolved.
    pub fn merge<I>(&mut self, observations: I) -> MergeStats
    where
        I: IntoIterator<Item = (HarvestKey, RankedEntity)>,
    {
        let mut stats = MergeStats::default();
        for (key, entity) in observations {
            match self.entries.get_mut(&key) {
                None => {
                    self.entries.insert(key, entity);
                    stats.inserted += 1;
                }
                Some(existing) if entity.is_placeholder() && !existing.is_placeholder() => {
                    stats.kept += 1;
                }
                Some(existing) => {
                    if *existing != entity {
                        *existing = entity;
                        stats.updated += 1;
                    }
                }
            }
        }
        stats
    }

    /// Drop placeholders and order the rest by rank.
    ///
    /// Ranks are expected to be unique; when two entities do share a rank
    /// their relative order is unspecified.
    pub fn finalize(self) -> HarvestResult {
        let mut entities: Vec<RankedEntity> = self
            .entries
            .into_values()
            .filter(|entity| !entity.is_placeholder())
            .collect();
        entities.sort_by_key(|entity| entity.rank);
        HarvestResult { entities }
    }
}

/// Placeholder-free entities in ascending rank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HarvestResult {
    entities: Vec<RankedEntity>,
}

impl HarvestResult {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntity> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[RankedEntity] {
        &self.entities
    }

    pub fn ranks(&self) -> Vec<i64> {
        self.entities.iter().map(|entity| entity.rank).collect()
    }

    pub fn into_vec(self) -> Vec<RankedEntity> {
        self.entities
    }
}

impl<'a> IntoIterator for &'a HarvestResult {
    type Item = &'a RankedEntity;
    type IntoIter = std::slice::Iter<'a, RankedEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
