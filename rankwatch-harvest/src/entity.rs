//! Entities observed on the rankings page.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Deduplication identity of an observed entity.
///
/// The accumulator must hand out the same key every time it sees the same
/// real-world entity, across scroll ticks and across pagination steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarvestKey(pub String);

impl HarvestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HarvestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HarvestKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HarvestKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One ranked entry of the list.
///
/// `rank` and `name` are the only fields the harvester interprets. Anything
/// else the accumulator reports (image url, volume figures, ...) is carried
/// through untouched in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl RankedEntity {
    pub fn new(rank: i64, name: impl Into<String>) -> Self {
        Self {
            rank,
            name: name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// A placeholder row rendered before its content resolved: no positive
    /// rank, or no name.
    pub fn is_placeholder(&self) -> bool {
        self.rank <= 0 || self.name.trim().is_empty()
    }
}
