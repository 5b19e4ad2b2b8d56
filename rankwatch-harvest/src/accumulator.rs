//! The in-page accumulator.
//!
//! The accumulator is a script that defines a global `fetchCollections()`
//! returning an object keyed by [`HarvestKey`] of every entity currently
//! rendered. It only observes: merging into the run's [`HarvestStore`]
//! happens on this side.
//!
//! [`HarvestStore`]: crate::store::HarvestStore
use crate::entity::{HarvestKey, RankedEntity};
use crate::error::HarvestError;
use rankwatch_common::render::RenderDriver;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Scripts the harvester evaluates in the page.
pub mod scripts {
    /// Scrolls the viewport down by `arguments[0]` pixels.
    pub const SCROLL_BY: &str = "window.scrollBy(0, arguments[0]); return null;";
    /// Current vertical scroll offset of the document.
    pub const SCROLL_OFFSET: &str = "return document.documentElement.scrollTop;";
    /// Invokes the accumulator.
    pub const COLLECT: &str = "return fetchCollections();";
    /// Whether the accumulator is defined.
    pub const PROBE: &str = "return typeof fetchCollections === 'function';";
}

const BUNDLED_SOURCE: &str = include_str!("../assets/rankings_accumulator.js");

/// Where an accumulator's source came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    Bundled,
    File(PathBuf),
    Inline,
}

#[derive(Debug, Clone)]
pub struct Accumulator {
    source: String,
    origin: ScriptOrigin,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::bundled()
    }
}

impl Accumulator {
    /// The accumulator shipped with the crate for the rankings table.
    pub fn bundled() -> Self {
        Self {
            source: BUNDLED_SOURCE.to_string(),
            origin: ScriptOrigin::Bundled,
        }
    }

    /// Read the accumulator source from `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, HarvestError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::Accumulator(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self {
            source,
            origin: ScriptOrigin::File(path.to_path_buf()),
        })
    }

    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            origin: ScriptOrigin::Inline,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn origin(&self) -> &ScriptOrigin {
        &self.origin
    }

    /// Inject the source and check that `fetchCollections` is now defined.
    pub async fn inject(&self, driver: &mut dyn RenderDriver) -> Result<(), HarvestError> {
        driver
            .inject_script(&self.source)
            .await
            .map_err(HarvestError::render("inject"))?;
        let defined = driver
            .evaluate(scripts::PROBE, Vec::new())
            .await
            .map_err(HarvestError::render("inject"))?;
        if defined.as_bool() != Some(true) {
            return Err(HarvestError::Accumulator(format!(
                "fetchCollections is not defined after injecting {:?} source",
                self.origin
            )));
        }
        Ok(())
    }

    /// Run the accumulator against the current DOM.
    pub async fn collect(
        &self,
        driver: &mut dyn RenderDriver,
    ) -> Result<Vec<(HarvestKey, RankedEntity)>, HarvestError> {
        let raw = driver
            .evaluate(scripts::COLLECT, Vec::new())
            .await
            .map_err(HarvestError::render("collect"))?;
        decode_observations(raw)
    }
}

/// Decode the accumulator's `{ key: entity }` object.
pub fn decode_observations(raw: Value) -> Result<Vec<(HarvestKey, RankedEntity)>, HarvestError> {
    let map = match raw {
        Value::Object(map) => map,
        other => {
            return Err(HarvestError::Accumulator(format!(
                "fetchCollections returned {other}, expected an object keyed by entity"
            )))
        }
    };
    map.into_iter()
        .map(|(key, value)| {
            serde_json::from_value::<RankedEntity>(value)
                .map(|entity| (HarvestKey(key.clone()), entity))
                .map_err(|e| HarvestError::Accumulator(format!("entry `{key}`: {e}")))
        })
        .collect()
}
