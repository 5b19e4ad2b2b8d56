//! Scroll-until-stable detection.
//!
//! One cycle ticks on a fixed interval. Every tick scrolls down by a fixed
//! step, runs the accumulator, and reads the scroll offset. The cycle ends
//! on the first tick whose offset equals the previous tick's offset.
use crate::accumulator::{scripts, Accumulator};
use crate::cancellable;
use crate::error::HarvestError;
use crate::store::{HarvestStore, MergeStats};
use rankwatch_common::render::RenderDriver;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityPolicy {
    /// Delay before every tick. Must be non-zero so the page gets to render.
    pub tick_interval: Duration,
    /// Pixels scrolled per tick.
    pub scroll_step: u32,
    /// Upper bound on ticks per cycle.
    pub max_ticks: u32,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(25),
            scroll_step: 50,
            max_ticks: 2000,
        }
    }
}

impl StabilityPolicy {
    /// Reject policies that could never make progress.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval.is_zero() {
            return Err("tick interval must be greater than zero".into());
        }
        if self.scroll_step == 0 {
            return Err("scroll step must be greater than zero".into());
        }
        if self.max_ticks == 0 {
            return Err("max ticks must be greater than zero".into());
        }
        Ok(())
    }
}

/// Last observed scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    /// No tick has completed in this cycle.
    #[default]
    Unknown,
    Ticking {
        offset: i64,
    },
    Stable {
        offset: i64,
    },
}

impl ScrollState {
    /// Fold one offset reading into the state.
    ///
    /// `Unknown` always moves to `Ticking`, so no cycle can end on its first
    /// tick. Two equal consecutive readings reach `Stable`.
    pub fn observe(self, offset: i64) -> ScrollState {
        match self {
            ScrollState::Unknown => ScrollState::Ticking { offset },
            ScrollState::Ticking { offset: last } | ScrollState::Stable { offset: last }
                if last == offset =>
            {
                ScrollState::Stable { offset }
            }
            ScrollState::Ticking { .. } | ScrollState::Stable { .. } => {
                ScrollState::Ticking { offset }
            }
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, ScrollState::Stable { .. })
    }

    pub fn offset(&self) -> Option<i64> {
        match self {
            ScrollState::Unknown => None,
            ScrollState::Ticking { offset } | ScrollState::Stable { offset } => Some(*offset),
        }
    }
}

/// Summary of one completed stabilization cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub ticks: u32,
    pub final_offset: i64,
    pub merged: MergeStats,
}

#[derive(Debug, Clone, Default)]
pub struct Stabilizer {
    policy: StabilityPolicy,
}

impl Stabilizer {
    pub fn new(policy: StabilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &StabilityPolicy {
        &self.policy
    }

    /// Scroll and accumulate into `store` until the offset stops changing.
    pub async fn stabilize(
        &self,
        driver: &mut dyn RenderDriver,
        accumulator: &Accumulator,
        store: &mut HarvestStore,
        cancel: &CancellationToken,
    ) -> Result<CycleReport, HarvestError> {
        let mut state = ScrollState::Unknown;
        let mut merged = MergeStats::default();

        for tick in 1..=self.policy.max_ticks {
            cancellable(cancel, sleep(self.policy.tick_interval)).await?;

            cancellable(
                cancel,
                driver.evaluate(scripts::SCROLL_BY, vec![json!(self.policy.scroll_step)]),
            )
            .await?
            .map_err(HarvestError::render("scroll"))?;

            let observations = cancellable(cancel, accumulator.collect(driver)).await??;
            merged.absorb(store.merge(observations));

            let raw = cancellable(cancel, driver.evaluate(scripts::SCROLL_OFFSET, Vec::new()))
                .await?
                .map_err(HarvestError::render("offset"))?;
            let offset = parse_offset(&raw)?;

            state = state.observe(offset);
            trace!(tick, offset, stored = store.len(), "harvest.tick");

            if let ScrollState::Stable { offset } = state {
                debug!(ticks = tick, offset, stored = store.len(), "harvest.cycle.stable");
                return Ok(CycleReport {
                    ticks: tick,
                    final_offset: offset,
                    merged,
                });
            }
        }

        Err(HarvestError::Runaway {
            ticks: self.policy.max_ticks,
        })
    }
}

/// Browsers may report fractional offsets under zoom; round to whole pixels.
fn parse_offset(raw: &Value) -> Result<i64, HarvestError> {
    raw.as_i64()
        .or_else(|| raw.as_f64().map(|f| f.round() as i64))
        .ok_or_else(|| HarvestError::Accumulator(format!("scroll offset is not a number: {raw}")))
}
