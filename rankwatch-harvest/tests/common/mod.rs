//! Scripted in-memory rankings page.
//!
//! Each listing is one pagination step. Scrolling by `STEP` pixels reveals
//! `per_increment` more rows until the listing runs out, after which the
//! offset stops moving.
#![allow(dead_code)]

use async_trait::async_trait;
use rankwatch_common::render::{LaunchOptions, RenderDriver, SessionLauncher, WaitOptions};
use rankwatch_common::{DriverError, DriverResult};
use rankwatch_harvest::accumulator::scripts;
use rankwatch_harvest::stabilize::StabilityPolicy;
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const STEP: i64 = 50;
pub const NEXT: &str = "[value=arrow_forward_ios]";
pub const VERIFICATION: &str = ".cf-browser-verification";

/// A fast policy whose scroll step matches the fake page.
pub fn fast_policy() -> StabilityPolicy {
    StabilityPolicy {
        tick_interval: Duration::from_millis(1),
        scroll_step: STEP as u32,
        max_ticks: 10_000,
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub key: String,
    pub rank: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Listing {
    rows: Vec<Row>,
    per_increment: usize,
    window: Option<usize>,
    endless: bool,
    skeleton: bool,
}

impl Listing {
    /// Rows keyed `c{rank}` for every rank in `ranks`.
    pub fn ranked(ranks: std::ops::RangeInclusive<i64>, per_increment: usize) -> Self {
        let rows = ranks
            .map(|rank| Row {
                key: format!("c{rank}"),
                rank,
                name: format!("Collection {rank}"),
            })
            .collect();
        Self::from_rows(rows, per_increment)
    }

    pub fn from_rows(rows: Vec<Row>, per_increment: usize) -> Self {
        Self {
            rows,
            per_increment: per_increment.max(1),
            window: None,
            endless: false,
            skeleton: false,
        }
    }

    /// Only the last `rows` revealed rows stay in the DOM.
    pub fn virtualized(mut self, rows: usize) -> Self {
        self.window = Some(rows);
        self
    }

    /// The offset keeps moving forever.
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Adds a loading row that never resolves.
    pub fn with_skeleton(mut self) -> Self {
        self.skeleton = true;
        self
    }

    fn max_offset(&self) -> i64 {
        if self.endless {
            return i64::MAX;
        }
        let increments = self.rows.len().div_ceil(self.per_increment).max(1);
        (increments as i64 - 1) * STEP
    }

    fn visible(&self, offset: i64) -> (usize, usize) {
        let revealed = ((offset / STEP) as usize + 1).saturating_mul(self.per_increment);
        let hi = revealed.min(self.rows.len());
        let lo = self.window.map_or(0, |w| hi.saturating_sub(w));
        (lo, hi)
    }
}

#[derive(Debug, Default)]
pub struct ProbeState {
    pub launches: u32,
    pub headless: Option<bool>,
    pub navigations: Vec<String>,
    pub waits: Vec<(String, bool)>,
    pub injections: u32,
    pub scrolls: u32,
    pub collects: u32,
    pub clicks: u32,
    pub closes: u32,
}

/// Shared view into what the fake was asked to do.
#[derive(Debug, Clone, Default)]
pub struct Probe(Arc<Mutex<ProbeState>>);

impl Probe {
    pub fn with<R>(&self, f: impl FnOnce(&mut ProbeState) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }

    pub fn launches(&self) -> u32 {
        self.with(|s| s.launches)
    }

    pub fn clicks(&self) -> u32 {
        self.with(|s| s.clicks)
    }

    pub fn collects(&self) -> u32 {
        self.with(|s| s.collects)
    }

    pub fn closes(&self) -> u32 {
        self.with(|s| s.closes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickFault {
    None,
    /// The control is present but the click errors out.
    Transient,
}

pub struct FakePage {
    listings: Vec<Listing>,
    current: usize,
    offset: i64,
    resolved: usize,
    placeholders_on_reveal: bool,
    injected: bool,
    broken_accumulator: bool,
    verification_stuck: bool,
    unready: bool,
    click_fault: ClickFault,
    probe: Probe,
}

impl FakePage {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            current: 0,
            offset: 0,
            resolved: 0,
            placeholders_on_reveal: false,
            injected: false,
            broken_accumulator: false,
            verification_stuck: false,
            unready: false,
            click_fault: ClickFault::None,
            probe: Probe::default(),
        }
    }

    /// Newly revealed rows render as placeholders until the next collect.
    pub fn placeholders_on_reveal(mut self) -> Self {
        self.placeholders_on_reveal = true;
        self
    }

    /// Injection succeeds but defines nothing.
    pub fn broken_accumulator(mut self) -> Self {
        self.broken_accumulator = true;
        self
    }

    pub fn verification_stuck(mut self) -> Self {
        self.verification_stuck = true;
        self
    }

    pub fn unready(mut self) -> Self {
        self.unready = true;
        self
    }

    pub fn click_fault(mut self, fault: ClickFault) -> Self {
        self.click_fault = fault;
        self
    }

    /// Pretend the accumulator was already injected.
    pub fn injected(mut self) -> Self {
        self.injected = true;
        self
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }

    fn listing(&self) -> Option<&Listing> {
        self.listings.get(self.current)
    }

    fn collect(&mut self) -> DriverResult<Value> {
        if !self.injected {
            return Err(DriverError::Script(
                "ReferenceError: fetchCollections is not defined".into(),
            ));
        }
        self.probe.with(|s| s.collects += 1);
        let mut out = Map::new();
        let Some(listing) = self.listings.get(self.current) else {
            return Ok(Value::Object(out));
        };

        let (lo, hi) = listing.visible(self.offset);
        for (idx, row) in listing.rows.iter().enumerate().take(hi).skip(lo) {
            let entity = if self.placeholders_on_reveal && idx >= self.resolved {
                json!({ "rank": 0, "name": "", "image": null })
            } else {
                json!({
                    "rank": row.rank,
                    "name": row.name,
                    "image": format!("https://img.example/{}.png", row.key),
                })
            };
            out.insert(row.key.clone(), entity);
        }
        if listing.skeleton {
            out.insert("skeleton".into(), json!({ "rank": 0, "name": "" }));
        }
        self.resolved = self.resolved.max(hi);
        Ok(Value::Object(out))
    }
}

#[async_trait]
impl RenderDriver for FakePage {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.probe.with(|s| s.navigations.push(url.to_string()));
        Ok(())
    }

    async fn wait_until(&mut self, selector: &str, opts: WaitOptions) -> DriverResult<()> {
        self.probe
            .with(|s| s.waits.push((selector.to_string(), opts.hidden)));
        if self.verification_stuck && selector == VERIFICATION {
            return Err(DriverError::Timeout {
                selector: selector.to_string(),
                waited: opts.timeout,
            });
        }
        Ok(())
    }

    async fn inject_script(&mut self, source: &str) -> DriverResult<()> {
        self.probe.with(|s| s.injections += 1);
        if !self.broken_accumulator && source.contains("fetchCollections") {
            self.injected = true;
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> DriverResult<()> {
        self.probe.with(|s| s.clicks += 1);
        if self.click_fault == ClickFault::Transient {
            return Err(DriverError::Command("element click intercepted".into()));
        }
        if selector != NEXT || self.current + 1 >= self.listings.len() {
            return Err(DriverError::NotFound(selector.to_string()));
        }
        self.current += 1;
        self.offset = 0;
        self.resolved = 0;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> DriverResult<Value> {
        match script {
            scripts::SCROLL_BY => {
                self.probe.with(|s| s.scrolls += 1);
                let dy = args.first().and_then(Value::as_i64).unwrap_or(0);
                let max = self.listing().map_or(0, Listing::max_offset);
                self.offset = self.offset.saturating_add(dy).min(max);
                Ok(Value::Null)
            }
            scripts::SCROLL_OFFSET => Ok(json!(self.offset)),
            scripts::PROBE => Ok(json!(self.injected)),
            scripts::COLLECT => self.collect(),
            other => Err(DriverError::Script(format!("unexpected script: {other}"))),
        }
    }

    async fn ready(&mut self) -> DriverResult<()> {
        if self.unready {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.probe.with(|s| s.closes += 1);
        Ok(())
    }
}

/// Hands out one prepared [`FakePage`].
pub struct FakeLauncher {
    page: Mutex<Option<FakePage>>,
    probe: Probe,
    refuse: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        let probe = page.probe();
        Self {
            page: Mutex::new(Some(page)),
            probe,
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            page: Mutex::new(None),
            probe: Probe::default(),
            refuse: true,
        }
    }

    pub fn probe(&self) -> Probe {
        self.probe.clone()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, opts: LaunchOptions) -> DriverResult<Box<dyn RenderDriver>> {
        self.probe.with(|s| {
            s.launches += 1;
            s.headless = Some(opts.headless);
        });
        if self.refuse {
            return Err(DriverError::Connect("connection refused".into()));
        }
        let page = self.page.lock().unwrap().take().ok_or(DriverError::Closed)?;
        Ok(Box::new(page))
    }
}
