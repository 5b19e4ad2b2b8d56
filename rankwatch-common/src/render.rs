//! Render capabilities consumed by the harvester.
//!
//! A [`RenderDriver`] is one live page. The harvester never launches a
//! browser itself; it asks a [`SessionLauncher`] for a driver, or is handed
//! one by the caller.
use crate::DriverResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// How long [`RenderDriver::wait_until`] waits when the caller has no opinion.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(30);

/// Options for [`RenderDriver::wait_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Wait for the selector to match nothing instead of something.
    pub hidden: bool,
    pub timeout: Duration,
}

impl WaitOptions {
    /// Wait for at least one element to match.
    pub fn visible(timeout: Duration) -> Self {
        Self {
            hidden: false,
            timeout,
        }
    }

    /// Wait for no element to match.
    pub fn hidden(timeout: Duration) -> Self {
        Self {
            hidden: true,
            timeout,
        }
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::visible(DEFAULT_WAIT)
    }
}

/// Options passed to [`SessionLauncher::launch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self { headless: true }
    }
}

/// A single scriptable page.
///
/// Calls are strictly sequential: the harvester never has two outstanding
/// operations on the same driver.
#[async_trait]
pub trait RenderDriver: Send {
    /// Load `url` and wait for the navigation to complete.
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Wait until `selector` matches (or, with `hidden`, stops matching).
    async fn wait_until(&mut self, selector: &str, opts: WaitOptions) -> DriverResult<()>;

    /// Add `source` to the page as a script element so its declarations
    /// become page globals.
    async fn inject_script(&mut self, source: &str) -> DriverResult<()>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> DriverResult<()>;

    /// Run `script` as a function body with `args` bound to `arguments`
    /// and return its result.
    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> DriverResult<Value>;

    /// Probe that the session is alive and usable.
    async fn ready(&mut self) -> DriverResult<()> {
        Ok(())
    }

    /// End the session. Closing twice is not an error.
    async fn close(&mut self) -> DriverResult<()>;
}

/// Acquires fresh render sessions.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, opts: LaunchOptions) -> DriverResult<Box<dyn RenderDriver>>;
}
