//! Common types and utilities shared across Rankwatch crates.
//!
//! This crate defines the render capability traits the harvester consumes,
//! the driver error type every backend reports through, and the shared
//! observability helpers. It stays dependency-light so that both the
//! harvesting core and the WebDriver backend can depend on it.
//!
//! # Overview
//!
//! - [`render::RenderDriver`]: one live, scriptable page
//! - [`render::SessionLauncher`]: acquires new render sessions
//! - [`DriverError`] and [`DriverResult`]: failures reported by a render backend
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use rankwatch_common::render::WaitOptions;
//! use std::time::Duration;
//!
//! let opts = WaitOptions::hidden(Duration::from_secs(5));
//! assert!(opts.hidden);
//! assert_eq!(opts.timeout, Duration::from_secs(5));
//! ```
use std::time::Duration;

pub mod observability;
pub mod render;

/// Errors reported by a render backend.
///
/// Only [`DriverError::NotFound`] means "the element is absent"; every other
/// variant is a fault in the session or the transport.
#[derive(thiserror::Error, Debug)]
pub enum DriverError {
    /// The render session could not be created or reached.
    #[error("failed to connect to render backend: {0}")]
    Connect(String),

    /// No element matched the selector.
    #[error("no element matches selector `{0}`")]
    NotFound(String),

    /// A wait condition did not hold before its deadline.
    #[error("timed out after {waited:?} waiting for `{selector}`")]
    Timeout { selector: String, waited: Duration },

    /// A script raised inside the page.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// Any other command failure reported by the backend.
    #[error("render command failed: {0}")]
    Command(String),

    /// The session has already been closed.
    #[error("render session is closed")]
    Closed,
}

impl DriverError {
    /// True when the backend reported that no element matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DriverError::NotFound(_))
    }
}

/// Convenient alias for results that use [`DriverError`].
pub type DriverResult<T> = std::result::Result<T, DriverError>;
