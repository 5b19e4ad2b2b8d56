//! Incremental harvesting of an infinite-scroll ranked list.
//!
//! The controller drives a [`RenderDriver`](rankwatch_common::render::RenderDriver)
//! through a bounded number of pagination steps. Within each step it scrolls
//! until the page stops moving, merging every rendered entity into one
//! [`store::HarvestStore`] keyed by [`entity::HarvestKey`]. When all steps are
//! done the store is finalized into a rank-ordered [`store::HarvestResult`].
//!
//! - [`rankings::rankings`]: public entry point (validate, acquire, harvest, persist)
//! - [`aggregate::Aggregator`]: alternates stabilization and pagination
//! - [`stabilize::Stabilizer`]: scroll-until-stable cycle
//! - [`paginate::Paginator`]: next-page trigger and re-sync
//! - [`accumulator::Accumulator`]: the in-page extraction script

/// Emit a progress event at INFO when `$loud`, DEBUG otherwise.
macro_rules! progress {
    ($loud:expr, $($arg:tt)+) => {
        if $loud {
            ::tracing::info!($($arg)+)
        } else {
            ::tracing::debug!($($arg)+)
        }
    };
}

pub mod accumulator;
pub mod aggregate;
pub mod entity;
pub mod error;
pub mod paginate;
pub mod persist;
pub mod query;
pub mod rankings;
pub mod stabilize;
pub mod store;

pub use error::{HarvestError, PaginationError, PaginationFailure, ValidationError};
pub use rankings::{rankings, HarvestSettings, PageSelectors, RankingsOptions};
pub use store::{HarvestResult, HarvestStore};

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `fut` against `cancel`; cancellation wins ties.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, HarvestError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        out = fut => Ok(out),
    }
}
