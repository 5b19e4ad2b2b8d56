use crate::persist::PersistError;
use crate::store::HarvestResult;
use rankwatch_common::DriverError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Rejected input, raised before any render session is acquired.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("chain `{given}` is not supported (expected one of: {expected})")]
    UnknownChain { given: String, expected: String },

    #[error("duration `{given}` is not supported (expected one of: {expected})")]
    UnknownDuration { given: String, expected: String },

    #[error("number of pages must be at least 1, got {0}")]
    PageCount(i64),

    #[error("invalid base url `{0}`")]
    BaseUrl(String),

    #[error("invalid stabilization policy: {0}")]
    Policy(String),
}

/// Why a pagination step failed.
#[derive(Debug, Error)]
pub enum PaginationFailure {
    /// The driver found no next-page control. Whether the list is exhausted
    /// or the layout changed is not decided here.
    #[error("next-page control `{0}` is missing")]
    ControlMissing(String),

    /// Clicking or re-synchronizing failed for any other reason.
    #[error("navigation failed: {0}")]
    Navigation(DriverError),
}

#[derive(Debug, Error)]
#[error("advancing to page {page} failed: {cause}")]
pub struct PaginationError {
    /// The 1-based page the controller was trying to reach.
    pub page: u32,
    pub cause: PaginationFailure,
}

impl PaginationError {
    pub fn is_control_missing(&self) -> bool {
        matches!(self.cause, PaginationFailure::ControlMissing(_))
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to acquire render session: {0}")]
    Acquisition(#[source] DriverError),

    #[error("render step `{stage}` failed: {source}")]
    Render {
        stage: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("accumulator script: {0}")]
    Accumulator(String),

    /// The run stopped early. `partial` holds the finalized result of the
    /// pages that did complete.
    #[error("harvest stopped early: {error}")]
    Pagination {
        error: PaginationError,
        partial: HarvestResult,
    },

    #[error("page did not stabilize within {ticks} scroll ticks")]
    Runaway { ticks: u32 },

    #[error("harvest cancelled")]
    Cancelled,

    #[error("harvest timed out after {0:?}")]
    Timeout(Duration),

    /// Writing the output failed; the harvested `result` is still available.
    #[error("failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: PersistError,
        result: HarvestResult,
    },
}

impl HarvestError {
    pub(crate) fn render(stage: &'static str) -> impl FnOnce(DriverError) -> HarvestError {
        move |source| HarvestError::Render { stage, source }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, HarvestError::Validation(_))
    }

    /// Entities harvested before the failure, when the error carries them.
    pub fn partial_result(&self) -> Option<&HarvestResult> {
        match self {
            HarvestError::Pagination { partial, .. } => Some(partial),
            HarvestError::Persistence { result, .. } => Some(result),
            _ => None,
        }
    }
}
