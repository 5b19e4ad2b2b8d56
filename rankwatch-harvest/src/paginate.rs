//! Discrete pagination of the ranked list.
use crate::error::{PaginationError, PaginationFailure};
use rankwatch_common::render::{RenderDriver, WaitOptions};
use std::time::Duration;
use tracing::debug;

/// Clicks the next-page control and waits for the new page to render.
#[derive(Debug, Clone)]
pub struct Paginator {
    next_selector: String,
    content_marker: Option<String>,
    settle_timeout: Duration,
}

impl Paginator {
    pub fn new(next_selector: impl Into<String>) -> Self {
        Self {
            next_selector: next_selector.into(),
            content_marker: None,
            settle_timeout: rankwatch_common::render::DEFAULT_WAIT,
        }
    }

    /// Wait for `marker` after each advance before harvesting resumes.
    pub fn with_content_marker(mut self, marker: impl Into<String>, timeout: Duration) -> Self {
        self.content_marker = Some(marker.into());
        self.settle_timeout = timeout;
        self
    }

    /// Issue a single next-page trigger.
    pub async fn advance(
        &self,
        driver: &mut dyn RenderDriver,
        page: u32,
    ) -> Result<(), PaginationError> {
        debug!(page, selector = %self.next_selector, "harvest.page.advance");
        driver.click(&self.next_selector).await.map_err(|err| {
            let cause = if err.is_not_found() {
                PaginationFailure::ControlMissing(self.next_selector.clone())
            } else {
                PaginationFailure::Navigation(err)
            };
            PaginationError { page, cause }
        })
    }

    /// Wait for the content marker of the freshly loaded page, if one is set.
    pub async fn resync(
        &self,
        driver: &mut dyn RenderDriver,
        page: u32,
    ) -> Result<(), PaginationError> {
        let Some(marker) = self.content_marker.as_deref() else {
            return Ok(());
        };
        driver
            .wait_until(marker, WaitOptions::visible(self.settle_timeout))
            .await
            .map_err(|err| PaginationError {
                page,
                cause: PaginationFailure::Navigation(err),
            })
    }

    /// [`advance`](Self::advance) followed by [`resync`](Self::resync).
    pub async fn step(
        &self,
        driver: &mut dyn RenderDriver,
        page: u32,
    ) -> Result<(), PaginationError> {
        self.advance(driver, page).await?;
        self.resync(driver, page).await
    }
}
