//! Alternates stabilization and pagination over one shared store.
use crate::accumulator::Accumulator;
use crate::cancellable;
use crate::error::HarvestError;
use crate::paginate::Paginator;
use crate::stabilize::Stabilizer;
use crate::store::{HarvestResult, HarvestStore};
use rankwatch_common::render::RenderDriver;
use tokio_util::sync::CancellationToken;

pub struct Aggregator {
    stabilizer: Stabilizer,
    paginator: Paginator,
    accumulator: Accumulator,
    logs: bool,
}

impl Aggregator {
    pub fn new(stabilizer: Stabilizer, paginator: Paginator, accumulator: Accumulator) -> Self {
        Self {
            stabilizer,
            paginator,
            accumulator,
            logs: false,
        }
    }

    /// Report per-page progress at INFO instead of DEBUG.
    pub fn with_logs(mut self, logs: bool) -> Self {
        self.logs = logs;
        self
    }

    /// Harvest `pages` pages: stabilize, advance, stabilize, ..., stabilize.
    ///
    /// The accumulator must already be injected. A failed advance ends the
    /// run with [`HarvestError::Pagination`], carrying what the completed
    /// pages produced.
    pub async fn run(
        &self,
        driver: &mut dyn RenderDriver,
        pages: u32,
        cancel: &CancellationToken,
    ) -> Result<HarvestResult, HarvestError> {
        let mut store = HarvestStore::new();

        for page in 1..=pages {
            if page > 1 {
                if let Err(error) = cancellable(cancel, self.paginator.step(driver, page)).await? {
                    tracing::warn!(page, error = %error, "harvest.page.failed");
                    return Err(HarvestError::Pagination {
                        error,
                        partial: store.finalize(),
                    });
                }
            }

            let report = self
                .stabilizer
                .stabilize(driver, &self.accumulator, &mut store, cancel)
                .await?;
            progress!(
                self.logs,
                page,
                of = pages,
                ticks = report.ticks,
                inserted = report.merged.inserted,
                stored = store.len(),
                "harvest.page.done"
            );
        }

        let total = store.len();
        let result = store.finalize();
        progress!(
            self.logs,
            observed = total,
            kept = result.len(),
            "harvest.done"
        );
        Ok(result)
    }
}
