//! Public entry point: validate, acquire a session, harvest, persist.
use crate::accumulator::Accumulator;
use crate::aggregate::Aggregator;
use crate::cancellable;
use crate::error::{HarvestError, ValidationError};
use crate::paginate::Paginator;
use crate::persist;
use crate::query::RankingsQuery;
use crate::stabilize::{StabilityPolicy, Stabilizer};
use crate::store::HarvestResult;
use rankwatch_common::render::{LaunchOptions, RenderDriver, SessionLauncher, WaitOptions};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://opensea.io";

/// CSS selectors the controller relies on. Keeping them current for a
/// given site layout is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    /// Interstitial shown while the site verifies the browser; harvesting
    /// starts once it is gone.
    pub verification: String,
    /// Present once a freshly paginated list has rendered.
    pub content_marker: Option<String>,
    /// The next-page control.
    pub next_page: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            verification: ".cf-browser-verification".to_string(),
            content_marker: Some(".Image--image".to_string()),
            next_page: "[value=arrow_forward_ios]".to_string(),
        }
    }
}

/// Everything about a harvest that is policy rather than request.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub base_url: String,
    pub selectors: PageSelectors,
    pub stability: StabilityPolicy,
    /// Timeout for each wait on a selector.
    pub wait_timeout: Duration,
    pub accumulator: Accumulator,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            selectors: PageSelectors::default(),
            stability: StabilityPolicy::default(),
            wait_timeout: rankwatch_common::render::DEFAULT_WAIT,
            accumulator: Accumulator::bundled(),
        }
    }
}

/// Caller options for [`rankings`].
pub struct RankingsOptions {
    /// Launch a visible browser window.
    pub debug: bool,
    /// Report progress at INFO.
    pub logs: bool,
    /// A session supplied by the caller. It is probed before use and closed
    /// when the run ends, like a launched one.
    pub session: Option<Box<dyn RenderDriver>>,
    /// Upper bound for the whole harvest, session acquisition excluded.
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
    pub settings: HarvestSettings,
}

impl Default for RankingsOptions {
    fn default() -> Self {
        Self {
            debug: false,
            logs: false,
            session: None,
            timeout: None,
            cancel: CancellationToken::new(),
            settings: HarvestSettings::default(),
        }
    }
}

/// Harvest `nbr_of_pages` pages of the rankings list and write them to
/// `output_path` as a JSON array.
///
/// Input is validated before any session is acquired. A supplied session is
/// closed even when validation fails, and any session is closed on every path
/// once acquired. When writing fails the harvested result is
/// returned inside [`HarvestError::Persistence`].
pub async fn rankings(
    nbr_of_pages: i64,
    duration: &str,
    chain: &str,
    output_path: impl AsRef<Path>,
    options: RankingsOptions,
    launcher: &dyn SessionLauncher,
) -> Result<HarvestResult, HarvestError> {
    let RankingsOptions {
        debug,
        logs,
        session,
        timeout,
        cancel,
        settings,
    } = options;

    let (query, url) = match validate(nbr_of_pages, duration, chain, &settings) {
        Ok(checked) => checked,
        Err(err) => {
            if let Some(mut supplied) = session {
                if let Err(close_err) = supplied.close().await {
                    warn!(error = %close_err, "harvest.session.close_failed");
                }
            }
            return Err(err.into());
        }
    };

    progress!(
        logs,
        pages = query.pages(),
        chain = %query.chain(),
        window = %query.window(),
        "harvest.rankings.start"
    );

    let mut session = acquire(session, launcher, debug, &cancel).await?;

    let harvest = harvest_session(
        &mut *session,
        &url,
        query.pages(),
        &settings,
        logs,
        &cancel,
    );
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, harvest)
            .await
            .unwrap_or(Err(HarvestError::Timeout(limit))),
        None => harvest.await,
    };

    if let Err(err) = session.close().await {
        warn!(error = %err, "harvest.session.close_failed");
    }

    let result = outcome?;
    let path = output_path.as_ref();
    match persist::write_json(path, &result) {
        Ok(()) => {
            progress!(
                logs,
                path = %path.display(),
                entities = result.len(),
                "harvest.rankings.saved"
            );
            Ok(result)
        }
        Err(source) => Err(HarvestError::Persistence {
            path: path.to_path_buf(),
            source,
            result,
        }),
    }
}

fn validate(
    nbr_of_pages: i64,
    duration: &str,
    chain: &str,
    settings: &HarvestSettings,
) -> Result<(RankingsQuery, Url), ValidationError> {
    let query = RankingsQuery::new(nbr_of_pages, duration, chain)?;
    let url = query.url(&settings.base_url)?;
    settings.stability.validate().map_err(ValidationError::Policy)?;
    Ok((query, url))
}

async fn acquire(
    session: Option<Box<dyn RenderDriver>>,
    launcher: &dyn SessionLauncher,
    debug: bool,
    cancel: &CancellationToken,
) -> Result<Box<dyn RenderDriver>, HarvestError> {
    match session {
        Some(mut provided) => {
            if let Err(err) = provided.ready().await {
                let _ = provided.close().await;
                return Err(HarvestError::Acquisition(err));
            }
            Ok(provided)
        }
        None => cancellable(cancel, launcher.launch(LaunchOptions { headless: !debug }))
            .await?
            .map_err(HarvestError::Acquisition),
    }
}

async fn harvest_session(
    driver: &mut dyn RenderDriver,
    url: &Url,
    pages: u32,
    settings: &HarvestSettings,
    logs: bool,
    cancel: &CancellationToken,
) -> Result<HarvestResult, HarvestError> {
    progress!(logs, %url, "harvest.navigate");
    cancellable(cancel, driver.navigate(url.as_str()))
        .await?
        .map_err(HarvestError::render("navigate"))?;

    progress!(logs, selector = %settings.selectors.verification, "harvest.verification.wait");
    cancellable(
        cancel,
        driver.wait_until(
            &settings.selectors.verification,
            WaitOptions::hidden(settings.wait_timeout),
        ),
    )
    .await?
    .map_err(HarvestError::render("verification"))?;

    cancellable(cancel, settings.accumulator.inject(driver)).await??;

    let mut paginator = Paginator::new(settings.selectors.next_page.clone());
    if let Some(marker) = &settings.selectors.content_marker {
        paginator = paginator.with_content_marker(marker.clone(), settings.wait_timeout);
    }
    Aggregator::new(
        Stabilizer::new(settings.stability),
        paginator,
        settings.accumulator.clone(),
    )
    .with_logs(logs)
    .run(driver, pages, cancel)
    .await
}
