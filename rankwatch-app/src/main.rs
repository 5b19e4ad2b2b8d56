use anyhow::{Context, Result, bail};
use clap::Parser;
use rankwatch_common::observability::init_logging;
use rankwatch_drivers::webdriver::driver::WebDriverLauncher;
use rankwatch_harvest::query::RankingsQuery;
use rankwatch_harvest::{HarvestError, RankingsOptions, rankings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod settings;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Reject bad arguments before touching config, logs or the browser.
    if let Err(e) = RankingsQuery::new(cli.nbr_of_pages, &cli.duration, &cli.chain) {
        bail!("invalid arguments: {e}");
    }

    let mut config = settings::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let log_path = init_logging(settings::log_config(&config, cli.logs)?)?;
    info!(log_file = %log_path.display(), webdriver = %config.webdriver_url, "rankwatch.start");

    let harvest = settings::harvest_settings(&config)?;
    let launcher = WebDriverLauncher::new(&config.webdriver_url)
        .with_context(|| format!("invalid webdriver url {}", config.webdriver_url))?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("rankwatch.interrupt");
                cancel.cancel();
            }
        });
    }

    let options = RankingsOptions {
        debug: cli.debug,
        logs: cli.logs,
        session: None,
        timeout: config.run_timeout(),
        cancel,
        settings: harvest,
    };

    match rankings(
        cli.nbr_of_pages,
        &cli.duration,
        &cli.chain,
        &cli.output_path,
        options,
        &launcher,
    )
    .await
    {
        Ok(result) => {
            info!(collections = result.len(), "rankwatch.done");
            println!(
                "wrote {} collections to {}",
                result.len(),
                cli.output_path.display()
            );
            Ok(())
        }
        Err(HarvestError::Persistence { path, source, result }) => {
            // The harvest itself succeeded; say how much was lost.
            Err(anyhow::Error::new(source).context(format!(
                "harvested {} collections but could not write {}",
                result.len(),
                path.display()
            )))
        }
        Err(e) => {
            if let Some(partial) = e.partial_result() {
                warn!(collections = partial.len(), "rankwatch.partial");
            }
            Err(anyhow::Error::new(e).context("harvest failed"))
        }
    }
}
