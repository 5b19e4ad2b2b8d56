//! Turns loaded configuration into the library's runtime settings.
use anyhow::{Context, Result};
use rankwatch_common::observability::LogConfig;
use rankwatch_config::{
    DEFAULT_CONFIG_FILE, RankwatchConfig, RankwatchConfigLoader, user_config_file,
};
use rankwatch_harvest::accumulator::Accumulator;
use rankwatch_harvest::stabilize::StabilityPolicy;
use rankwatch_harvest::{HarvestSettings, PageSelectors};
use std::path::Path;

/// An explicit path must exist; otherwise the per-user file and then
/// `./rankwatch.yaml` are layered when present.
pub fn load_config(explicit: Option<&Path>) -> Result<RankwatchConfig> {
    let loader = match explicit {
        Some(path) => RankwatchConfigLoader::new().with_file(path),
        None => {
            let mut loader = RankwatchConfigLoader::new();
            if let Some(user) = user_config_file() {
                loader = loader.with_optional_file(user);
            }
            loader.with_optional_file(DEFAULT_CONFIG_FILE)
        }
    };
    loader.load().context("failed to load configuration")
}

pub fn log_config(config: &RankwatchConfig, emit_stderr: bool) -> Result<LogConfig> {
    Ok(LogConfig {
        app_name: "rankwatch",
        log_dir: config.log.dir.clone(),
        emit_stderr,
        format: config.log.format.parse()?,
        default_filter: config.log.filter.clone(),
    })
}

pub fn harvest_settings(config: &RankwatchConfig) -> Result<HarvestSettings> {
    let accumulator = match &config.accumulator_script {
        Some(path) => Accumulator::from_path(path)
            .with_context(|| format!("failed to load accumulator script {}", path.display()))?,
        None => Accumulator::bundled(),
    };

    Ok(HarvestSettings {
        base_url: config.base_url.clone(),
        selectors: PageSelectors {
            verification: config.selectors.verification.clone(),
            content_marker: config.selectors.content_marker.clone(),
            next_page: config.selectors.next_page.clone(),
        },
        stability: StabilityPolicy {
            tick_interval: config.stabilizer.tick_interval(),
            scroll_step: config.stabilizer.scroll_step,
            max_ticks: config.stabilizer.max_ticks,
        },
        wait_timeout: config.wait_timeout(),
        accumulator,
    })
}
