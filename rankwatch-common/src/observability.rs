//! Logging setup for the `rankwatch` binary and integration tests.
//!
//! [`init_logging`] installs one global `tracing` subscriber: a daily rolling
//! file under the resolved log directory, plus an optional `stderr` mirror
//! used by `--logs`. Only the first call installs anything; later calls get
//! the path chosen by the first.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the non-blocking writer flushing for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static ACTIVE_LOG: OnceLock<PathBuf> = OnceLock::new();

/// Overrides the log directory when the config leaves it unset.
pub const LOG_DIR_ENV: &str = "RANKWATCH_LOG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format `{other}` (expected text or json)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used for the default directory and the file name.
    pub app_name: &'static str,
    /// Wins over `RANKWATCH_LOG_DIR` and the platform data directory.
    pub log_dir: Option<PathBuf>,
    /// Mirror events to `stderr`.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset, e.g. `info,rankwatch_harvest=debug`.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "rankwatch",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Directory the file sink writes into.
    pub fn resolved_dir(&self) -> PathBuf {
        let env_dir = std::env::var_os(LOG_DIR_ENV).map(PathBuf::from);
        self.log_dir
            .clone()
            .or(env_dir)
            .map(|dir| expand_home(&dir))
            .unwrap_or_else(|| platform_data_dir(self.app_name))
    }

    fn file_name(&self) -> String {
        format!("{}.log", self.app_name)
    }
}

type DynLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

fn sink<S, W>(format: LogFormat, writer: W, ansi: bool) -> DynLayer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global subscriber and return today's log file.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(active) = ACTIVE_LOG.get() {
        return Ok(active.clone());
    }

    let dir = config.resolved_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let file_name = config.file_name();
    let stamped = dir.join(format!("{file_name}.{}", Local::now().format("%Y-%m-%d")));

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, &file_name));
    let _ = FILE_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));
    let mirror = config
        .emit_stderr
        .then(|| sink(config.format, std::io::stderr, true));

    tracing_subscriber::registry()
        .with(filter)
        .with(sink(config.format, writer, false))
        .with(mirror)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    let _ = ACTIVE_LOG.set(stamped.clone());
    Ok(stamped)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// `~/.local/share/<app>` on Linux, the platform equivalent elsewhere.
fn platform_data_dir(app_name: &str) -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: Some(tmp.path().to_path_buf()),
            ..LogConfig::default()
        };
        assert_eq!(config.resolved_dir(), tmp.path());
    }

    #[test]
    fn tilde_expands_against_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/logs")), home.join("logs"));
        }
        assert_eq!(expand_home(Path::new("/var/log")), PathBuf::from("/var/log"));
    }

    #[test]
    fn default_dir_is_named_after_the_app() {
        let config = LogConfig::default();
        if config.log_dir.is_none() && std::env::var_os(LOG_DIR_ENV).is_none() {
            assert!(config.resolved_dir().ends_with("rankwatch"));
        }
    }

    #[test]
    fn parses_log_format() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" text ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
