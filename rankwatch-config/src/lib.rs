//! Loader for rankwatch configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, config files in the
//! order they were added, inline YAML, then `RANKWATCH_`-prefixed environment
//! variables (`__` separates nested keys, e.g. `RANKWATCH_STABILIZER__MAX_TICKS`).
//! String values may reference `${VAR}`; references are expanded after the
//! sources are merged.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "rankwatch.yaml";

/// Per-user config file, e.g. `~/.config/rankwatch/rankwatch.yaml` on Linux.
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rankwatch").join(DEFAULT_CONFIG_FILE))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankwatchConfig {
    pub webdriver_url: String,
    pub base_url: String,
    pub selectors: SelectorConfig,
    pub stabilizer: StabilizerConfig,
    /// Timeout for each wait on a selector.
    pub wait_timeout_ms: u64,
    /// Upper bound for a whole harvest; unset means no limit.
    pub run_timeout_secs: Option<u64>,
    /// Accumulator script to inject instead of the bundled one.
    pub accumulator_script: Option<PathBuf>,
    pub log: LogSettings,
}

impl Default for RankwatchConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            base_url: "https://opensea.io".into(),
            selectors: SelectorConfig::default(),
            stabilizer: StabilizerConfig::default(),
            wait_timeout_ms: 30_000,
            run_timeout_secs: None,
            accumulator_script: None,
            log: LogSettings::default(),
        }
    }
}

impl RankwatchConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub verification: String,
    pub content_marker: Option<String>,
    pub next_page: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            verification: ".cf-browser-verification".into(),
            content_marker: Some(".Image--image".into()),
            next_page: "[value=arrow_forward_ios]".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub tick_interval_ms: u64,
    pub scroll_step: u32,
    pub max_ticks: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 25,
            scroll_step: 50,
            max_ticks: 2000,
        }
    }
}

impl StabilizerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: Option<PathBuf>,
    /// `text` or `json`.
    pub format: String,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            format: "text".into(),
            filter: "info".into(),
        }
    }
}

/// Expand `${VAR}` until the string stops changing or the depth runs out.
/// Unknown variables are left untouched.
fn expand_str(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let Ok(next) = shellexpand::env(&current) else {
            break;
        };
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    current
}

fn expand_placeholders(value: &mut Value) {
    match value {
        Value::String(text) if text.contains('$') => *text = expand_str(text),
        Value::Array(items) => items.iter_mut().for_each(expand_placeholders),
        Value::Object(fields) => fields.values_mut().for_each(expand_placeholders),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring.
pub struct RankwatchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for RankwatchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RankwatchConfigLoader {
    /// Start from the built-in defaults; `RANKWATCH_` env overrides are
    /// applied last when [`load`](Self::load) runs.
    ///
    /// ```
    /// use rankwatch_config::RankwatchConfigLoader;
    ///
    /// let config = RankwatchConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.stabilizer.scroll_step, 50);
    /// assert!(config.run_timeout().is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "RANKWATCH".into(),
        }
    }

    /// Read overrides from `<prefix>_*` instead of `RANKWATCH_*`.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred
    /// from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use rankwatch_config::RankwatchConfigLoader;
    ///
    /// let cfg = RankwatchConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// webdriver_url: "http://chromedriver:4444"
    /// stabilizer:
    ///   max_ticks: 500
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.webdriver_url, "http://chromedriver:4444");
    /// assert_eq!(cfg.stabilizer.max_ticks, 500);
    /// assert_eq!(cfg.stabilizer.tick_interval_ms, 25);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` references and deserialize.
    pub fn load(self) -> Result<RankwatchConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut merged: Value = cfg.try_deserialize()?;
        expand_placeholders(&mut merged);
        serde_json::from_value(merged).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn braced_reference_is_substituted() {
        temp_env::with_var("RW_HOST", Some("grid"), || {
            assert_eq!(expand_str("http://${RW_HOST}:4444"), "http://grid:4444");
        });
    }

    #[test]
    fn nested_values_are_walked() {
        temp_env::with_vars([("RW_A", Some("one")), ("RW_B", Some("two"))], || {
            let mut value = json!(["$RW_A", { "nested": "${RW_A}-${RW_B}" }, 7, null]);
            expand_placeholders(&mut value);
            assert_eq!(value, json!(["one", { "nested": "one-two" }, 7, null]));
        });
    }

    #[test]
    fn self_referencing_variables_terminate() {
        temp_env::with_vars([("RW_X", Some("${RW_Y}")), ("RW_Y", Some("${RW_X}"))], || {
            let out = expand_str("<${RW_X}>");
            assert!(out.starts_with("<${RW_") && out.ends_with('>'));
        });
    }

    #[test]
    fn unset_variable_is_kept_verbatim() {
        assert_eq!(expand_str("${RW_DOES_NOT_EXIST}/x"), "${RW_DOES_NOT_EXIST}/x");
    }
}
