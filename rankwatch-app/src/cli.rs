use clap::Parser;
use rankwatch_config::RankwatchConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rankwatch",
    about = "Harvest the collection rankings list into a JSON file",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// How many pages of the rankings list to harvest
    pub nbr_of_pages: i64,

    /// Volume window: 1d, 7d, 30d or total
    pub duration: String,

    /// Chain: ethereum or solana
    pub chain: String,

    /// Where to write the JSON array
    pub output_path: PathBuf,

    /// Run the browser with a visible window
    #[arg(long)]
    pub debug: bool,

    /// Report progress on stderr
    #[arg(long)]
    pub logs: bool,

    /// Config file (defaults to ./rankwatch.yaml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint, e.g. a local chromedriver
    #[arg(long, value_name = "URL")]
    pub webdriver_url: Option<String>,

    /// Abort the harvest after this many seconds
    #[arg(long, value_name = "N")]
    pub timeout_secs: Option<u64>,
}

impl Cli {
    /// Flags win over file and environment values.
    pub fn apply_overrides(&self, config: &mut RankwatchConfig) {
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.run_timeout_secs = Some(secs);
        }
    }
}
