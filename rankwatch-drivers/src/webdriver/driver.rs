use ::webdriver::capabilities::Capabilities;
use async_trait::async_trait;
use fantoccini::ClientBuilder;
use rankwatch_common::render::{LaunchOptions, RenderDriver, SessionLauncher};
use rankwatch_common::{DriverError, DriverResult};
use serde_json::json;
use std::collections::HashMap;
use tracing::info;
use url::Url;

use crate::webdriver::page::WebDriverPage;

/// Default Chromedriver endpoint.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Launches Chrome sessions through a running WebDriver service.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: Url,
    window_size: (u32, u32),
}

impl WebDriverLauncher {
    /// Target the WebDriver service at `webdriver_url`.
    pub fn new(webdriver_url: &str) -> DriverResult<Self> {
        let webdriver_url = Url::parse(webdriver_url).map_err(|e| {
            DriverError::Connect(format!("invalid webdriver url `{webdriver_url}`: {e}"))
        })?;
        Ok(Self {
            webdriver_url,
            window_size: (1920, 1080),
        })
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn webdriver_url(&self) -> &Url {
        &self.webdriver_url
    }

    /// Chrome arguments for a session.
    pub fn chrome_arguments(&self, opts: LaunchOptions) -> Vec<String> {
        let (width, height) = self.window_size;
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--no-sandbox".to_string(),
            format!("--window-size={width},{height}"),
        ];
        if opts.headless {
            args.push("--headless".to_string());
            args.push("--disable-gpu".to_string());
        } else {
            args.push("--start-maximized".to_string());
        }
        args
    }

    fn capabilities(&self, opts: LaunchOptions) -> Capabilities {
        let mut caps = Capabilities::new();
        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(self.chrome_arguments(opts)));
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
        caps
    }
}

#[async_trait]
impl SessionLauncher for WebDriverLauncher {
    async fn launch(&self, opts: LaunchOptions) -> DriverResult<Box<dyn RenderDriver>> {
        info!(
            target: "browser.session",
            webdriver = %self.webdriver_url,
            headless = opts.headless,
            "browser.session.connect"
        );
        let client = ClientBuilder::native()
            .capabilities(self.capabilities(opts))
            .connect(self.webdriver_url.as_str())
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        Ok(Box::new(WebDriverPage::new(client)))
    }
}
