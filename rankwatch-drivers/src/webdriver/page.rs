use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, Locator};
use rankwatch_common::render::{RenderDriver, WaitOptions};
use rankwatch_common::{DriverError, DriverResult};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Interval between probes while waiting for a selector to disappear.
const HIDDEN_POLL: Duration = Duration::from_millis(100);

/// Appends a script element so the injected declarations land in page scope.
const INJECT_SCRIPT: &str = r#"
    const el = document.createElement('script');
    el.type = 'text/javascript';
    el.textContent = arguments[0];
    (document.head || document.documentElement).appendChild(el);
    return true;
"#;

/// One browser page driven over WebDriver.
pub struct WebDriverPage {
    client: Option<Client>,
}

impl WebDriverPage {
    /// Wrap an existing WebDriver client.
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> DriverResult<&Client> {
        self.client.as_ref().ok_or(DriverError::Closed)
    }

    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        let client = self.client()?;
        let started = Instant::now();
        loop {
            let matches = client
                .find_all(Locator::Css(selector))
                .await
                .map_err(command_error)?;
            if matches.is_empty() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    waited: started.elapsed(),
                });
            }
            sleep(HIDDEN_POLL).await;
        }
    }
}

fn command_error(err: CmdError) -> DriverError {
    DriverError::Command(err.to_string())
}

fn lookup_error(err: CmdError, selector: &str, waited: Duration) -> DriverError {
    if err.is_no_such_element() {
        DriverError::NotFound(selector.to_string())
    } else if matches!(err, CmdError::WaitTimeout) {
        DriverError::Timeout {
            selector: selector.to_string(),
            waited,
        }
    } else {
        command_error(err)
    }
}

#[async_trait]
impl RenderDriver for WebDriverPage {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        debug!(target: "browser.page", %url, "browser.page.goto");
        self.client()?.goto(url).await.map_err(command_error)
    }

    async fn wait_until(&mut self, selector: &str, opts: WaitOptions) -> DriverResult<()> {
        if opts.hidden {
            return self.wait_hidden(selector, opts.timeout).await;
        }
        self.client()?
            .wait()
            .at_most(opts.timeout)
            .for_element(Locator::Css(selector))
            .await
            .map(|_| ())
            .map_err(|e| lookup_error(e, selector, opts.timeout))
    }

    async fn inject_script(&mut self, source: &str) -> DriverResult<()> {
        self.client()?
            .execute(INJECT_SCRIPT, vec![Value::String(source.to_string())])
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn click(&mut self, selector: &str) -> DriverResult<()> {
        let element = self
            .client()?
            .find(Locator::Css(selector))
            .await
            .map_err(|e| lookup_error(e, selector, Duration::ZERO))?;
        element.click().await.map_err(command_error)
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> DriverResult<Value> {
        self.client()?
            .execute(script, args)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn ready(&mut self) -> DriverResult<()> {
        self.client()?
            .current_url()
            .await
            .map(|_| ())
            .map_err(command_error)
    }

    async fn close(&mut self) -> DriverResult<()> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(command_error),
            None => {
                warn!(target: "browser.page", "browser.page.close_twice");
                Ok(())
            }
        }
    }
}
