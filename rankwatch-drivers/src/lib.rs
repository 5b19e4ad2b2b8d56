//! Driver layer for browser automation.
//!
//! This crate implements the render capabilities from `rankwatch-common`
//! on top of a WebDriver endpoint (Chromedriver by default).
//!
//! - [`webdriver::driver::WebDriverLauncher`]: connects new sessions
//! - [`webdriver::page::WebDriverPage`]: one live page driven through `fantoccini`
pub mod webdriver;
