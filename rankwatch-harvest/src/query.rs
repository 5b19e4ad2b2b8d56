//! Validation of the caller's rankings request.
use crate::error::ValidationError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Blockchain whose rankings are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Solana,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::Solana];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Solana => "solana",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == raw)
            .ok_or_else(|| ValidationError::UnknownChain {
                given: raw.to_string(),
                expected: join(Chain::ALL.iter().map(Chain::as_str)),
            })
    }
}

/// Time window the ranking is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeWindow {
    OneDay,
    SevenDays,
    ThirtyDays,
    Total,
}

impl VolumeWindow {
    pub const ALL: [VolumeWindow; 4] = [
        VolumeWindow::OneDay,
        VolumeWindow::SevenDays,
        VolumeWindow::ThirtyDays,
        VolumeWindow::Total,
    ];

    /// The short form accepted from callers (`1d`, `7d`, `30d`, `total`).
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeWindow::OneDay => "1d",
            VolumeWindow::SevenDays => "7d",
            VolumeWindow::ThirtyDays => "30d",
            VolumeWindow::Total => "total",
        }
    }

    /// The `sortBy` value the rankings page understands.
    pub fn sort_key(&self) -> &'static str {
        match self {
            VolumeWindow::OneDay => "one_day_volume",
            VolumeWindow::SevenDays => "seven_day_volume",
            VolumeWindow::ThirtyDays => "thirty_day_volume",
            VolumeWindow::Total => "total_volume",
        }
    }
}

impl fmt::Display for VolumeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeWindow {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        VolumeWindow::ALL
            .into_iter()
            .find(|window| window.as_str() == raw)
            .ok_or_else(|| ValidationError::UnknownDuration {
                given: raw.to_string(),
                expected: join(VolumeWindow::ALL.iter().map(VolumeWindow::as_str)),
            })
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// A validated rankings request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingsQuery {
    pages: u32,
    window: VolumeWindow,
    chain: Chain,
}

impl RankingsQuery {
    /// Validate the raw request.
    ///
    /// ```
    /// use rankwatch_harvest::query::{Chain, RankingsQuery};
    ///
    /// let query = RankingsQuery::new(2, "7d", "solana").unwrap();
    /// assert_eq!(query.pages(), 2);
    /// assert_eq!(query.chain(), Chain::Solana);
    /// assert!(RankingsQuery::new(0, "7d", "solana").is_err());
    /// ```
    pub fn new(nbr_of_pages: i64, duration: &str, chain: &str) -> Result<Self, ValidationError> {
        let chain = chain.parse::<Chain>()?;
        let window = duration.parse::<VolumeWindow>()?;
        let pages = u32::try_from(nbr_of_pages)
            .ok()
            .filter(|pages| *pages >= 1)
            .ok_or(ValidationError::PageCount(nbr_of_pages))?;
        Ok(Self {
            pages,
            window,
            chain,
        })
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn window(&self) -> VolumeWindow {
        self.window
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// `{base}/rankings?sortBy=<sort key>&chain=<chain>`.
    pub fn url(&self, base: &str) -> Result<Url, ValidationError> {
        let mut url = Url::parse(base)
            .and_then(|base| base.join("/rankings"))
            .map_err(|e| ValidationError::BaseUrl(format!("{base}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("sortBy", self.window.sort_key())
            .append_pair("chain", self.chain.as_str());
        Ok(url)
    }
}
