use anyhow::{Result, anyhow};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:8080";

pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(3);

/// Where and how long to scrape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Normalized `scheme://host:port` of the V2Ray API.
    pub endpoint: String,
    /// Single deadline shared by the dial and both queries of one scrape.
    pub scrape_timeout: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("http://{DEFAULT_ENDPOINT}"),
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
        }
    }
}

impl ScrapeConfig {
    /// Build a config from a user supplied `HOST:PORT` (or URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint cannot be normalized.
    pub fn new(endpoint: &str, scrape_timeout: Duration) -> Result<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            scrape_timeout,
        })
    }

    #[must_use]
    pub const fn with_timeout(mut self, scrape_timeout: Duration) -> Self {
        self.scrape_timeout = scrape_timeout;
        self
    }
}

/// Turn `HOST:PORT` into `http://HOST:PORT`; explicit `http`/`https` URLs are
/// accepted as long as they carry a host.
///
/// # Errors
///
/// Returns an error for unsupported schemes, missing hosts or unparsable input.
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let raw = raw.trim().trim_end_matches('/');

    if raw.is_empty() {
        return Err(anyhow!("V2Ray endpoint is empty"));
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| anyhow!("Invalid V2Ray endpoint '{raw}': {e}"))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(anyhow!(
            "Invalid V2Ray endpoint '{raw}': unsupported scheme '{scheme}'"
        ));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow!("Invalid V2Ray endpoint '{raw}': missing host"))?;

    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow!("Invalid V2Ray endpoint '{raw}': missing port"))?;

    Ok(format!("{scheme}://{host}:{port}"))
}
