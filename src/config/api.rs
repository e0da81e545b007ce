//! Remote API and fetch settings.

use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::parallel::DEFAULT_WORKERS;

pub const DEFAULT_BASE_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates?json&date=";

/// Where and how to reach the rates archive.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// URL prefix; the `dd.mm.YYYY` date is appended verbatim
    pub base_url: String,

    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: concat!("fxsnap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Batch fetch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum simultaneous requests (default: 10)
    pub max_concurrency: usize,

    /// Overall deadline for a batch in seconds, 0 disables it
    pub batch_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_WORKERS,
            batch_timeout_secs: 0,
        }
    }
}

impl FetchConfig {
    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_secs > 0).then(|| Duration::from_secs(self.batch_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_api_values() {
        let config = ApiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.user_agent.starts_with("fxsnap/"));
    }

    #[test]
    fn test_batch_timeout_zero_disables() {
        let config = FetchConfig::default();
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.batch_timeout(), None);

        let config = FetchConfig {
            batch_timeout_secs: 30,
            ..FetchConfig::default()
        };
        assert_eq!(config.batch_timeout(), Some(Duration::from_secs(30)));
    }
}
