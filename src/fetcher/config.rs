//! # Fetcher Configuration Module
//!
//! Configuration for the retrying fetcher and for the IMDb HTTP source.
//!
//! - `FetcherConfig`: retry budget and backoff unit
//! - `ImdbSourceConfig`: base URL, client signature headers and request timeout

use std::time::Duration;

/// Fewest attempts a fetch makes
pub const MIN_RETRY_ATTEMPTS: u32 = 1;

/// Most attempts a fetch makes
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the advisory fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Total attempts per identifier, including the first one
    pub max_retries: u32,

    /// Backoff before retry `n` is `n * backoff_unit`
    pub backoff_unit: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

/// Builder for FetcherConfig
#[derive(Debug, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetcherConfig::default(),
        }
    }

    /// Set the number of attempts
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the backoff unit
    pub fn backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.config.backoff_unit = backoff_unit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}

impl FetcherConfig {
    /// Create a new builder
    pub fn builder() -> FetcherConfigBuilder {
        FetcherConfigBuilder::new()
    }

    /// Attempts clamped to the supported range
    pub fn clamped_max_retries(&self) -> u32 {
        self.max_retries.clamp(MIN_RETRY_ATTEMPTS, MAX_RETRY_ATTEMPTS)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

/// Configuration for the IMDb parents guide source
#[derive(Debug, Clone)]
pub struct ImdbSourceConfig {
    /// Site root; pages live at `<base_url>/title/<id>/parentalguide`
    pub base_url: String,

    /// Client signature sent with every request
    pub user_agent: String,

    /// Language preference sent with every request
    pub accept_language: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ImdbSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.imdb.com/".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Builder for ImdbSourceConfig
#[derive(Debug, Default)]
pub struct ImdbSourceConfigBuilder {
    config: ImdbSourceConfig,
}

impl ImdbSourceConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ImdbSourceConfig::default(),
        }
    }

    /// Set the site root
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the Accept-Language header
    pub fn accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.config.accept_language = accept_language.into();
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ImdbSourceConfig {
        self.config
    }
}

impl ImdbSourceConfig {
    /// Create a new builder
    pub fn builder() -> ImdbSourceConfigBuilder {
        ImdbSourceConfigBuilder::new()
    }
}
