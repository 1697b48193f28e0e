//! # Tagger Configuration Module
//!
//! User-facing settings for a tagging run, as read from a camelCase JSON file, and
//! their validated form.
//!
//! ## Key Components
//!
//! - `TaggerConfig`: raw settings, every field optional in JSON
//! - `Settings`: validated settings with numeric ranges clamped, handed to the
//!   pipeline and used to derive the component configs
//!
//! Out-of-range values never fail validation; they are clamped and logged at warn
//! level.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::advisory::SeverityLevel;
use crate::cache::{CacheConfig, MAX_TTL_HOURS, MIN_TTL_HOURS};
use crate::classifier::KeywordTable;
use crate::error::{Error, Result};
use crate::fetcher::{FetcherConfig, MAX_RETRY_ATTEMPTS, MIN_RETRY_ATTEMPTS};

/// Shortest allowed delay between network requests, in milliseconds
pub const MIN_REQUEST_DELAY_MS: u64 = 500;

/// Longest allowed delay between network requests, in milliseconds
pub const MAX_REQUEST_DELAY_MS: u64 = 60_000;

/// Longest tag prefix kept after trimming
pub const MAX_TAG_PREFIX_CHARS: usize = 50;

/// Raw configuration for a tagging run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaggerConfig {
    /// Lowest severity that produces category tags
    pub minimum_severity_to_tag: String,

    /// Prepended to every category tag
    pub tag_prefix: String,

    /// Cache time-to-live in hours
    pub cache_duration_hours: u32,

    /// Delay between network requests in milliseconds
    pub request_delay_ms: u64,

    /// Attempts per identifier
    pub max_retry_attempts: u32,

    /// Leave items that already carry a category tag alone
    pub skip_already_tagged: bool,

    /// Write content warnings into taglines and series overviews
    pub set_tagline: bool,

    /// Purge stale cache entries before a batch
    pub enable_cache_cleanup: bool,

    /// Cache directory
    pub cache_directory: PathBuf,

    /// Classifier keyword lists
    pub keywords: KeywordTable,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            minimum_severity_to_tag: "Mild".to_string(),
            tag_prefix: String::new(),
            cache_duration_hours: 168,
            request_delay_ms: 2000,
            max_retry_attempts: 3,
            skip_already_tagged: true,
            set_tagline: true,
            enable_cache_cleanup: true,
            cache_directory: CacheConfig::default().root,
            keywords: KeywordTable::default(),
        }
    }
}

/// Builder for TaggerConfig
#[derive(Debug, Default)]
pub struct TaggerConfigBuilder {
    config: TaggerConfig,
}

impl TaggerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: TaggerConfig::default(),
        }
    }

    pub fn minimum_severity_to_tag(mut self, severity: impl Into<String>) -> Self {
        self.config.minimum_severity_to_tag = severity.into();
        self
    }

    pub fn tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.tag_prefix = prefix.into();
        self
    }

    pub fn cache_duration_hours(mut self, hours: u32) -> Self {
        self.config.cache_duration_hours = hours;
        self
    }

    pub fn request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.request_delay_ms = delay_ms;
        self
    }

    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.max_retry_attempts = attempts;
        self
    }

    pub fn skip_already_tagged(mut self, skip: bool) -> Self {
        self.config.skip_already_tagged = skip;
        self
    }

    pub fn set_tagline(mut self, set: bool) -> Self {
        self.config.set_tagline = set;
        self
    }

    pub fn enable_cache_cleanup(mut self, enable: bool) -> Self {
        self.config.enable_cache_cleanup = enable;
        self
    }

    pub fn cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_directory = dir.into();
        self
    }

    pub fn keywords(mut self, keywords: KeywordTable) -> Self {
        self.config.keywords = keywords;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TaggerConfig {
        self.config
    }
}

/// Validated settings for a tagging run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub min_severity: SeverityLevel,
    pub tag_prefix: String,
    pub cache_duration_hours: u32,
    pub request_delay: Duration,
    pub max_retry_attempts: u32,
    pub skip_already_tagged: bool,
    pub set_tagline: bool,
    pub enable_cache_cleanup: bool,
    pub cache_directory: PathBuf,
    pub keywords: KeywordTable,
}

impl Settings {
    /// Cache configuration derived from these settings
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::builder()
            .root(self.cache_directory.clone())
            .ttl_hours(self.cache_duration_hours)
            .build()
    }

    /// Fetcher configuration derived from these settings
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::builder()
            .max_retries(self.max_retry_attempts)
            .build()
    }
}

impl Default for Settings {
    fn default() -> Self {
        TaggerConfig::default().validate()
    }
}

fn clamp_logged<T>(name: &str, value: T, min: T, max: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    let clamped = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if clamped != value {
        warn!("{} {} out of range {}..={}, using {}", name, value, min, max, clamped);
    }
    clamped
}

impl TaggerConfig {
    /// Create a new builder
    pub fn builder() -> TaggerConfigBuilder {
        TaggerConfigBuilder::new()
    }

    /// Load a configuration from a JSON file
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Validate into [`Settings`], clamping and defaulting bad values
    pub fn validate(&self) -> Settings {
        let min_severity = match self.minimum_severity_to_tag.trim().parse::<SeverityLevel>() {
            Ok(level) if level != SeverityLevel::Unknown => level,
            _ => {
                warn!(
                    "Invalid minimum severity {:?}, using {}",
                    self.minimum_severity_to_tag,
                    SeverityLevel::Mild
                );
                SeverityLevel::Mild
            }
        };

        let tag_prefix: String = self
            .tag_prefix
            .trim()
            .chars()
            .take(MAX_TAG_PREFIX_CHARS)
            .collect();

        let request_delay_ms = clamp_logged(
            "requestDelayMs",
            self.request_delay_ms,
            MIN_REQUEST_DELAY_MS,
            MAX_REQUEST_DELAY_MS,
        );

        Settings {
            min_severity,
            tag_prefix,
            cache_duration_hours: clamp_logged(
                "cacheDurationHours",
                self.cache_duration_hours,
                MIN_TTL_HOURS,
                MAX_TTL_HOURS,
            ),
            request_delay: Duration::from_millis(request_delay_ms),
            max_retry_attempts: clamp_logged(
                "maxRetryAttempts",
                self.max_retry_attempts,
                MIN_RETRY_ATTEMPTS,
                MAX_RETRY_ATTEMPTS,
            ),
            skip_already_tagged: self.skip_already_tagged,
            set_tagline: self.set_tagline,
            enable_cache_cleanup: self.enable_cache_cleanup,
            cache_directory: self.cache_directory.clone(),
            keywords: self.keywords.clone(),
        }
    }
}
