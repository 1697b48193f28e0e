//! Configuration for the advisory cache

use std::path::PathBuf;
use std::time::Duration;

/// Shortest allowed time-to-live, in hours
pub const MIN_TTL_HOURS: u32 = 1;

/// Longest allowed time-to-live, in hours (one year)
pub const MAX_TTL_HOURS: u32 = 8760;

/// Configuration for the advisory cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding one JSON file per identifier
    pub root: PathBuf,

    /// How long an entry is trusted, in hours
    pub ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".guidetag/cache"),
            ttl_hours: 168,
        }
    }
}

/// Builder for CacheConfig
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
        }
    }

    /// Set the cache directory
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the time-to-live in hours
    pub fn ttl_hours(mut self, ttl_hours: u32) -> Self {
        self.config.ttl_hours = ttl_hours;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

impl CacheConfig {
    /// Create a new builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// TTL in hours, clamped to the supported range
    pub fn clamped_ttl_hours(&self) -> u32 {
        self.ttl_hours.clamp(MIN_TTL_HOURS, MAX_TTL_HOURS)
    }

    /// TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.clamped_ttl_hours()) * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_clamped() {
        let config = CacheConfig::builder().ttl_hours(0).build();
        assert_eq!(config.ttl(), Duration::from_secs(3600));

        let config = CacheConfig::builder().ttl_hours(100_000).build();
        assert_eq!(config.clamped_ttl_hours(), MAX_TTL_HOURS);
    }
}
