//! # Advisory Fetcher Module
//!
//! Read-through/write-through retrieval of advisory records for one identifier.
//!
//! ## Key Components
//!
//! - `AdvisoryFetcher`: consults the cache, retries the source with backoff, parses
//!   the page and writes the record back to the cache
//! - `AdvisorySource`: the network seam, implemented by `ImdbSource`
//! - `FetcherConfig` / `ImdbSourceConfig`: retry and HTTP settings
//!
//! ## Retry policy
//!
//! - A not-found answer is final and never retried
//! - Transient failures (timeouts, refused or dropped connections) are retried,
//!   waiting `attempt * backoff_unit` between attempts
//! - Any other failure ends the fetch immediately
//!
//! Spacing requests for different identifiers is the caller's job.

mod config;
mod error;
mod source;

pub use config::{
    DEFAULT_TIMEOUT_SECS, FetcherConfig, FetcherConfigBuilder, ImdbSourceConfig,
    ImdbSourceConfigBuilder, MAX_RETRY_ATTEMPTS, MIN_RETRY_ATTEMPTS,
};
pub use error::{FetchError, SourceError};
pub use source::{AdvisorySource, ImdbSource, Page};

use tracing::{debug, info, instrument, warn};

use crate::advisory::AdvisoryRecord;
use crate::cache::AdvisoryCache;
use crate::cancel::CancelToken;
use crate::identifier::AdvisoryId;
use crate::parser;

/// What a fetch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A parsed record
    Found(AdvisoryRecord),

    /// The source has no advisory page for this identifier
    NotFound,
}

/// Where a fetched record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

/// A fetch outcome together with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub outcome: FetchOutcome,
    pub origin: Origin,
}

/// Cache-backed, retrying advisory fetcher
#[derive(Debug, Clone)]
pub struct AdvisoryFetcher<S> {
    source: S,
    cache: AdvisoryCache,
    config: FetcherConfig,
}

impl<S: AdvisorySource> AdvisoryFetcher<S> {
    /// Create a fetcher over `source` and `cache`
    pub fn new(source: S, cache: AdvisoryCache, config: FetcherConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &AdvisoryCache {
        &self.cache
    }

    /// Cached record for `id`, without touching the network
    pub async fn cached(&self, id: &AdvisoryId) -> Result<Option<AdvisoryRecord>, FetchError> {
        Ok(self.cache.get(id).await?)
    }

    /// Fetch `id`, serving from the cache when a fresh entry exists
    pub async fn fetch(&self, id: &AdvisoryId, cancel: &CancelToken) -> Result<Fetched, FetchError> {
        if let Some(record) = self.cached(id).await? {
            return Ok(Fetched {
                outcome: FetchOutcome::Found(record),
                origin: Origin::Cache,
            });
        }

        let outcome = self.fetch_remote(id, cancel).await?;
        Ok(Fetched {
            outcome,
            origin: Origin::Network,
        })
    }

    /// Retrieve `id` from the source, bypassing the cache read
    ///
    /// A found page is parsed and written to the cache on a best-effort basis.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn fetch_remote(
        &self,
        id: &AdvisoryId,
        cancel: &CancelToken,
    ) -> Result<FetchOutcome, FetchError> {
        let max_attempts = self.config.clamped_max_retries();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "Requesting advisory page");

            let result = cancel
                .run(self.source.fetch_page(id))
                .await
                .map_err(|_| FetchError::Cancelled)?;

            match result {
                Ok(Page::NotFound) => {
                    info!("No advisory page exists for {}", id);
                    return Ok(FetchOutcome::NotFound);
                }
                Ok(Page::Found(markup)) => {
                    let record = parser::parse(&markup, id);
                    self.store(id, &record).await;
                    return Ok(FetchOutcome::Found(record));
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, max_attempts, id, e, delay
                    );
                    cancel
                        .sleep(delay)
                        .await
                        .map_err(|_| FetchError::Cancelled)?;
                }
                Err(e) if e.is_transient() => {
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => return Err(FetchError::Source(e)),
            }
        }
    }

    async fn store(&self, id: &AdvisoryId, record: &AdvisoryRecord) {
        if let Err(e) = self.cache.put(id, record).await {
            warn!("Error writing cache file for {}: {}", id, e);
        }
    }
}
