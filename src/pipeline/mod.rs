//! # Tagging Pipeline Module
//!
//! Drives catalog items through normalization, fetch, classification and tag merge,
//! one item at a time.
//!
//! ## Key Components
//!
//! - `Tagger`: processes single items and whole batches
//! - `CatalogItem` / `CatalogStore`: the catalog-facing seam
//! - `RequestPacer`: keeps the configured delay between one network fetch
//!   finishing and the next one starting
//!
//! A failing item is counted and the batch moves on. Only cancellation ends a
//! batch early.

mod pacer;
mod store;

pub use pacer::RequestPacer;
pub use store::{CatalogItem, CatalogStore, MemoryStore, PersistError};

pub use crate::tagging::ItemKind;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::cancel::{CancelToken, Cancelled};
use crate::classifier::Classifier;
use crate::config::Settings;
use crate::fetcher::{AdvisoryFetcher, AdvisorySource, FetchError, FetchOutcome};
use crate::identifier::{AdvisoryId, normalize};
use crate::tagging::{self, MergeOutcome};

/// Why an item was left untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("already carries category tags")]
    AlreadyTagged,

    #[error("no advisory identifier")]
    MissingIdentifier,

    #[error("invalid advisory identifier: {0}")]
    InvalidIdentifier(String),

    #[error("identifier {0} already tagged in this batch")]
    AlreadyResolved(AdvisoryId),

    #[error("no advisory page for {0}")]
    NoAdvisory(AdvisoryId),

    #[error("no tags at the configured threshold")]
    NoTags,
}

/// Why an item could not be tagged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailReason {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("persist failed: {0}")]
    Persist(String),
}

/// Result of processing one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The tags applied
    Tagged(Vec<String>),
    Skipped(SkipReason),
    Failed(FailReason),
}

/// Counters for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub tagged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.processed += 1;
        match outcome {
            ItemOutcome::Tagged(_) => self.tagged += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Sequential tagger over a catalog store
pub struct Tagger<S, C> {
    fetcher: AdvisoryFetcher<S>,
    store: C,
    classifier: Classifier,
    settings: Settings,
    pacer: RequestPacer,
    cancel: CancelToken,
    resolved: HashSet<AdvisoryId>,
}

impl<S: AdvisorySource, C: CatalogStore> Tagger<S, C> {
    pub fn new(fetcher: AdvisoryFetcher<S>, store: C, settings: Settings, cancel: CancelToken) -> Self {
        Self {
            classifier: Classifier::new(&settings.keywords),
            pacer: RequestPacer::new(settings.request_delay),
            fetcher,
            store,
            settings,
            cancel,
            resolved: HashSet::new(),
        }
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Process one item, updating it in place once the store accepted the change
    #[instrument(skip_all, fields(item = %item.name))]
    pub async fn process_one(&mut self, item: &mut CatalogItem) -> Result<ItemOutcome, Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let prefix = self.settings.tag_prefix.as_str();
        if self.settings.skip_already_tagged && tagging::has_category_tags(&item.tags, prefix) {
            debug!("Skipping {}: already tagged", item.name);
            return Ok(ItemOutcome::Skipped(SkipReason::AlreadyTagged));
        }

        let Some(raw_id) = item.lookup_id() else {
            debug!("Skipping {}: no advisory identifier", item.name);
            return Ok(ItemOutcome::Skipped(SkipReason::MissingIdentifier));
        };

        let id = match normalize(raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {}: {}", item.name, e);
                return Ok(ItemOutcome::Skipped(SkipReason::InvalidIdentifier(e.to_string())));
            }
        };

        if item.kind == ItemKind::Episode && self.resolved.contains(&id) {
            debug!("Skipping episode {}: {} already tagged", item.name, id);
            return Ok(ItemOutcome::Skipped(SkipReason::AlreadyResolved(id)));
        }

        let record = match self.lookup(&id).await {
            Ok(FetchOutcome::Found(record)) => record,
            Ok(FetchOutcome::NotFound) => {
                warn!("No advisory found for {} ({})", item.name, id);
                return Ok(ItemOutcome::Skipped(SkipReason::NoAdvisory(id)));
            }
            Err(FetchError::Cancelled) => return Err(Cancelled),
            Err(e) => {
                warn!("Could not fetch advisory for {} ({}): {}", item.name, id, e);
                return Ok(ItemOutcome::Failed(FailReason::Fetch(e.to_string())));
            }
        };

        let tags: Vec<String> = self
            .classifier
            .classify(&record, self.settings.min_severity, prefix)
            .into_iter()
            .collect();
        if tags.is_empty() {
            debug!("No tags for {} at severity {}", item.name, record.severity);
            return Ok(ItemOutcome::Skipped(SkipReason::NoTags));
        }

        let Some(updated) = self.apply(item, &tags) else {
            warn!("No valid tags to apply for {}", item.name);
            return Ok(ItemOutcome::Skipped(SkipReason::NoTags));
        };

        if let Err(e) = self.store.persist(&updated).await {
            warn!("Could not persist {}: {}", item.name, e);
            return Ok(ItemOutcome::Failed(FailReason::Persist(e.to_string())));
        }

        *item = updated;
        self.resolved.insert(id);
        info!("Applied tags {} to {}", tags.join(", "), item.name);
        Ok(ItemOutcome::Tagged(tags))
    }

    /// Cached record, or a paced network fetch
    async fn lookup(&self, id: &AdvisoryId) -> Result<FetchOutcome, FetchError> {
        if let Some(record) = self.fetcher.cached(id).await? {
            debug!("Cache hit for {}", id);
            return Ok(FetchOutcome::Found(record));
        }

        self.pacer
            .ready(&self.cancel)
            .await
            .map_err(|_| FetchError::Cancelled)?;
        let outcome = self.fetcher.fetch_remote(id, &self.cancel).await;
        self.pacer.finished();
        outcome
    }

    /// Copy of `item` with `tags` merged in and warnings written
    fn apply(&self, item: &CatalogItem, tags: &[String]) -> Option<CatalogItem> {
        let prefix = self.settings.tag_prefix.as_str();
        let MergeOutcome::Updated(merged) = tagging::merge(&item.tags, tags, prefix) else {
            return None;
        };

        let mut updated = item.clone();
        updated.tags = merged;

        if self.settings.set_tagline {
            let sanitized = tagging::sanitize_tags(tags);
            match (item.kind, tagging::content_warning(item.kind, sanitized.as_slice(), prefix)) {
                (ItemKind::Movie, Some(warning)) => updated.tagline = Some(warning),
                (ItemKind::Series, Some(warning)) => {
                    updated.overview = tagging::prepend_warning(item.overview.as_deref(), &warning);
                }
                _ => {}
            }
        }

        Some(updated)
    }

    /// Process `items` in order, reporting `(done, total)` after each one
    ///
    /// Stale cache entries are purged first when cleanup is enabled.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn run<F>(&mut self, items: &mut [CatalogItem], mut progress: F) -> Result<BatchSummary, Cancelled>
    where
        F: FnMut(usize, usize),
    {
        if self.settings.enable_cache_cleanup {
            self.cleanup_cache().await;
        }

        let total = items.len();
        let mut summary = BatchSummary::default();
        info!("Starting tagging run over {} items", total);

        for item in items.iter_mut() {
            let outcome = match self.process_one(item).await {
                Ok(outcome) => outcome,
                Err(Cancelled) => {
                    info!(
                        processed = summary.processed,
                        tagged = summary.tagged,
                        "Tagging run cancelled"
                    );
                    return Err(Cancelled);
                }
            };
            summary.record(&outcome);
            progress(summary.processed, total);
        }

        info!(
            "Tagging run completed. Processed: {}, Tagged: {}, Skipped: {}, Failed: {}",
            summary.processed, summary.tagged, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn cleanup_cache(&self) {
        let cache = self.fetcher.cache();
        match cache.purge_older_than(cache.cleanup_cutoff()).await {
            Ok(report) if report.removed > 0 || report.failed > 0 => {
                info!(
                    "Cache cleanup removed {} stale entries ({} failed)",
                    report.removed, report.failed
                );
            }
            Ok(_) => debug!("Cache cleanup found nothing to remove"),
            Err(e) => warn!("Cache cleanup failed: {}", e),
        }
    }
}
