//! # guidetag - Parental-guide content tagging for Rust
//!
//! This crate fetches IMDb "Parents Guide" pages, extracts the sex & nudity
//! advisory from their markup, classifies it into a small set of category tags and
//! merges those tags into media catalog items.
//!
//! ## Features
//!
//! - Strict identifier normalization before any filesystem or network access
//! - Time-bounded JSON file cache with path traversal protection
//! - Retrying fetcher with linear backoff and cooperative cancellation
//! - Multi-strategy HTML extraction that tolerates layout changes
//! - Keyword-driven, deterministic classification with configurable keyword lists
//! - Idempotent tag merge with optional content warnings
//! - Sequential batch driver with request pacing
//!
//! ## Example
//!
//! ```rust,no_run
//! use guidetag::cache::AdvisoryCache;
//! use guidetag::cancel::CancelToken;
//! use guidetag::config::TaggerConfig;
//! use guidetag::fetcher::{AdvisoryFetcher, ImdbSource};
//! use guidetag::pipeline::{CatalogItem, ItemKind, MemoryStore, Tagger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = TaggerConfig::default().validate();
//!     let fetcher = AdvisoryFetcher::new(
//!         ImdbSource::new()?,
//!         AdvisoryCache::new(settings.cache_config()),
//!         settings.fetcher_config(),
//!     );
//!     let mut tagger = Tagger::new(fetcher, MemoryStore::new(), settings, CancelToken::never());
//!
//!     let mut items = vec![CatalogItem::new("Heat", ItemKind::Movie).with_advisory_id("tt0113277")];
//!     let summary = tagger.run(&mut items, |done, total| println!("{done}/{total}")).await?;
//!
//!     println!("{:?} -> {:?}", summary, items[0].tags);
//!     Ok(())
//! }
//! ```

mod error;

pub mod advisory;
pub mod cache;
pub mod cancel;
pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod identifier;
pub mod parser;
pub mod pipeline;
pub mod tagging;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::advisory::{AdvisoryRecord, CategoryTag, SeverityLevel};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::identifier::{AdvisoryId, normalize};
}
