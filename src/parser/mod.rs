//! # Advisory Parser Module
//!
//! Turns a parents guide page into an [`AdvisoryRecord`]. Parsing never fails: a
//! page without a recognizable sex & nudity section yields a record with `Unknown`
//! severity and no descriptions.
//!
//! The section is located with the ordered strategies in [`strategies`]; severity,
//! votes and descriptions are then read by [`content_extraction`].

pub mod content_extraction;
pub mod strategies;

pub use content_extraction::{MIN_DESCRIPTION_CHARS, tokenize};
pub use strategies::{SECTION_LOCATORS, SectionLocator};

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use tracing::debug;

use crate::advisory::AdvisoryRecord;
use crate::identifier::AdvisoryId;

/// Locate the sex & nudity section, trying each strategy in order
pub fn locate_section(document: &Html) -> Option<ElementRef<'_>> {
    SECTION_LOCATORS.iter().find_map(|(name, locate)| {
        let section = locate(document)?;
        debug!("Advisory section located by {} strategy", name);
        Some(section)
    })
}

/// Parse `markup` into a record stamped with the current time
pub fn parse(markup: &str, id: &AdvisoryId) -> AdvisoryRecord {
    parse_at(markup, id, Utc::now())
}

/// Parse `markup` into a record stamped with `fetched_at`
pub fn parse_at(markup: &str, id: &AdvisoryId, fetched_at: DateTime<Utc>) -> AdvisoryRecord {
    let document = Html::parse_document(markup);
    let mut record = AdvisoryRecord::empty(id.clone(), fetched_at);

    let Some(section) = locate_section(&document) else {
        debug!("No sex & nudity section found for {}", id);
        return record;
    };

    record.severity = content_extraction::extract_severity(section);
    record.votes = content_extraction::extract_votes(section);
    record.descriptions = content_extraction::extract_descriptions(section);

    debug!(
        severity = %record.severity,
        descriptions = record.descriptions.len(),
        votes = record.votes.total(),
        "Parsed advisory for {}",
        id
    );
    record
}
