//! # Advisory Data Model
//!
//! Types shared by the parser, cache, classifier and tagging stages:
//!
//! - `SeverityLevel`: ordered severity of the advisory section
//! - `SeverityVotes`: per-level vote counts published next to the severity
//! - `AdvisoryRecord`: everything extracted for one identifier
//! - `CategoryTag`: the closed set of content tags this crate writes

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifier::AdvisoryId;

/// Severity of the sex & nudity advisory
///
/// `Unknown` sorts below `None`, so it fails every threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum SeverityLevel {
    #[default]
    Unknown,
    None,
    Mild,
    Moderate,
    Severe,
}

impl SeverityLevel {
    /// Levels that can be read off a page, highest priority first
    pub const DETECTABLE: [SeverityLevel; 4] = [
        SeverityLevel::Severe,
        SeverityLevel::Moderate,
        SeverityLevel::Mild,
        SeverityLevel::None,
    ];

    /// Lowercase keyword used on advisory pages
    pub fn keyword(&self) -> &'static str {
        match self {
            SeverityLevel::Unknown => "unknown",
            SeverityLevel::None => "none",
            SeverityLevel::Mild => "mild",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Severe => "severe",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeverityLevel::Unknown => "Unknown",
            SeverityLevel::None => "None",
            SeverityLevel::Mild => "Mild",
            SeverityLevel::Moderate => "Moderate",
            SeverityLevel::Severe => "Severe",
        };
        f.write_str(name)
    }
}

/// Error returned when a severity name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for SeverityLevel {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(SeverityLevel::Unknown),
            "none" => Ok(SeverityLevel::None),
            "mild" => Ok(SeverityLevel::Mild),
            "moderate" => Ok(SeverityLevel::Moderate),
            "severe" => Ok(SeverityLevel::Severe),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Community votes per severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityVotes {
    pub none: u32,
    pub mild: u32,
    pub moderate: u32,
    pub severe: u32,
}

impl SeverityVotes {
    /// Add `count` votes to `level`; `Unknown` is ignored
    pub fn add(&mut self, level: SeverityLevel, count: u32) {
        let slot = match level {
            SeverityLevel::None => &mut self.none,
            SeverityLevel::Mild => &mut self.mild,
            SeverityLevel::Moderate => &mut self.moderate,
            SeverityLevel::Severe => &mut self.severe,
            SeverityLevel::Unknown => return,
        };
        *slot = slot.saturating_add(count);
    }

    pub fn total(&self) -> u32 {
        self.none
            .saturating_add(self.mild)
            .saturating_add(self.moderate)
            .saturating_add(self.severe)
    }
}

/// Structured advisory data for one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRecord {
    /// Identifier the record was fetched for
    pub id: AdvisoryId,

    /// Severity of the sex & nudity section
    pub severity: SeverityLevel,

    /// Free-text descriptions in page order
    #[serde(default)]
    pub descriptions: Vec<String>,

    /// Vote counts, zero when the page publishes none
    #[serde(default)]
    pub votes: SeverityVotes,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl AdvisoryRecord {
    /// An empty record with `Unknown` severity
    pub fn empty(id: AdvisoryId, fetched_at: DateTime<Utc>) -> Self {
        Self {
            id,
            severity: SeverityLevel::Unknown,
            descriptions: Vec::new(),
            votes: SeverityVotes::default(),
            fetched_at,
        }
    }
}

/// Content tag written to catalog items
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryTag {
    NoNudity,
    BriefNudity,
    PartialNudity,
    FullNudity,
    SexualContent,
    GraphicSexualContent,
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 6] = [
        CategoryTag::NoNudity,
        CategoryTag::BriefNudity,
        CategoryTag::PartialNudity,
        CategoryTag::FullNudity,
        CategoryTag::SexualContent,
        CategoryTag::GraphicSexualContent,
    ];

    /// Human-readable tag name as written to the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::NoNudity => "No Nudity",
            CategoryTag::BriefNudity => "Brief Nudity",
            CategoryTag::PartialNudity => "Partial Nudity",
            CategoryTag::FullNudity => "Full Nudity",
            CategoryTag::SexualContent => "Sexual Content",
            CategoryTag::GraphicSexualContent => "Graphic Sexual Content",
        }
    }

    /// Tag name with the configured prefix in front
    pub fn prefixed(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.as_str())
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
