//! # Severity Classifier Module
//!
//! Maps an advisory record and a minimum severity to a deterministic set of
//! category tags.
//!
//! 1. Threshold gate: records below the minimum severity produce nothing, except
//!    that a `None` severity still yields "No Nudity"
//! 2. Keyword signals over the concatenated descriptions
//! 3. Tag derivation by severity level

mod keywords;

pub use keywords::KeywordTable;

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::advisory::{AdvisoryRecord, CategoryTag, SeverityLevel};
use crate::parser::tokenize;
use keywords::KeywordMatcher;

/// Keyword signals found in a record's descriptions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub has_full_nudity: bool,
    pub has_graphic_sex: bool,
    pub has_sex_content: bool,
    pub is_brief: bool,
}

/// Keyword-driven classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    full_nudity: KeywordMatcher,
    graphic_sex: KeywordMatcher,
    sexual_content: KeywordMatcher,
    brief: KeywordMatcher,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&KeywordTable::default())
    }
}

impl Classifier {
    pub fn new(keywords: &KeywordTable) -> Self {
        Self {
            full_nudity: KeywordMatcher::new(&keywords.full_nudity),
            graphic_sex: KeywordMatcher::new(&keywords.graphic_sex),
            sexual_content: KeywordMatcher::new(&keywords.sexual_content),
            brief: KeywordMatcher::new(&keywords.brief),
        }
    }

    /// Signals present in `descriptions`
    pub fn signals(&self, descriptions: &[String]) -> Signals {
        let text = descriptions.join(" ").to_lowercase();
        let tokens: HashSet<String> = tokenize(&text).into_iter().collect();

        Signals {
            has_full_nudity: self.full_nudity.matches(&text, &tokens),
            has_graphic_sex: self.graphic_sex.matches(&text, &tokens),
            has_sex_content: self.sexual_content.matches(&text, &tokens),
            is_brief: self.brief.matches(&text, &tokens),
        }
    }

    /// Category tags for `record` at threshold `min_severity`
    pub fn classify_categories(
        &self,
        record: &AdvisoryRecord,
        min_severity: SeverityLevel,
    ) -> BTreeSet<CategoryTag> {
        let mut tags = BTreeSet::new();

        if record.severity < min_severity {
            if record.severity == SeverityLevel::None {
                tags.insert(CategoryTag::NoNudity);
            }
            debug!(
                "Severity {} of {} is below threshold {}",
                record.severity, record.id, min_severity
            );
            return tags;
        }

        let signals = self.signals(&record.descriptions);
        debug!(?signals, "Keyword signals for {}", record.id);

        match record.severity {
            SeverityLevel::Severe => {
                if signals.has_graphic_sex {
                    tags.insert(CategoryTag::GraphicSexualContent);
                }
                tags.insert(CategoryTag::FullNudity);
            }
            SeverityLevel::Moderate => {
                if signals.has_sex_content {
                    tags.insert(CategoryTag::SexualContent);
                }
                tags.insert(if signals.has_full_nudity {
                    CategoryTag::FullNudity
                } else {
                    CategoryTag::PartialNudity
                });
            }
            SeverityLevel::Mild => {
                tags.insert(if signals.is_brief || !signals.has_sex_content {
                    CategoryTag::BriefNudity
                } else {
                    CategoryTag::SexualContent
                });
            }
            SeverityLevel::None => {
                tags.insert(CategoryTag::NoNudity);
            }
            SeverityLevel::Unknown => {}
        }

        tags
    }

    /// Prefixed tag strings for `record` at threshold `min_severity`
    pub fn classify(
        &self,
        record: &AdvisoryRecord,
        min_severity: SeverityLevel,
        prefix: &str,
    ) -> BTreeSet<String> {
        self.classify_categories(record, min_severity)
            .into_iter()
            .map(|tag| tag.prefixed(prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::normalize;
    use chrono::Utc;

    fn record(severity: SeverityLevel, descriptions: &[&str]) -> AdvisoryRecord {
        let mut record = AdvisoryRecord::empty(normalize("tt1234567").unwrap(), Utc::now());
        record.severity = severity;
        record.descriptions = descriptions.iter().map(|d| d.to_string()).collect();
        record
    }

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_none_below_threshold_still_tagged() {
        let classifier = Classifier::default();
        let tags = classifier.classify(&record(SeverityLevel::None, &[]), SeverityLevel::Mild, "CW: ");
        assert_eq!(tags, set(&["CW: No Nudity"]));
    }

    #[test]
    fn test_below_threshold_is_empty() {
        let classifier = Classifier::default();
        let mild = record(SeverityLevel::Mild, &["A brief glimpse of a bare back."]);
        assert!(classifier.classify(&mild, SeverityLevel::Severe, "").is_empty());

        let unknown = record(SeverityLevel::Unknown, &["Explicit sex scene."]);
        assert!(classifier.classify(&unknown, SeverityLevel::None, "").is_empty());
    }

    #[test]
    fn test_moderate_sensual_scene() {
        let classifier = Classifier::default();
        let moderate = record(SeverityLevel::Moderate, &["a brief sensual scene"]);
        assert_eq!(
            classifier.classify(&moderate, SeverityLevel::Mild, ""),
            set(&["Sexual Content", "Partial Nudity"])
        );
    }

    #[test]
    fn test_moderate_full_nudity() {
        let classifier = Classifier::default();
        let moderate = record(SeverityLevel::Moderate, &["Full frontal male nudity in a shower."]);
        assert_eq!(
            classifier.classify_categories(&moderate, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::FullNudity])
        );
    }

    #[test]
    fn test_severe_tags() {
        let classifier = Classifier::default();
        let graphic = record(SeverityLevel::Severe, &["A graphic sex scene with thrusting."]);
        assert_eq!(
            classifier.classify_categories(&graphic, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::GraphicSexualContent, CategoryTag::FullNudity])
        );

        let plain = record(SeverityLevel::Severe, &[]);
        assert_eq!(
            classifier.classify_categories(&plain, SeverityLevel::Severe),
            BTreeSet::from([CategoryTag::FullNudity])
        );
    }

    #[test]
    fn test_mild_variants() {
        let classifier = Classifier::default();

        let no_sex = record(SeverityLevel::Mild, &["A man is shirtless at the beach."]);
        assert_eq!(
            classifier.classify_categories(&no_sex, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::BriefNudity])
        );

        let sexual = record(SeverityLevel::Mild, &["A couple share an intimate kiss."]);
        assert_eq!(
            classifier.classify_categories(&sexual, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::SexualContent])
        );

        let brief_sexual = record(SeverityLevel::Mild, &["A quick intimate moment."]);
        assert_eq!(
            classifier.classify_categories(&brief_sexual, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::BriefNudity])
        );
    }

    #[test]
    fn test_word_boundaries() {
        let classifier = Classifier::default();
        let signals = classifier.signals(&["She wears a sexy dress in the momentum shot.".to_string()]);
        assert_eq!(signals, Signals::default());

        let signals = classifier.signals(&["They have SEX.".to_string()]);
        assert!(signals.has_sex_content);
    }

    #[test]
    fn test_deterministic() {
        let classifier = Classifier::default();
        let moderate = record(
            SeverityLevel::Moderate,
            &["Passionate kissing.", "A sex scene with brief nudity."],
        );
        let first = classifier.classify(&moderate, SeverityLevel::None, "x-");
        for _ in 0..10 {
            assert_eq!(classifier.classify(&moderate, SeverityLevel::None, "x-"), first);
        }
    }

    #[test]
    fn test_custom_keywords() {
        let table = KeywordTable {
            sexual_content: vec!["smooch".to_string()],
            ..KeywordTable::default()
        };
        let classifier = Classifier::new(&table);
        let moderate = record(SeverityLevel::Moderate, &["One smooch."]);
        assert_eq!(
            classifier.classify_categories(&moderate, SeverityLevel::Mild),
            BTreeSet::from([CategoryTag::SexualContent, CategoryTag::PartialNudity])
        );
    }
}
