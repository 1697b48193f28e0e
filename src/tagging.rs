//! # Tag Merge Module
//!
//! Reconciles freshly classified tags with the tags an item already carries, and
//! builds the content warning shown as a tagline or prepended to an overview.
//!
//! Category tags are recognized in both bare and prefixed form, so tags written
//! under an older prefix are still replaced on the next run.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::advisory::CategoryTag;

/// Longest tag accepted for merging
pub const MAX_TAG_CHARS: usize = 100;

/// Longest tagline for single works
pub const MAX_TAGLINE_CHARS: usize = 500;

/// Longest warning prepended to a series overview
pub const MAX_SERIES_WARNING_CHARS: usize = 200;

/// Marker every generated warning starts with
pub const WARNING_GLYPH: char = '⚠';

const WARNING_PREFIX: &str = "⚠️ ";
const SERIES_WARNING_PREFIX: &str = "⚠️ Content Warning: ";
const ELLIPSIS: &str = "...";

/// Kind of catalog item, which decides where warnings go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Series,
    Episode,
}

/// Result of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The item's new tag list
    Updated(Vec<String>),

    /// No new tag survived sanitation; the item is left alone
    NoValidTags,
}

/// Every category tag in bare and prefixed form
pub fn recognized_tags(prefix: &str) -> HashSet<String> {
    CategoryTag::ALL
        .iter()
        .flat_map(|tag| [tag.as_str().to_string(), tag.prefixed(prefix)])
        .collect()
}

/// Whether `existing` already holds any category tag
pub fn has_category_tags(existing: &[String], prefix: &str) -> bool {
    let recognized = recognized_tags(prefix);
    existing.iter().any(|tag| recognized.contains(tag))
}

/// Trimmed, non-empty tags no longer than [`MAX_TAG_CHARS`]
pub fn sanitize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty() && tag.chars().count() <= MAX_TAG_CHARS)
        .collect()
}

/// Replace the category tags in `existing` with `new_tags`
///
/// Tags not owned by this crate keep their order; new tags are appended and the
/// result is deduplicated. Applying the same merge twice gives the same list.
pub fn merge<I, S>(existing: &[String], new_tags: I, prefix: &str) -> MergeOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let sanitized = sanitize_tags(new_tags);
    if sanitized.is_empty() {
        return MergeOutcome::NoValidTags;
    }

    let recognized = recognized_tags(prefix);
    let mut seen = HashSet::new();
    let merged = existing
        .iter()
        .filter(|tag| !recognized.contains(*tag))
        .cloned()
        .chain(sanitized)
        .filter(|tag| seen.insert(tag.clone()))
        .collect();

    MergeOutcome::Updated(merged)
}

fn strip_prefix<'a>(tag: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return tag;
    }
    tag.strip_prefix(prefix).unwrap_or(tag)
}

/// Cut `text` to `max_chars`, ending in "..." when shortened
fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Warning text for an item of `kind` carrying `tags`
///
/// Movies get a tagline, series a longer warning for the overview, episodes none.
pub fn content_warning<S: AsRef<str>>(kind: ItemKind, tags: &[S], prefix: &str) -> Option<String> {
    if tags.is_empty() {
        return None;
    }

    let joined = tags
        .iter()
        .map(|tag| strip_prefix(tag.as_ref(), prefix))
        .collect::<Vec<_>>()
        .join(", ");

    match kind {
        ItemKind::Movie => Some(truncate(
            format!("{}{}", WARNING_PREFIX, joined),
            MAX_TAGLINE_CHARS,
        )),
        ItemKind::Series => Some(truncate(
            format!("{}{}", SERIES_WARNING_PREFIX, joined),
            MAX_SERIES_WARNING_CHARS,
        )),
        ItemKind::Episode => None,
    }
}

/// Overview with `warning` in front
///
/// An overview that already starts with a warning is left as it is.
pub fn prepend_warning(overview: Option<&str>, warning: &str) -> Option<String> {
    match overview {
        None => Some(warning.to_string()),
        Some(text) if text.trim().is_empty() => Some(warning.to_string()),
        Some(text) if text.starts_with(WARNING_GLYPH) => Some(text.to_string()),
        Some(text) => Some(format!("{}\n\n{}", warning, text)),
    }
}
