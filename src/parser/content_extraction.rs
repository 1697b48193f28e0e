//! Content extraction from a located advisory section

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::strategies::selector;
use crate::advisory::{SeverityLevel, SeverityVotes};

/// Descriptions must be longer than this many characters
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Elements whose attributes mark them as carrying the severity rating
const SEVERITY_SELECTOR: &str = "[class*=\"severity\"], [id*=\"severity\"], \
     [data-testid*=\"severity\"], [class*=\"rating\"], [id*=\"rating\"], \
     [data-testid*=\"rating\"], [class*=\"status-pill\"]";

const DESCRIPTION_SELECTOR: &str = "li, p, div.ipc-html-content-inner-div";

const BOILERPLATE_WORDS: [&str; 2] = ["edit", "add"];
const TRAILING_CHROME: &str = " Edit";
const NAVIGATION_PREFIXES: [&str; 2] = ["see more", "see less"];

static VOTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d[\d,]*)\s+(?:of\s+\d[\d,]*\s+)?(?:found\s+this|votes?\s+for|voted)\s+(none|mild|moderate|severe)\b",
    )
    .expect("vote pattern is valid")
});

/// Text of an element with whitespace runs collapsed
///
/// Adjacent text nodes are separated by a space, so `<h3>A</h3><div>B</div>`
/// reads as "A B".
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase word tokens, split on anything that is not alphanumeric
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Highest-priority severity keyword appearing as a word in `text`
pub fn severity_in_text(text: &str) -> Option<SeverityLevel> {
    let tokens = tokenize(text);
    SeverityLevel::DETECTABLE
        .into_iter()
        .find(|level| tokens.iter().any(|t| t == level.keyword()))
}

/// Severity of a section
///
/// Rating-like elements are consulted first, then the section's full text.
pub fn extract_severity(section: ElementRef<'_>) -> SeverityLevel {
    if let Some(rating) = selector(SEVERITY_SELECTOR) {
        let from_rating = section
            .select(&rating)
            .find_map(|el| severity_in_text(&element_text(el)));
        if let Some(level) = from_rating {
            return level;
        }
    }

    severity_in_text(&element_text(section)).unwrap_or(SeverityLevel::Unknown)
}

/// Vote counts such as "27 of 40 found this moderate"
pub fn extract_votes(section: ElementRef<'_>) -> SeverityVotes {
    let text = element_text(section);
    let mut votes = SeverityVotes::default();

    for captures in VOTE_PATTERN.captures_iter(&text) {
        let count = captures[1].replace(',', "").parse::<u32>().unwrap_or(0);
        if let Ok(level) = captures[2].parse::<SeverityLevel>() {
            votes.add(level, count);
        }
    }

    votes
}

/// Whether a candidate description is page chrome rather than content
fn is_boilerplate(text: &str) -> bool {
    let first_word = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if BOILERPLATE_WORDS.contains(&first_word.as_str()) {
        return true;
    }

    let lower = text.to_lowercase();
    NAVIGATION_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Free-text descriptions in page order
///
/// Only the innermost matching elements are used, so a list item wrapping a
/// paragraph yields one description.
pub fn extract_descriptions(section: ElementRef<'_>) -> Vec<String> {
    let Some(items) = selector(DESCRIPTION_SELECTOR) else {
        return Vec::new();
    };

    section
        .select(&items)
        .filter(|el| !el.select(&items).any(|inner| inner.id() != el.id()))
        .map(|el| {
            let text = element_text(el);
            match text.strip_suffix(TRAILING_CHROME) {
                Some(stripped) => stripped.to_string(),
                None => text,
            }
        })
        .filter(|text| text.chars().count() > MIN_DESCRIPTION_CHARS)
        .filter(|text| !is_boilerplate(text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn section_of(doc: &Html) -> ElementRef<'_> {
        let sel = selector("section").unwrap();
        doc.select(&sel).next().unwrap()
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("Sex-scene, SEXY; woman's"),
            vec!["sex", "scene", "sexy", "woman", "s"]
        );
    }

    #[test]
    fn test_severity_priority() {
        assert_eq!(severity_in_text("Mild or Severe?"), Some(SeverityLevel::Severe));
        assert_eq!(severity_in_text("None"), Some(SeverityLevel::None));
        assert_eq!(severity_in_text("nonetheless mildly"), None);
    }

    #[test]
    fn test_rating_element_wins_over_text() {
        let doc = Html::parse_document(
            r#"<section>
                 <span class="advisory-severity">Mild</span>
                 <ul><li>Not severe at all, a moderate amount of kissing.</li></ul>
               </section>"#,
        );
        assert_eq!(extract_severity(section_of(&doc)), SeverityLevel::Mild);
    }

    #[test]
    fn test_severity_from_text_fallback() {
        let doc = Html::parse_document(
            "<section><h3>Sex &amp; Nudity</h3><div>Moderate</div></section>",
        );
        assert_eq!(extract_severity(section_of(&doc)), SeverityLevel::Moderate);

        let doc = Html::parse_document("<section><h3>Sex &amp; Nudity</h3></section>");
        assert_eq!(extract_severity(section_of(&doc)), SeverityLevel::Unknown);
    }

    #[test]
    fn test_adjacent_elements_do_not_merge_words() {
        let doc = Html::parse_document(
            "<section><h3>Sex &amp; Nudity</h3><div>Severe</div>\
             <ul><li><b>Brief</b>nudity in a shower scene.<a>Edit</a></li></ul></section>",
        );
        let section = section_of(&doc);

        assert_eq!(
            element_text(section),
            "Sex & Nudity Severe Brief nudity in a shower scene. Edit"
        );
        assert_eq!(extract_severity(section), SeverityLevel::Severe);
        assert_eq!(
            extract_descriptions(section),
            vec!["Brief nudity in a shower scene.".to_string()]
        );
    }

    #[test]
    fn test_votes() {
        let doc = Html::parse_document(
            r#"<section>
                 <a class="advisory-severity-vote__message">1,204 of 2,000 found this moderate</a>
                 <span>12 votes for mild</span>
               </section>"#,
        );
        let votes = extract_votes(section_of(&doc));
        assert_eq!(votes.moderate, 1204);
        assert_eq!(votes.mild, 12);
        assert_eq!(votes.severe, 0);
    }

    #[test]
    fn test_descriptions_filtered_and_ordered() {
        let doc = Html::parse_document(
            r#"<section>
                 <ul>
                   <li>A woman&#39;s breasts are   briefly seen.</li>
                   <li>Short one</li>
                   <li>Edit this content advisory entry</li>
                   <li>Add an item to this guide please</li>
                   <li>See more details about this</li>
                   <li><p>A couple have sex; we see thrusting &amp; moaning.</p></li>
                   <li>Additional kissing scene in a car.</li>
                 </ul>
               </section>"#,
        );
        assert_eq!(
            extract_descriptions(section_of(&doc)),
            vec![
                "A woman's breasts are briefly seen.".to_string(),
                "A couple have sex; we see thrusting & moaning.".to_string(),
                "Additional kissing scene in a car.".to_string(),
            ]
        );
    }
}
