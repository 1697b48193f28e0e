//! Section locators for the sex & nudity advisory
//!
//! The advisory page has no stable schema, so the section is located by an ordered
//! list of independent strategies. Each returns the first matching container or
//! `None`; the parser stops at the first hit.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

/// A strategy that locates the advisory section in a document
pub type SectionLocator = for<'a> fn(&'a Html) -> Option<ElementRef<'a>>;

/// Strategies in the order they are tried
pub const SECTION_LOCATORS: &[(&str, SectionLocator)] = &[
    ("anchor", by_anchor),
    ("attribute", by_attribute_keyword),
    ("heading", by_heading_text),
    ("text", by_text_phrase),
];

/// Id of the advisory section on the classic layout
pub const ADVISORY_ANCHOR: &str = "advisory-nudity";

const ATTRIBUTE_KEYWORD: &str = "nudity";
const HEADING_KEYWORDS: [&str; 2] = ["sex", "nudity"];
const SECTION_PHRASES: [&str; 2] = ["sex & nudity", "sex and nudity"];
const CONTAINER_TAGS: [&str; 3] = ["section", "div", "article"];
const NON_CONTENT_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Parse a CSS selector, logging instead of failing
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Failed to parse selector '{}': {}", css, e);
            None
        }
    }
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

/// 1. The uniquely identified advisory section
pub fn by_anchor(document: &Html) -> Option<ElementRef<'_>> {
    first_match(document, &format!("#{}", ADVISORY_ANCHOR))
}

/// 2. Any element whose id or test id mentions nudity
pub fn by_attribute_keyword(document: &Html) -> Option<ElementRef<'_>> {
    first_match(
        document,
        &format!(
            "[id*=\"{kw}\"], [data-testid*=\"{kw}\"]",
            kw = ATTRIBUTE_KEYWORD
        ),
    )
}

/// 3. A section whose first heading mentions sex or nudity
pub fn by_heading_text(document: &Html) -> Option<ElementRef<'_>> {
    let sections = selector("section")?;
    let headings = selector("h2, h3, h4")?;

    document.select(&sections).find(|section| {
        section.select(&headings).next().is_some_and(|heading| {
            let text = heading.text().collect::<Vec<_>>().join(" ").to_lowercase();
            HEADING_KEYWORDS.iter().any(|kw| text.contains(kw))
        })
    })
}

/// 4. The container around a "Sex & Nudity" text node
///
/// Walks up from the text to the nearest section/div/article that holds list items
/// or paragraphs, falling back to the nearest container of any kind. Text inside
/// script, style or noscript elements is ignored, and every matching text node is
/// tried in document order until one yields a container.
pub fn by_text_phrase(document: &Html) -> Option<ElementRef<'_>> {
    let content = selector("li, p")?;

    document
        .root_element()
        .descendants()
        .filter(|node| {
            node.value().as_text().is_some_and(|text| {
                let lower = text.to_lowercase();
                SECTION_PHRASES.iter().any(|phrase| lower.contains(phrase))
            })
        })
        .filter(|node| {
            !node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| NON_CONTENT_TAGS.contains(&el.value().name()))
        })
        .find_map(|text_node| {
            let containers: Vec<ElementRef<'_>> = text_node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .filter(|el| CONTAINER_TAGS.contains(&el.value().name()))
                .collect();

            containers
                .iter()
                .find(|el| el.select(&content).next().is_some())
                .or_else(|| containers.first())
                .copied()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_of(el: Option<ElementRef<'_>>) -> Option<String> {
        el.and_then(|e| e.value().attr("id").map(str::to_string))
    }

    #[test]
    fn test_anchor() {
        let doc = Html::parse_document(
            r#"<section id="advisory-violence"></section><section id="advisory-nudity"></section>"#,
        );
        assert_eq!(id_of(by_anchor(&doc)).as_deref(), Some("advisory-nudity"));
    }

    #[test]
    fn test_attribute_keyword() {
        let doc = Html::parse_document(
            r#"<div data-testid="sub-section-violence"></div>
               <div id="x" data-testid="sub-section-nudity"></div>"#,
        );
        assert_eq!(by_anchor(&doc).map(|e| e.value().name().to_string()), None);
        assert_eq!(id_of(by_attribute_keyword(&doc)).as_deref(), Some("x"));
    }

    #[test]
    fn test_heading_uses_first_heading_only() {
        let doc = Html::parse_document(
            r#"<section id="outer">
                 <h2>Violence &amp; Gore</h2>
                 <section id="inner"><h3>SEX &amp; NUDITY</h3><ul><li>item</li></ul></section>
               </section>"#,
        );
        assert_eq!(id_of(by_heading_text(&doc)).as_deref(), Some("inner"));
    }

    #[test]
    fn test_text_phrase_walks_to_content_container() {
        let doc = Html::parse_document(
            r#"<div id="block">
                 <div id="title"><span>Sex and Nudity</span></div>
                 <ul><li>A man is briefly seen naked from behind.</li></ul>
               </div>"#,
        );
        assert_eq!(id_of(by_text_phrase(&doc)).as_deref(), Some("block"));
    }

    #[test]
    fn test_text_phrase_ignores_script_text() {
        let doc = Html::parse_document(
            r#"<body>
                 <div id="data"><script>{"category":"Sex & Nudity","items":[]}</script><p>Loading the guide content</p></div>
                 <div id="real">
                   <span>Sex &amp; Nudity</span><b>Severe</b>
                   <ul><li>Explicit sex scene with full frontal nudity.</li></ul>
                 </div>
               </body>"#,
        );
        assert_eq!(id_of(by_text_phrase(&doc)).as_deref(), Some("real"));
    }

    #[test]
    fn test_text_phrase_only_in_script() {
        let doc = Html::parse_document(
            r#"<body><div><script>var label = "sex and nudity";</script><p>Nothing here</p></div></body>"#,
        );
        assert!(by_text_phrase(&doc).is_none());
    }

    #[test]
    fn test_nothing_found() {
        let doc = Html::parse_document("<html><body><p>Violence only</p></body></html>");
        for (_, locate) in SECTION_LOCATORS {
            assert!(locate(&doc).is_none());
        }
    }
}
