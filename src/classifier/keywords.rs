//! Keyword tables driving the classifier signals
//!
//! The lists are data, not contract: they can be replaced wholesale from a JSON
//! config file.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Keyword lists for each classifier signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordTable {
    /// Explicit or frontal nudity
    pub full_nudity: Vec<String>,

    /// Explicit sexual activity
    pub graphic_sex: Vec<String>,

    /// Any sexual content
    pub sexual_content: Vec<String>,

    /// Nudity that is short or hard to see
    pub brief: Vec<String>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            full_nudity: owned(&[
                "full frontal",
                "fully nude",
                "completely nude",
                "full nudity",
                "genitalia",
                "genital",
                "genitals",
                "penis",
                "vagina",
                "pubic",
            ]),
            graphic_sex: owned(&[
                "graphic sex",
                "explicit sex",
                "sex scene",
                "sexual intercourse",
                "thrusting",
                "orgasm",
                "orgasms",
                "ejaculation",
                "masturbation",
            ]),
            sexual_content: owned(&[
                "sexual",
                "sex",
                "intercourse",
                "making love",
                "intimate",
                "moaning",
                "passion",
                "sensual",
                "erotic",
            ]),
            brief: owned(&[
                "brief",
                "quick",
                "fleeting",
                "glimpse",
                "blink",
                "moment",
                "background",
                "distant",
                "unclear",
            ]),
        }
    }
}

/// Keywords split into single words and multi-word phrases
#[derive(Debug, Clone, Default)]
pub(crate) struct KeywordMatcher {
    words: HashSet<String>,
    phrases: Vec<String>,
}

impl KeywordMatcher {
    pub(crate) fn new(keywords: &[String]) -> Self {
        let mut matcher = Self::default();
        for keyword in keywords {
            let keyword = keyword.trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            if keyword.chars().all(char::is_alphanumeric) {
                matcher.words.insert(keyword);
            } else {
                matcher.phrases.push(keyword);
            }
        }
        matcher
    }

    /// `text` must be lowercase; `tokens` are its word tokens
    pub(crate) fn matches(&self, text: &str, tokens: &HashSet<String>) -> bool {
        self.phrases.iter().any(|phrase| text.contains(phrase.as_str()))
            || self.words.iter().any(|word| tokens.contains(word))
    }
}
