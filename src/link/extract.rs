use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::link::normalize::normalize_title;

/// `[[Title]]` on a single line; the first `]]` closes the reference.
const WIKILINK_PATTERN: &str = r"\[\[(.+?)\]\]";

static DEFAULT_EXTRACTOR: LazyLock<LinkExtractor> = LazyLock::new(LinkExtractor::new);

/// Pulls wiki-style title references out of a document body.
///
/// The pattern is compiled once per extractor; use [`LinkExtractor::shared`]
/// (or [`extract_links`]) to reuse the process-wide instance.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(WIKILINK_PATTERN).expect("wikilink pattern compiles"),
        }
    }

    pub fn shared() -> &'static LinkExtractor {
        &DEFAULT_EXTRACTOR
    }

    /// Referenced titles in order of first occurrence, trimmed, deduplicated
    /// case-insensitively. The first spelling of a title wins.
    pub fn extract(&self, body: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for caps in self.pattern.captures_iter(body) {
            let Some(inner) = caps.get(1) else {
                continue;
            };
            let title = inner.as_str().trim();
            if title.is_empty() {
                continue;
            }
            if seen.insert(normalize_title(title)) {
                out.push(title.to_string());
            }
        }
        out
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_links(body: &str) -> Vec<String> {
    LinkExtractor::shared().extract(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_link() {
        assert_eq!(
            extract_links("This is a [[Test Link]] in the text."),
            vec!["Test Link"]
        );
    }

    #[test]
    fn keeps_order_of_first_occurrence() {
        assert_eq!(
            extract_links("[[Link 2]] then [[Link 1]] then [[Link 2]]"),
            vec!["Link 2", "Link 1"]
        );
    }

    #[test]
    fn dedups_case_and_surrounding_whitespace() {
        assert_eq!(extract_links("[[Test]], [[test]] and [[ Test ]]"), vec!["Test"]);
    }

    #[test]
    fn first_spelling_wins() {
        assert_eq!(extract_links("[[  rust ]] [[Rust]] [[RUST]]"), vec!["rust"]);
    }

    #[test]
    fn empty_and_blank_references_are_dropped() {
        assert_eq!(extract_links("[[]]\n[[   ]]"), Vec::<String>::new());
        assert!(extract_links("[[]] should not be included").is_empty());
    }

    #[test]
    fn unterminated_reference_is_not_a_link() {
        assert_eq!(extract_links("open [[Dangling and more"), Vec::<String>::new());
        assert_eq!(
            extract_links("[[Broken\nacross lines]] but [[Fine]]"),
            vec!["Fine"]
        );
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert!(extract_links("No links in this text").is_empty());
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let body = "[[B]] [[a]] [[A]] [[c]] [[b]]";
        let extractor = LinkExtractor::new();
        let first = extractor.extract(body);
        let second = extractor.extract(body);
        assert_eq!(first, second);
        assert_eq!(first, vec!["B", "a", "c"]);
    }

    #[test]
    fn lazy_match_closes_at_first_marker() {
        assert_eq!(extract_links("[[One]]]] [[Two]]"), vec!["One", "Two"]);
    }
}
