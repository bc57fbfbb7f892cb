//! Citation normalization
//!
//! Assistant answers cite sources in many loose shapes:
//!
//! - `[label](url)`: already a markdown link, recorded as is
//! - `[PDF] Annual Report (url)` or `[PDF] Annual Report url`: bracketed tag plus title
//! - `Annual Report (url)`, `Annual Report: url`: a Title Case phrase of at
//!   most eight words. A longer capitalized run is prose, so only its URL is
//!   cited, as if bare.
//! - a bare `https://...` in prose
//!
//! The non-link shapes are rewritten to `[label](url)`. Every cited URL lands in
//! a [`CitationRegistry`] once, in first-seen order, which the renderer uses to
//! number citations and show hover previews.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;

use crate::link_pipes::escape_pipes;

/// URL body: no whitespace, quotes or brackets, with one level of balanced
/// parentheses allowed (`/wiki/Rust_(programming_language)`).
const URL: &str = r#"https?://(?:[^\s()<>\[\]"'`]|\([^\s()<>\[\]"'`]*\))+"#;

/// Title Case word: a capital or digit, then word characters
const TITLE_WORD: &str = r"[\p{Lu}0-9][\w'&.-]*";

/// One alternation, branches in priority order. The regex engine returns the
/// leftmost match and, at equal positions, the earliest branch, so a bracketed
/// label always wins over a plain phrase starting at the same place.
static CITATION: Lazy<Regex> = Lazy::new(|| {
    let pattern = [
        // existing markdown link
        format!(
            r"\[(?P<link_label>(?:[^\[\]\n]|\[[^\[\]\n]*\])+)\]\((?P<link_url>{target})\)",
            target = r"https?://(?:[^\s()]|\([^\s()]*\))+"
        ),
        // autolink, recorded untouched
        r"<(?P<auto_url>https?://[^\s<>]+)>".to_string(),
        // bracketed tag + title
        format!(
            r"(?P<tag_label>\[[^\[\]\n]{{1,40}}\][ \t]+[^\[\]()\n]{{1,200}}?)[ \t]*{tail}",
            tail = format!(r"(?:\((?P<tag_url>{url})\)|(?P<tag_bare>{url}))", url = URL)
        ),
        // Title Case phrase of up to eight words
        format!(
            r"\b(?P<phrase_label>{word}(?:[ \t]+{word}){{0,7}})[ \t]*{tail}",
            word = TITLE_WORD,
            tail = format!(
                r"(?:\((?P<phrase_url>{url})\)|[:\-–][ \t]+(?P<phrase_bare>{url}))",
                url = URL
            )
        ),
        // bare url
        format!(r"(?P<bare_url>{url})", url = URL),
    ];
    Regex::new(&pattern.join("|")).unwrap()
});

/// Characters stripped from the end of a captured URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':'];

/// Characters stripped from the end of a rewritten label
const LABEL_TRAILER: &[char] = &[' ', '\t', ':', '-', '–'];

/// A cited source, as shown in the hover preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationEntry {
    pub text: String,
    pub link: String,
}

/// Ordered, URL-deduplicated citations for one message
#[derive(Debug, Clone, Default)]
pub struct CitationRegistry {
    entries: Vec<CitationEntry>,
    index: HashMap<String, usize>,
}

impl CitationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a citation and return its 1-based display index.
    ///
    /// A URL that was already cited keeps its first index and text.
    pub fn record(&mut self, text: &str, link: &str) -> usize {
        if let Some(&idx) = self.index.get(link) {
            return idx + 1;
        }
        self.index.insert(link.to_string(), self.entries.len());
        self.entries.push(CitationEntry {
            text: text.to_string(),
            link: link.to_string(),
        });
        self.entries.len()
    }

    /// 1-based display index of a cited URL
    pub fn index_of(&self, link: &str) -> Option<usize> {
        self.index.get(link).map(|idx| idx + 1)
    }

    pub fn entries(&self) -> &[CitationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite every entry's text and link through `f`, merging entries whose
    /// links become equal.
    pub fn map_entries(&mut self, mut f: impl FnMut(&str) -> String) {
        let old = std::mem::take(&mut self.entries);
        self.index.clear();
        for entry in old {
            self.record(&f(&entry.text), &f(&entry.link));
        }
    }

    pub fn into_entries(self) -> Vec<CitationEntry> {
        self.entries
    }
}

/// Split sentence punctuation off the end of a URL.
///
/// Returns the cleaned URL and the stripped suffix.
pub fn clean_url(url: &str) -> (&str, &str) {
    let cleaned = url.trim_end_matches(TRAILING_PUNCTUATION);
    (cleaned, &url[cleaned.len()..])
}

/// Display label for a bare URL: its host without `www.`
pub fn host_label(url: &str) -> &str {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        url
    } else {
        host
    }
}

/// Rewrite citation shapes in `text` into markdown links and record them.
///
/// `resolve` maps placeholder tokens back to literal text; it is applied to the
/// label and URL before they are recorded, so the registry never holds tokens.
pub fn normalize_citations(
    text: &str,
    registry: &mut CitationRegistry,
    bare_urls: bool,
    resolve: impl Fn(&str) -> String,
) -> String {
    CITATION
        .replace_all(text, |caps: &Captures| {
            // Existing links keep their exact href so the renderer can look them up.
            if let (Some(label), Some(url)) = (caps.name("link_label"), caps.name("link_url")) {
                let label = label.as_str().trim().replace(r"\|", "|");
                registry.record(&resolve(&label), &resolve(url.as_str()));
                return caps[0].to_string();
            }
            if let Some(url) = caps.name("auto_url") {
                registry.record(&resolve(url.as_str()), &resolve(url.as_str()));
                return caps[0].to_string();
            }
            if let Some(label) = caps.name("tag_label") {
                return rewrite(
                    label.as_str(),
                    caps.name("tag_url"),
                    caps.name("tag_bare"),
                    registry,
                    &resolve,
                );
            }
            if let Some(label) = caps.name("phrase_label") {
                let url = caps.name("phrase_url").or_else(|| caps.name("phrase_bare"));
                if let Some(url) = url.filter(|_| continues_title_run(text, label.start())) {
                    // Too long to be a title: keep the prose, cite only the URL.
                    if !bare_urls {
                        return caps[0].to_string();
                    }
                    let whole = caps.get(0).map_or(url.range(), |m| m.range());
                    let cited = cite_bare(url.as_str(), registry, &resolve);
                    return format!(
                        "{}{}{}",
                        &text[whole.start..url.start()],
                        cited,
                        &text[url.end()..whole.end]
                    );
                }
                return rewrite(
                    label.as_str(),
                    caps.name("phrase_url"),
                    caps.name("phrase_bare"),
                    registry,
                    &resolve,
                );
            }
            match caps.name("bare_url") {
                Some(url) if bare_urls && !in_link_target(text, url.start()) => {
                    cite_bare(url.as_str(), registry, &resolve)
                }
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Whether the phrase starting at `start` is the tail of a longer Title Case
/// run, i.e. the word before it (on the same line) is capitalized too.
fn continues_title_run(text: &str, start: usize) -> bool {
    let lead = &text[..start];
    let trimmed = lead.trim_end_matches([' ', '\t']);
    if trimmed.len() == lead.len() {
        return false;
    }
    trimmed
        .rsplit(char::is_whitespace)
        .next()
        .and_then(|word| word.chars().next())
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
}

/// Whether a URL starting at `start` is already an href: a markdown link target
/// or an HTML attribute value.
fn in_link_target(text: &str, start: usize) -> bool {
    let lead = &text[..start];
    ["](", "=\"", "='", "="].iter().any(|opener| lead.ends_with(opener))
}

/// Rewrite a bare URL to `[host](url)`, keeping trailing punctuation outside.
fn cite_bare(
    url: &str,
    registry: &mut CitationRegistry,
    resolve: &impl Fn(&str) -> String,
) -> String {
    let (link, tail) = clean_url(url);
    let label = host_label(link);
    registry.record(&resolve(label), &resolve(link));
    format!("[{}]({}){}", escape_pipes(label), link, tail)
}

fn rewrite(
    label: &str,
    parenthesized: Option<regex::Match<'_>>,
    bare: Option<regex::Match<'_>>,
    registry: &mut CitationRegistry,
    resolve: &impl Fn(&str) -> String,
) -> String {
    let label = label.trim_end_matches(LABEL_TRAILER);
    let (link, tail) = match (parenthesized, bare) {
        (Some(url), _) => (clean_url(url.as_str()).0, ""),
        (None, Some(url)) => clean_url(url.as_str()),
        (None, None) => return label.to_string(),
    };
    registry.record(&resolve(label), &resolve(link));
    format!("[{}]({}){}", escape_pipes(label), link, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(text: &str) -> (String, CitationRegistry) {
        let mut registry = CitationRegistry::new();
        let out = normalize_citations(text, &mut registry, true, |s| s.to_string());
        (out, registry)
    }

    #[test]
    fn bracketed_label_with_parenthesized_url() {
        let (out, registry) =
            normalize("Check [PDF] Annual Report (https://example.com/report.pdf) for details.");
        assert_eq!(
            out,
            "Check [[PDF] Annual Report](https://example.com/report.pdf) for details."
        );
        assert_eq!(
            registry.entries(),
            &[CitationEntry {
                text: "[PDF] Annual Report".to_string(),
                link: "https://example.com/report.pdf".to_string(),
            }]
        );
    }

    #[test]
    fn bracketed_label_with_bare_url() {
        let (out, _) = normalize("[PDF] Annual Report https://example.com/r.pdf.");
        assert_eq!(out, "[[PDF] Annual Report](https://example.com/r.pdf).");
    }

    #[test]
    fn phrase_with_parenthesized_url() {
        let (out, registry) = normalize("the Climate Outlook (https://noaa.gov/outlook) says");
        assert_eq!(out, "the [Climate Outlook](https://noaa.gov/outlook) says");
        assert_eq!(registry.entries()[0].text, "Climate Outlook");
    }

    #[test]
    fn phrase_with_colon_url() {
        let (out, _) = normalize("Source: https://example.com/a");
        assert_eq!(out, "[Source](https://example.com/a)");
    }

    #[test]
    fn bare_url_gets_host_label_and_keeps_punctuation_outside() {
        let (out, registry) = normalize("See https://www.example.com/page.");
        assert_eq!(out, "See [example.com](https://www.example.com/page).");
        assert_eq!(registry.entries()[0].link, "https://www.example.com/page");
    }

    #[test]
    fn bare_urls_can_be_left_alone() {
        let mut registry = CitationRegistry::new();
        let text = "See https://example.com/page.";
        let out = normalize_citations(text, &mut registry, false, |s| s.to_string());
        assert_eq!(out, text);
        assert!(registry.is_empty());
    }

    #[test]
    fn existing_links_are_recorded_not_rewritten() {
        let text = "[Docs](https://docs.rs/regex) and <https://crates.io>";
        let (out, registry) = normalize(text);
        assert_eq!(out, text);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.index_of("https://crates.io"), Some(2));
    }

    #[test]
    fn repeated_url_reuses_index() {
        let (_, registry) =
            normalize("[Docs](https://a.com/x) and later Docs Page (https://a.com/x)");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.index_of("https://a.com/x"), Some(1));
        assert_eq!(registry.entries()[0].text, "Docs");
    }

    #[test]
    fn record_returns_one_based_index() {
        let mut registry = CitationRegistry::new();
        assert_eq!(registry.record("a", "https://a"), 1);
        assert_eq!(registry.record("b", "https://b"), 2);
        assert_eq!(registry.record("again", "https://a"), 1);
    }

    #[test]
    fn map_entries_merges_equal_links() {
        let mut registry = CitationRegistry::new();
        registry.record("one", "https://x/MONETARY0END");
        registry.record("two", "https://x/MONETARY1END");
        registry.map_entries(|s| s.replace("MONETARY0END", "$5").replace("MONETARY1END", "$5"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entries()[0].text, "one");
    }

    #[test]
    fn resolve_is_applied_to_recorded_text() {
        let mut registry = CitationRegistry::new();
        normalize_citations(
            "Price MONETARY0END (https://shop.com)",
            &mut registry,
            true,
            |s| s.replace("MONETARY0END", "$5"),
        );
        assert_eq!(registry.entries()[0].text, "Price $5");
    }

    #[test]
    fn clean_url_strips_sentence_punctuation() {
        assert_eq!(clean_url("https://a.com/x.;"), ("https://a.com/x", ".;"));
        assert_eq!(clean_url("https://a.com/x"), ("https://a.com/x", ""));
    }

    #[test]
    fn host_label_variants() {
        assert_eq!(host_label("https://www.example.com/a?b"), "example.com");
        assert_eq!(host_label("http://sub.example.org"), "sub.example.org");
    }

    #[test]
    fn pipe_in_rewritten_label_is_escaped() {
        let (out, registry) = normalize("[PDF] Q1 | Q2 Results (https://x.com/r.pdf)");
        assert_eq!(out, r"[[PDF] Q1 \| Q2 Results](https://x.com/r.pdf)");
        assert_eq!(registry.entries()[0].text, "[PDF] Q1 | Q2 Results");
    }

    #[test]
    fn link_target_with_parentheses_is_kept() {
        let text = "[Rust](https://en.wikipedia.org/wiki/Rust_(programming_language)) rocks";
        let (out, registry) = normalize(text);
        assert_eq!(out, text);
        assert_eq!(
            registry.entries(),
            &[CitationEntry {
                text: "Rust".to_string(),
                link: "https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string(),
            }]
        );
    }

    #[test]
    fn bare_url_with_parentheses() {
        let (out, registry) =
            normalize("See https://en.wikipedia.org/wiki/Rust_(programming_language).");
        assert_eq!(
            out,
            "See [en.wikipedia.org](https://en.wikipedia.org/wiki/Rust_(programming_language))."
        );
        assert_eq!(
            registry.entries()[0].link,
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
    }

    #[test]
    fn closing_paren_after_bare_url_stays_out() {
        let (out, _) = normalize("(see https://example.com/a)");
        assert_eq!(out, "(see [example.com](https://example.com/a))");
    }

    #[test]
    fn html_attribute_urls_are_left_alone() {
        let text = r#"<a href="https://x.com/a">x</a> and <img src='https://x.com/i.png'>"#;
        let (out, registry) = normalize(text);
        assert_eq!(out, text);
        assert!(registry.is_empty());
    }

    #[test]
    fn quotes_are_not_part_of_a_url() {
        let (out, registry) = normalize(r#"He said "https://x.com/a" twice"#);
        assert_eq!(out, r#"He said "[x.com](https://x.com/a)" twice"#);
        assert_eq!(registry.entries()[0].link, "https://x.com/a");
    }

    #[test]
    fn long_title_run_is_not_split() {
        let (out, registry) =
            normalize("One Two Three Four Five Six Seven Eight Nine (https://n.example/f)");
        assert_eq!(
            out,
            "One Two Three Four Five Six Seven Eight Nine ([n.example](https://n.example/f))"
        );
        assert_eq!(registry.entries()[0].text, "n.example");
    }

    #[test]
    fn long_title_run_without_bare_urls_is_untouched() {
        let mut registry = CitationRegistry::new();
        let text = "One Two Three Four Five Six Seven Eight Nine: https://a.com/x";
        let out = normalize_citations(text, &mut registry, false, |s| s.to_string());
        assert_eq!(out, text);
        assert!(registry.is_empty());
    }
}
