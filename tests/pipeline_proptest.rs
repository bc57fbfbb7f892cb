//! Property-based tests for the content pipeline
//!
//! Messages are assembled from pieces that each exercise one protection rule,
//! then checked for the properties that must hold on any input:
//! - Code spans and monetary amounts come back byte-for-byte
//! - No code or monetary placeholder ever reaches the output or a citation

use mdshield::{process_content, ContentProcessor, RenderMode};
use proptest::prelude::*;
use regex::Regex;

/// Pieces that neither cite nor contain math once code and money are protected
fn literal_piece() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        "[a-z$| ]{1,10}".prop_map(|code| format!("`{}`", code)),
        "[a-z$| ]{0,20}".prop_map(|body| format!("```\n{}\n```", body)),
        "\\$[0-9]{1,4}(\\.[0-9]{1,2})?[kMB]?",
    ]
}

fn url() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", prop_oneof!["com", "org"], "[a-z]{0,6}")
        .prop_map(|(host, tld, path)| format!("https://{}.{}/{}", host, tld, path))
}

/// Pieces mixing citations and math with code and money
fn mixed_piece() -> impl Strategy<Value = String> {
    prop_oneof![
        literal_piece(),
        "[A-Z][a-z]{1,6}",
        url(),
        url().prop_map(|u| format!("({})", u)),
        url().prop_map(|u| format!("[Source]({})", u)),
        Just("[PDF]".to_string()),
        "[a-z]".prop_map(|v| format!("\\({}^2\\)", v)),
    ]
}

fn message(piece: impl Strategy<Value = String>) -> impl Strategy<Value = String> {
    prop::collection::vec(piece, 1..12).prop_map(|pieces| pieces.join(" "))
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #[test]
        fn code_and_money_round_trip(input in message(literal_piece())) {
            for mode in [RenderMode::Assistant, RenderMode::User] {
                let out = process_content(&input, mode);
                prop_assert_eq!(&out.processed_content, &input);
                prop_assert!(out.citations.is_empty());
                prop_assert!(out.latex_blocks.is_empty());
            }
        }

        #[test]
        fn placeholders_never_leak(input in message(mixed_piece())) {
            let leak = Regex::new(r"CODEBLOCK\d+END|MONETARY\d+END").unwrap();
            let processor = ContentProcessor::default();

            let out = processor.try_process(&input, RenderMode::Assistant);
            prop_assert!(out.is_ok(), "failed on {:?}: {:?}", input, out);
            let out = out.unwrap();

            prop_assert!(!leak.is_match(&out.processed_content), "{:?}", out);
            for citation in &out.citations {
                prop_assert!(!leak.is_match(&citation.text), "{:?}", citation);
                prop_assert!(!leak.is_match(&citation.link), "{:?}", citation);
                prop_assert!(citation.link.starts_with("https://"));
            }
        }

        #[test]
        fn citation_links_are_unique(input in message(mixed_piece())) {
            let out = process_content(&input, RenderMode::Assistant);
            let mut links: Vec<_> = out.citations.iter().map(|c| c.link.as_str()).collect();
            let total = links.len();
            links.sort_unstable();
            links.dedup();
            prop_assert_eq!(links.len(), total);
        }
    }
}
