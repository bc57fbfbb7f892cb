//! Pipe escaping inside markdown link labels
//!
//! A `|` in `[a | b](url)` is read as a cell separator when the link sits in a
//! table row. Escaping it as `\|` keeps the label intact.

use once_cell::sync::Lazy;
use regex::Regex;

/// `[label](target)` where the label may hold one level of nested brackets and
/// the target one level of balanced parentheses.
pub static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[((?:[^\[\]\n]|\[[^\[\]\n]*\])+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)").unwrap()
});

/// Escape every unescaped `|` in `label`.
pub fn escape_pipes(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut escaped = false;
    for ch in label.chars() {
        if ch == '|' && !escaped {
            out.push('\\');
        }
        escaped = ch == '\\' && !escaped;
        out.push(ch);
    }
    out
}

/// Escape unescaped pipes in the label of every markdown link in `text`.
pub fn escape_link_pipes(text: &str) -> String {
    if !text.contains('|') {
        return text.to_string();
    }
    MARKDOWN_LINK
        .replace_all(text, |caps: &regex::Captures| {
            format!("[{}]({})", escape_pipes(&caps[1]), &caps[2])
        })
        .into_owned()
}
