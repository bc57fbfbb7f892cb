//! Protected spans and the placeholder registry
//!
//! A protected span is a piece of text (code, a currency amount, a LaTeX
//! expression) that later rewriting passes must not touch. [`extract_spans`]
//! cuts every match of a [`SpanRule`] out of the working text and leaves a
//! placeholder token of the form `<PREFIX><sequence>END` in its place, e.g.
//! `CODEBLOCK0END` or `MONETARY3END`. The [`SpanRegistry`] remembers what each
//! token stands for so it can be put back later.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;

use crate::transforms::TransformError;

/// Matches any token minted by a [`SpanRegistry`].
pub static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:CODEBLOCK|MONETARY|LATEXBLOCK|LATEXINLINE)\d+END").unwrap());

/// What a protected span holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    CodeSpan,
    MonetaryAmount,
    LatexBlock,
    LatexInline,
}

impl SpanKind {
    pub const ALL: [SpanKind; 4] = [
        SpanKind::CodeSpan,
        SpanKind::MonetaryAmount,
        SpanKind::LatexBlock,
        SpanKind::LatexInline,
    ];

    /// Kinds that are put back textually by the restoration pass.
    /// LaTeX stays tokenized for the renderer.
    pub const RESTORABLE: [SpanKind; 2] = [SpanKind::CodeSpan, SpanKind::MonetaryAmount];

    pub fn prefix(self) -> &'static str {
        match self {
            SpanKind::CodeSpan => "CODEBLOCK",
            SpanKind::MonetaryAmount => "MONETARY",
            SpanKind::LatexBlock => "LATEXBLOCK",
            SpanKind::LatexInline => "LATEXINLINE",
        }
    }

    pub fn is_latex(self) -> bool {
        matches!(self, SpanKind::LatexBlock | SpanKind::LatexInline)
    }

    fn slot(self) -> usize {
        match self {
            SpanKind::CodeSpan => 0,
            SpanKind::MonetaryAmount => 1,
            SpanKind::LatexBlock => 2,
            SpanKind::LatexInline => 3,
        }
    }
}

/// A substring replaced by a placeholder token during processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    /// The placeholder token standing in for this span
    pub id: String,
    /// The exact text that was cut out
    pub original_text: String,
    /// Delimiter-stripped, trimmed body. Equals `original_text` unless the rule
    /// names a content group.
    pub content: String,
    pub kind: SpanKind,
}

/// Ordered store of every span protected during one invocation
#[derive(Debug, Clone, Default)]
pub struct SpanRegistry {
    spans: Vec<ProtectedSpan>,
    by_id: HashMap<String, usize>,
    counters: [usize; 4],
}

impl SpanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a span and return its freshly minted token.
    pub fn mint(&mut self, kind: SpanKind, original_text: &str, content: &str) -> String {
        let slot = kind.slot();
        let id = format!("{}{}END", kind.prefix(), self.counters[slot]);
        self.counters[slot] += 1;
        self.by_id.insert(id.clone(), self.spans.len());
        self.spans.push(ProtectedSpan {
            id: id.clone(),
            original_text: original_text.to_string(),
            content: content.to_string(),
            kind,
        });
        id
    }

    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    pub fn of_kind(&self, kind: SpanKind) -> impl Iterator<Item = &ProtectedSpan> + '_ {
        self.spans.iter().filter(move |span| span.kind == kind)
    }

    pub fn count(&self, kind: SpanKind) -> usize {
        self.counters[kind.slot()]
    }

    pub fn get(&self, id: &str) -> Option<&ProtectedSpan> {
        self.by_id.get(id).map(|&idx| &self.spans[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Replace every token of the given kinds in `text` with its original text.
    ///
    /// Single pass: a token that appears inside a span's original text is not
    /// expanded again. Tokens of other kinds and unknown tokens are left alone.
    pub fn resolve(&self, text: &str, kinds: &[SpanKind]) -> String {
        if self.spans.is_empty() || !PLACEHOLDER.is_match(text) {
            return text.to_string();
        }
        PLACEHOLDER
            .replace_all(text, |caps: &regex::Captures| {
                let token = &caps[0];
                match self.get(token) {
                    Some(span) if kinds.contains(&span.kind) => span.original_text.clone(),
                    _ => token.to_string(),
                }
            })
            .into_owned()
    }

    /// Check that no restorable span recorded another token in its original text.
    ///
    /// Extraction order (code, then monetary, then LaTeX) makes this hold for
    /// every input without placeholder-shaped text, which is what lets
    /// restoration run in a single pass.
    pub fn check_not_nested(&self) -> Result<(), TransformError> {
        for span in self
            .spans
            .iter()
            .filter(|span| SpanKind::RESTORABLE.contains(&span.kind))
        {
            if let Some(nested) = PLACEHOLDER.find(&span.original_text) {
                return Err(TransformError::NestedPlaceholder {
                    id: span.id.clone(),
                    nested: nested.as_str().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A pattern that protects one kind of span
#[derive(Debug, Clone)]
pub struct SpanRule {
    pub kind: SpanKind,
    pub pattern: Regex,
    /// Capture group holding the protected text; 0 for the whole match.
    /// Text matched outside this group stays in the working string.
    pub span_group: usize,
    /// Capture group holding the span body, if it differs from the span itself
    pub content_group: Option<usize>,
}

impl SpanRule {
    /// Compile a rule, bounding the compiled pattern size.
    pub fn new(kind: SpanKind, pattern: &str, size_limit: usize) -> Result<Self, TransformError> {
        let pattern = RegexBuilder::new(pattern)
            .size_limit(size_limit)
            .build()
            .map_err(|e| TransformError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            kind,
            pattern,
            span_group: 0,
            content_group: None,
        })
    }

    pub fn with_span_group(mut self, group: usize) -> Self {
        self.span_group = group;
        self
    }

    pub fn with_content_group(mut self, group: usize) -> Self {
        self.content_group = Some(group);
        self
    }
}

/// Replace every match of `rule` in `text` with a placeholder token.
///
/// Matches are found left to right without overlap. The registry grows by
/// exactly one span per match, and none of the matched substrings survive in
/// the returned text. A pattern that does not match (an unterminated fence,
/// say) leaves the text unchanged.
pub fn extract_spans(text: &str, rule: &SpanRule, registry: &mut SpanRegistry) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in rule.pattern.captures_iter(text) {
        let Some(span) = caps.get(rule.span_group) else {
            continue;
        };
        let content = rule
            .content_group
            .and_then(|group| caps.get(group))
            .map(|m| m.as_str().trim())
            .unwrap_or(span.as_str());
        out.push_str(&text[last..span.start()]);
        out.push_str(&registry.mint(rule.kind, span.as_str(), content));
        last = span.end();
    }
    out.push_str(&text[last..]);
    out
}
