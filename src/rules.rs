//! Protection patterns, in the order they must run
//!
//! Code goes first so nothing inside a code span is ever seen by the later
//! passes. Monetary amounts go before LaTeX so `$100` is never read as an
//! opening math delimiter.

use crate::spans::{SpanKind, SpanRule};
use crate::transforms::TransformError;

/// Fenced code blocks, then inline code.
pub const FENCED_CODE: &str = r"(?s)```.*?```";
pub const INLINE_CODE: &str = r"`[^`\n]+`";

/// `$` amounts with optional thousands separators, decimals and a scale suffix
/// (`$5k`, `$2.5M`, `$1,200`, `$100 billion`). The amount is group 1; the `$`
/// must not follow another `$`, so `$$100 + 5$$` stays display math.
pub const MONETARY: &str = concat!(
    r"(?:^|[^$])(\$\d+(?:,\d{3})*(?:\.\d+)?",
    r"(?:[kKmMbBtT]\b|[ \t]+(?:thousand|million|billion|trillion|[kKMBT])\b)?)"
);

pub const LATEX_DOLLAR_BLOCK: &str = r"(?s)\$\$(.+?)\$\$";
pub const LATEX_BRACKET_BLOCK: &str = r"(?s)\\\[(.+?)\\\]";
pub const LATEX_PAREN_INLINE: &str = r"(?s)\\\((.+?)\\\)";
/// Single-line `$...$` whose body neither starts nor ends with whitespace.
pub const LATEX_DOLLAR_INLINE: &str = r"\$([^\s$](?:[^$\n]*?[^\s$])?)\$";
/// Bare sub/superscripted capitals such as `X_{ij}`, `E^2` or `A_1^n`, only at
/// the start of a line or after whitespace or `(`.
pub const LATEX_BARE: &str =
    r"(?m)(?:^|[\s(])([A-Z](?:_\{[^{}\n]+\}|\^\{[^{}\n]+\}|_[a-zA-Z0-9]|\^[a-zA-Z0-9])+)";

/// Which optional LaTeX heuristics are enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatexHeuristics {
    pub dollar_inline: bool,
    pub bare_expressions: bool,
}

impl Default for LatexHeuristics {
    fn default() -> Self {
        Self {
            dollar_inline: true,
            bare_expressions: true,
        }
    }
}

pub fn code_rules(size_limit: usize) -> Result<Vec<SpanRule>, TransformError> {
    Ok(vec![
        SpanRule::new(SpanKind::CodeSpan, FENCED_CODE, size_limit)?,
        SpanRule::new(SpanKind::CodeSpan, INLINE_CODE, size_limit)?,
    ])
}

pub fn monetary_rules(size_limit: usize) -> Result<Vec<SpanRule>, TransformError> {
    Ok(vec![
        SpanRule::new(SpanKind::MonetaryAmount, MONETARY, size_limit)?.with_span_group(1),
    ])
}

/// LaTeX rules: delimited blocks, delimited inline math, then the heuristics,
/// then any caller-supplied inline patterns.
pub fn latex_rules(
    size_limit: usize,
    heuristics: LatexHeuristics,
    extra_inline: &[String],
) -> Result<Vec<SpanRule>, TransformError> {
    let mut rules = vec![
        SpanRule::new(SpanKind::LatexBlock, LATEX_DOLLAR_BLOCK, size_limit)?
            .with_content_group(1),
        SpanRule::new(SpanKind::LatexBlock, LATEX_BRACKET_BLOCK, size_limit)?
            .with_content_group(1),
        SpanRule::new(SpanKind::LatexInline, LATEX_PAREN_INLINE, size_limit)?
            .with_content_group(1),
    ];
    if heuristics.dollar_inline {
        rules.push(
            SpanRule::new(SpanKind::LatexInline, LATEX_DOLLAR_INLINE, size_limit)?
                .with_content_group(1),
        );
    }
    if heuristics.bare_expressions {
        rules.push(
            SpanRule::new(SpanKind::LatexInline, LATEX_BARE, size_limit)?
                .with_span_group(1)
                .with_content_group(1),
        );
    }
    for pattern in extra_inline {
        rules.push(SpanRule::new(SpanKind::LatexInline, pattern, size_limit)?);
    }
    Ok(rules)
}
