//! Export-side preprocessing
//!
//! When a conversation is exported to a document there is no interactive
//! renderer: footnotes and citation keys need plain numbers, and math has to
//! survive as readable text. These passes operate on whole markdown documents.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::debug;

/// `[^label]: text` definitions, up to a blank line, the next definition or the end
static FOOTNOTE_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[\^([^\]\n]+)\]:[ \t]*").unwrap());
static FOOTNOTE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\^([^\]]+)\]").unwrap());
static PANDOC_CITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[@([^\]]+)\]").unwrap());
static DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").unwrap());
static BMATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{bmatrix\}(.*?)\\end\{bmatrix\}").unwrap());
static PMATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{pmatrix\}(.*?)\\end\{pmatrix\}").unwrap());
static ANY_MATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\begin\{([bp]?)matrix\}(.*?)\\end\{[bp]?matrix\}").unwrap());
static ROW_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\\|\\cr|\\0|\\n").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\,|\\;|\\:\s*").unwrap());
static STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\displaystyle|\\textstyle|\\scriptstyle").unwrap());
static TEXT_WRAPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:text|mathrm)\{([^}]*)\}").unwrap());
static FRAC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\frac\s*\{([^{}]+)\}\s*\{([^{}]+)\}").unwrap());
static GREEK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(lambda|alpha|beta|gamma|theta|tau|mu|Delta)\b").unwrap());

/// Number footnotes and pandoc-style citations.
///
/// Footnote definitions are removed from the body. `[^label]` references and
/// `[@key]` citations become `[n]`, numbered separately in first-seen order,
/// and a `## Notes` / `## Citations` appendix lists them.
pub fn number_references(md: &str) -> String {
    let (body, definitions) = take_footnote_definitions(md);

    let mut notes: Vec<String> = Vec::new();
    let body = FOOTNOTE_REF.replace_all(&body, |caps: &Captures| {
        format!("[{}]", first_seen_index(&mut notes, &caps[1]))
    });

    let mut keys: Vec<String> = Vec::new();
    let body = PANDOC_CITE.replace_all(&body, |caps: &Captures| {
        format!("[{}]", first_seen_index(&mut keys, &caps[1]))
    });

    let mut out = body.into_owned();
    if !notes.is_empty() {
        out.push_str("\n\n## Notes");
        for (i, label) in notes.iter().enumerate() {
            let text = definitions.get(label).map(String::as_str).unwrap_or(label);
            out.push_str(&format!("\n- [{}] {}", i + 1, text));
        }
    }
    if !keys.is_empty() {
        out.push_str("\n\n## Citations");
        for (i, key) in keys.iter().enumerate() {
            out.push_str(&format!("\n- [{}] {}", i + 1, key));
        }
    }
    debug!(notes = notes.len(), citations = keys.len(), "references numbered");
    out
}

fn first_seen_index(order: &mut Vec<String>, label: &str) -> usize {
    match order.iter().position(|seen| seen == label) {
        Some(idx) => idx + 1,
        None => {
            order.push(label.to_string());
            order.len()
        }
    }
}

/// Cut out footnote definitions, returning the remaining text and label → text.
///
/// A definition runs until a blank line, the start of the next definition or
/// the end of the document.
fn take_footnote_definitions(md: &str) -> (String, HashMap<String, String>) {
    let mut definitions = HashMap::new();
    let mut body = String::with_capacity(md.len());
    let mut last = 0;
    let starts: Vec<_> = FOOTNOTE_DEF.captures_iter(md).collect();
    for (i, caps) in starts.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < last {
            continue;
        }
        let next_def = starts
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(md.len());
        let rest = &md[whole.end()..next_def];
        let text_len = rest.find("\n\n").unwrap_or(rest.len());
        definitions.insert(
            label.as_str().to_string(),
            rest[..text_len].trim().to_string(),
        );
        body.push_str(&md[last..whole.start()]);
        last = whole.end() + text_len;
    }
    body.push_str(&md[last..]);
    (body, definitions)
}

/// Convert `$$...$$` display math to `\[...\]` with a trimmed body.
pub fn normalize_display_math(md: &str) -> String {
    DISPLAY_MATH
        .replace_all(md, |caps: &Captures| format!(r"\[{}\]", caps[1].trim()))
        .into_owned()
}

/// Rewrite `bmatrix` as `[a, b; c, d]` and `pmatrix` as `(a, b; c, d)`.
pub fn flatten_matrices(md: &str) -> String {
    let md = BMATRIX.replace_all(md, |caps: &Captures| format!("[{}]", flatten_cells(&caps[1])));
    PMATRIX
        .replace_all(&md, |caps: &Captures| format!("({})", flatten_cells(&caps[1])))
        .into_owned()
}

fn flatten_cells(body: &str) -> String {
    let rows = ROW_BREAK.replace_all(body, "; ");
    let cells = rows.replace('&', ", ");
    WHITESPACE.replace_all(&cells, " ").trim().to_string()
}

/// Reduce a LaTeX expression to readable ASCII.
///
/// Used where math cannot be typeset: spacing and style commands are dropped,
/// `\text{}` and `\mathrm{}` unwrapped, matrices flattened, `\frac{a}{b}`
/// written as `a/b` and common Greek letters spelled out.
pub fn simplify_latex(expr: &str) -> String {
    let s = SPACING.replace_all(expr, " ");
    let s = STYLE.replace_all(&s, "");
    let s = TEXT_WRAPPER.replace_all(&s, "$1");
    let s = ANY_MATRIX.replace_all(&s, |caps: &Captures| {
        let cells = flatten_cells(&caps[2]);
        if &caps[1] == "p" {
            format!("({})", cells)
        } else {
            format!("[{}]", cells)
        }
    });
    let s = FRAC.replace_all(&s, "$1/$2");
    GREEK.replace_all(&s, "$1").into_owned()
}

/// All document-level export passes in order.
pub fn prepare_for_export(md: &str) -> String {
    if md.is_empty() {
        return String::new();
    }
    let md = number_references(md);
    let md = normalize_display_math(&md);
    flatten_matrices(&md)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_footnotes_in_first_seen_order() {
        let md = "Alpha[^b] and beta[^a], again[^b].\n\n[^a]: First note\n[^b]: Second note";
        let out = number_references(md);
        assert_eq!(
            out,
            "Alpha[1] and beta[2], again[1].\n\n\n\n## Notes\n- [1] Second note\n- [2] First note"
        );
    }

    #[test]
    fn footnote_without_definition_uses_label() {
        let out = number_references("See[^src].");
        assert_eq!(out, "See[1].\n\n## Notes\n- [1] src");
    }

    #[test]
    fn numbers_pandoc_citations() {
        let out = number_references("As shown [@smith2020] and [@doe] and [@smith2020].");
        assert_eq!(
            out,
            "As shown [1] and [2] and [1].\n\n## Citations\n- [1] smith2020\n- [2] doe"
        );
    }

    #[test]
    fn no_references_no_appendix() {
        assert_eq!(number_references("plain text"), "plain text");
    }

    #[test]
    fn display_math_becomes_brackets() {
        assert_eq!(normalize_display_math("$$ x^2 $$"), r"\[x^2\]");
    }

    #[test]
    fn flattens_both_matrix_kinds() {
        let md = concat!(
            r"\begin{bmatrix} 1 & 2 \\ 3 & 4 \end{bmatrix}",
            r" and \begin{pmatrix}a & b\end{pmatrix}"
        );
        assert_eq!(flatten_matrices(md), "[1 , 2 ; 3 , 4] and (a , b)");
    }

    #[test]
    fn simplifies_latex_to_ascii() {
        assert_eq!(simplify_latex(r"\frac{a}{b}"), "a/b");
        assert_eq!(simplify_latex(r"\alpha + \beta"), "alpha + beta");
        assert_eq!(simplify_latex(r"\text{rate}\,\lambda"), "rate lambda");
        assert_eq!(simplify_latex(r"\displaystyle x"), " x");
        assert_eq!(
            simplify_latex(r"\begin{pmatrix}1 & 0\end{pmatrix}"),
            "(1 , 0)"
        );
    }

    #[test]
    fn prepare_runs_all_passes() {
        let out =
            prepare_for_export("Result[^n]: $$\\begin{bmatrix}1\\end{bmatrix}$$\n\n[^n]: Note");
        assert_eq!(out, "Result[1]: \\[[1]\\]\n\n\n\n## Notes\n- [1] Note");
    }
}
