use tracing::debug;

use crate::citations::normalize_citations;
use crate::content::WorkingContent;
use crate::spans::SpanKind;
use crate::transforms::{Runnable, TransformError};

/// Transform stage that rewrites prose citations into markdown links and
/// fills the citation registry.
pub struct NormalizeCitations {
    bare_urls: bool,
}

impl NormalizeCitations {
    pub fn new(bare_urls: bool) -> Self {
        Self { bare_urls }
    }
}

impl Default for NormalizeCitations {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Runnable<WorkingContent, WorkingContent> for NormalizeCitations {
    fn run(&self, input: WorkingContent) -> Result<WorkingContent, TransformError> {
        let WorkingContent {
            text,
            spans,
            mut citations,
        } = input;
        let text = normalize_citations(&text, &mut citations, self.bare_urls, |s| {
            spans.resolve(s, &SpanKind::ALL)
        });
        debug!(citations = citations.len(), "citations normalized");
        Ok(WorkingContent {
            text,
            spans,
            citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_text_never_holds_tokens() {
        let mut working = WorkingContent::new("");
        let money = working.spans.mint(SpanKind::MonetaryAmount, "$2.5M", "$2.5M");
        working.text = format!("Budget Plan {} (https://gov.example/budget)", money);

        let out = NormalizeCitations::default().run(working).unwrap();
        assert_eq!(out.citations.entries()[0].text, "Budget Plan $2.5M");
        assert_eq!(
            out.text,
            "[Budget Plan MONETARY0END](https://gov.example/budget)"
        );
    }
}
