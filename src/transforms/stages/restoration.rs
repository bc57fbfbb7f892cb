use tracing::debug;

use crate::content::WorkingContent;
use crate::spans::SpanKind;
use crate::transforms::{Runnable, TransformError};

/// Transform stage that puts code and monetary spans back.
///
/// Restoration is a single pass over the working text and the citation
/// registry. That is enough only while no code or monetary span recorded a
/// placeholder in its own original text, so the invariant is checked first and
/// a violation fails the pipeline rather than leaking a token to the reader.
/// LaTeX placeholders stay; the renderer resolves them.
pub struct RestorePlaceholders;

impl RestorePlaceholders {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RestorePlaceholders {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<WorkingContent, WorkingContent> for RestorePlaceholders {
    fn run(&self, mut input: WorkingContent) -> Result<WorkingContent, TransformError> {
        input.spans.check_not_nested()?;
        input.text = input.spans.resolve(&input.text, &SpanKind::RESTORABLE);
        let spans = &input.spans;
        input
            .citations
            .map_entries(|s| spans.resolve(s, &SpanKind::RESTORABLE));
        debug!(
            code = input.spans.count(SpanKind::CodeSpan),
            monetary = input.spans.count(SpanKind::MonetaryAmount),
            "placeholders restored"
        );
        Ok(input)
    }
}
