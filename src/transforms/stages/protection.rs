use tracing::debug;

use crate::content::WorkingContent;
use crate::spans::{extract_spans, SpanRule};
use crate::transforms::{Runnable, TransformError};

/// Transform stage that replaces every match of its rules with placeholders.
///
/// Rules run in list order, each over the output of the previous one, so a
/// later rule never sees text an earlier rule protected.
pub struct ProtectSpans {
    name: &'static str,
    rules: Vec<SpanRule>,
}

impl ProtectSpans {
    pub fn new(name: &'static str, rules: Vec<SpanRule>) -> Self {
        Self { name, rules }
    }
}

impl Runnable<WorkingContent, WorkingContent> for ProtectSpans {
    fn run(&self, mut input: WorkingContent) -> Result<WorkingContent, TransformError> {
        let before = input.spans.spans().len();
        for rule in &self.rules {
            input.text = extract_spans(&input.text, rule, &mut input.spans);
        }
        debug!(
            stage = self.name,
            protected = input.spans.spans().len() - before,
            "spans protected"
        );
        Ok(input)
    }
}
