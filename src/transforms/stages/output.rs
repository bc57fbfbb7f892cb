use crate::content::{ProcessedContent, WorkingContent};
use crate::transforms::{Runnable, TransformError};

/// Final stage: turns the working state into the renderer-facing result.
pub struct Finish;

impl Runnable<WorkingContent, ProcessedContent> for Finish {
    fn run(&self, input: WorkingContent) -> Result<ProcessedContent, TransformError> {
        Ok(ProcessedContent::from(input))
    }
}
