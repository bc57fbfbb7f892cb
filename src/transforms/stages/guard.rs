use tracing::debug;

use crate::content::WorkingContent;
use crate::spans::PLACEHOLDER;
use crate::transforms::{Runnable, TransformError};

/// Entry stage: rejects inputs the pipeline cannot process safely.
///
/// Oversized inputs are refused so pathological messages cost nothing, and
/// text that already contains placeholder-shaped tokens is refused because
/// restoration could not tell those apart from minted ones.
pub struct GuardInput {
    max_input_bytes: usize,
}

impl GuardInput {
    pub fn new(max_input_bytes: usize) -> Self {
        Self { max_input_bytes }
    }
}

impl Runnable<WorkingContent, WorkingContent> for GuardInput {
    fn run(&self, input: WorkingContent) -> Result<WorkingContent, TransformError> {
        let size = input.text.len();
        if size > self.max_input_bytes {
            return Err(TransformError::InputTooLarge {
                size,
                limit: self.max_input_bytes,
            });
        }
        if let Some(token) = PLACEHOLDER.find(&input.text) {
            return Err(TransformError::PlaceholderCollision(
                token.as_str().to_string(),
            ));
        }
        debug!(bytes = size, "input accepted");
        Ok(input)
    }
}
