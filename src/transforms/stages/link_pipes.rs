use crate::content::WorkingContent;
use crate::link_pipes::escape_link_pipes;
use crate::transforms::{Runnable, TransformError};

/// Transform stage that escapes `|` inside markdown link labels.
pub struct EscapeLinkPipes;

impl EscapeLinkPipes {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EscapeLinkPipes {
    fn default() -> Self {
        Self::new()
    }
}

impl Runnable<WorkingContent, WorkingContent> for EscapeLinkPipes {
    fn run(&self, mut input: WorkingContent) -> Result<WorkingContent, TransformError> {
        input.text = escape_link_pipes(&input.text);
        Ok(input)
    }
}
