//! Pipeline input, working state and output types

use serde::{Deserialize, Serialize};

use crate::citations::{CitationEntry, CitationRegistry};
use crate::spans::{SpanKind, SpanRegistry};

/// Whose message is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Full processing: LaTeX extraction and citation hover previews
    #[default]
    Assistant,
    /// User-typed text: no LaTeX rendering, no citation previews
    User,
}

/// The buffer threaded through every stage of one invocation
#[derive(Debug, Clone, Default)]
pub struct WorkingContent {
    pub text: String,
    pub spans: SpanRegistry,
    pub citations: CitationRegistry,
}

impl WorkingContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A LaTeX span the renderer typesets in place of its placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexBlock {
    pub id: String,
    pub content: String,
    pub is_block: bool,
}

/// Result of processing one message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedContent {
    /// Text with code and monetary spans restored and LaTeX still tokenized
    pub processed_content: String,
    pub citations: Vec<CitationEntry>,
    pub latex_blocks: Vec<LatexBlock>,
}

impl ProcessedContent {
    /// The raw-passthrough result used when processing fails
    pub fn passthrough(input: &str) -> Self {
        Self {
            processed_content: input.to_string(),
            citations: Vec::new(),
            latex_blocks: Vec::new(),
        }
    }

    pub fn latex_block(&self, id: &str) -> Option<&LatexBlock> {
        self.latex_blocks.iter().find(|block| block.id == id)
    }
}

impl From<WorkingContent> for ProcessedContent {
    fn from(working: WorkingContent) -> Self {
        // LaTeX bodies may have captured code or monetary tokens.
        let latex_blocks = working
            .spans
            .spans()
            .iter()
            .filter(|span| span.kind.is_latex())
            .map(|span| LatexBlock {
                id: span.id.clone(),
                content: working.spans.resolve(&span.content, &SpanKind::RESTORABLE),
                is_block: span.kind == SpanKind::LatexBlock,
            })
            .collect();
        Self {
            processed_content: working.text,
            citations: working.citations.into_entries(),
            latex_blocks,
        }
    }
}
