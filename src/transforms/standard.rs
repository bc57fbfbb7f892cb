//! Standard pipeline definitions
//!
//! [`build_pipeline`] assembles the stage sequence for a render mode:
//!
//! ```text
//! Assistant: Guard → Protect(code) → Protect(monetary) → Protect(latex)
//!            → EscapeLinkPipes → NormalizeCitations → RestorePlaceholders → Finish
//! User:      Guard → Protect(code) → Protect(monetary)
//!            → EscapeLinkPipes → RestorePlaceholders → Finish
//! ```
//!
//! User messages get neither LaTeX typesetting nor citation hover previews, so
//! those stages are left out rather than run and discarded.
//!
//! Pipelines with default options are available as static references built
//! with `once_cell::sync::Lazy`.

use once_cell::sync::Lazy;

use crate::content::{ProcessedContent, RenderMode, WorkingContent};
use crate::rules::{code_rules, latex_rules, monetary_rules, LatexHeuristics};
use crate::transforms::stages::{
    EscapeLinkPipes, Finish, GuardInput, NormalizeCitations, ProtectSpans, RestorePlaceholders,
};
use crate::transforms::{Transform, TransformError};

/// Type alias for a complete content pipeline
pub type ContentTransform = Transform<WorkingContent, ProcessedContent>;

pub const DEFAULT_MAX_INPUT_BYTES: usize = 256 * 1024;
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1024 * 1024;

/// Knobs that shape a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_input_bytes: usize,
    pub regex_size_limit: usize,
    pub latex: LatexHeuristics,
    pub bare_url_citations: bool,
    /// Additional inline-math patterns, applied after the built-in LaTeX rules
    pub extra_latex_patterns: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
            latex: LatexHeuristics::default(),
            bare_url_citations: true,
            extra_latex_patterns: Vec::new(),
        }
    }
}

impl PipelineOptions {
    /// Add an inline-math pattern. A malformed pattern is reported when the
    /// pipeline is built.
    pub fn with_extra_latex_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.extra_latex_patterns.push(pattern.into());
        self
    }
}

/// Assemble the pipeline for `mode`.
///
/// Fails only if a pattern does not compile, which for the built-in rules
/// means the size limit is too small, or an extra pattern is malformed.
pub fn build_pipeline(
    options: &PipelineOptions,
    mode: RenderMode,
) -> Result<ContentTransform, TransformError> {
    let limit = options.regex_size_limit;
    let mut pipeline = Transform::from_fn(Ok)
        .then(GuardInput::new(options.max_input_bytes))
        .then(ProtectSpans::new("code", code_rules(limit)?))
        .then(ProtectSpans::new("monetary", monetary_rules(limit)?));

    pipeline = match mode {
        RenderMode::Assistant => pipeline
            .then(ProtectSpans::new(
                "latex",
                latex_rules(limit, options.latex, &options.extra_latex_patterns)?,
            ))
            .then(EscapeLinkPipes::new())
            .then(NormalizeCitations::new(options.bare_url_citations)),
        RenderMode::User => pipeline.then(EscapeLinkPipes::new()),
    };

    Ok(pipeline.then(RestorePlaceholders::new()).then(Finish))
}

/// Assistant-message pipeline with default options
pub static ASSISTANT_PIPELINE: Lazy<ContentTransform> = Lazy::new(|| {
    build_pipeline(&PipelineOptions::default(), RenderMode::Assistant).unwrap()
});

/// User-message pipeline with default options
pub static USER_PIPELINE: Lazy<ContentTransform> =
    Lazy::new(|| build_pipeline(&PipelineOptions::default(), RenderMode::User).unwrap());

/// The default pipeline for `mode`
pub fn pipeline_for(mode: RenderMode) -> &'static ContentTransform {
    match mode {
        RenderMode::Assistant => &ASSISTANT_PIPELINE,
        RenderMode::User => &USER_PIPELINE,
    }
}
