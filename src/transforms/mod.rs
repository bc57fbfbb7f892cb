//! Transform pipeline infrastructure
//!
//! Every pass over a message is a stage implementing [`Runnable`]. Stages are
//! chained with [`Transform::then`], and the compiler checks that each stage's
//! input type matches the previous stage's output:
//!
//! ```rust,ignore
//! let pipeline = Transform::from_fn(Ok)
//!     .then(ProtectSpans::new("code", code_rules))     // WorkingContent → WorkingContent
//!     .then(RestorePlaceholders::new())                // WorkingContent → WorkingContent
//!     .then(Finish);                                   // WorkingContent → ProcessedContent
//! ```
//!
//! The pre-built pipelines live in [`standard`]; the individual passes in [`stages`].

pub mod stages;
pub mod standard;

use thiserror::Error;

/// Error that can occur while transforming content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Generic error with message
    #[error("{0}")]
    Error(String),
    /// A protection pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    /// Input exceeds the configured size cap
    #[error("Input is {size} bytes, limit is {limit}")]
    InputTooLarge { size: usize, limit: usize },
    /// Input already contains text shaped like a placeholder token
    #[error("Input contains reserved placeholder token '{0}'")]
    PlaceholderCollision(String),
    /// A restorable span recorded another span's placeholder in its original text
    #[error("Span '{id}' contains nested placeholder '{nested}'")]
    NestedPlaceholder { id: String, nested: String },
}

/// Trait for anything that can transform an input to an output
///
/// This is implemented by individual transformation stages.
/// The `Transform` struct composes multiple `Runnable` implementations.
pub trait Runnable<I, O> {
    /// Execute this transformation on the input
    fn run(&self, input: I) -> Result<O, TransformError>;
}

/// A composable transformation pipeline
///
/// `Transform<I, O>` represents a transformation from type `I` to type `O`.
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, TransformError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    /// Create a transform from a function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Add a stage to this transform, returning a new transform with extended output type
    ///
    /// This is the core composition method. It chains this transform's output into
    /// the next stage's input, creating a new transform from `I` to `O2`.
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                stage.run(intermediate)
            }),
        }
    }

    /// Execute this transform on the given input
    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.run_fn)(input)
    }
}

// Implement Runnable for Transform so transforms can be used as stages
impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}
