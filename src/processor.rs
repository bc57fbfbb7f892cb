//! Public entry point
//!
//! [`process_content`] and [`ContentProcessor::process`] never fail. Any error
//! from any stage, and any panic inside one, yields the raw input with empty
//! citation and LaTeX registries so the renderer always has something to show.
//! There is no retry: the pipeline is deterministic, so a second run would fail
//! the same way.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use tracing::{trace, warn};

use crate::cache::{hash_str, LruCache};
use crate::config::MdshieldConfig;
use crate::content::{ProcessedContent, RenderMode, WorkingContent};
use crate::transforms::standard::{build_pipeline, pipeline_for, ContentTransform, PipelineOptions};
use crate::transforms::TransformError;

/// Process one message with the default pipeline for `mode`.
pub fn process_content(input: &str, mode: RenderMode) -> ProcessedContent {
    process_with(pipeline_for(mode), input)
}

/// Run `pipeline` over `input`, falling back to raw passthrough on failure.
pub fn process_with(pipeline: &ContentTransform, input: &str) -> ProcessedContent {
    match try_process_with(pipeline, input) {
        Ok(processed) => processed,
        Err(err) => {
            warn!(
                error = %err,
                bytes = input.len(),
                "content processing failed, passing input through"
            );
            ProcessedContent::passthrough(input)
        }
    }
}

/// Run `pipeline` over `input`, reporting failures instead of falling back.
///
/// A panic inside a stage is reported as a [`TransformError::Error`].
pub fn try_process_with(
    pipeline: &ContentTransform,
    input: &str,
) -> Result<ProcessedContent, TransformError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        pipeline.run(WorkingContent::new(input))
    }))
    .unwrap_or_else(|payload| Err(TransformError::Error(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("stage panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("stage panicked: {}", msg)
    } else {
        "stage panicked".to_string()
    }
}

/// A configured processor with its own pipelines and result cache.
///
/// Safe to share between threads; the cache sits behind a mutex.
pub struct ContentProcessor {
    assistant: Result<ContentTransform, TransformError>,
    user: Result<ContentTransform, TransformError>,
    cache: Option<Mutex<LruCache<(RenderMode, u64), CachedResult>>>,
}

/// A memoized result with the input it was computed from, so a hash collision
/// is a miss rather than another message's output.
#[derive(Debug, Clone)]
struct CachedResult {
    input: String,
    processed: ProcessedContent,
}

impl ContentProcessor {
    /// Build a processor from loaded configuration.
    pub fn new(config: &MdshieldConfig) -> Self {
        Self::from_options(config.pipeline_options(), config.cache.capacity)
    }

    /// Build a processor from pipeline options; a `cache_capacity` of 0
    /// disables memoization. A malformed extra LaTeX pattern is not reported
    /// here; every assistant-mode call falls back instead.
    pub fn from_options(options: PipelineOptions, cache_capacity: usize) -> Self {
        let cache = (cache_capacity > 0).then(|| Mutex::new(LruCache::new(cache_capacity)));
        Self {
            assistant: build_pipeline(&options, RenderMode::Assistant),
            user: build_pipeline(&options, RenderMode::User),
            cache,
        }
    }

    /// Process one message, falling back to raw passthrough on any failure.
    pub fn process(&self, input: &str, mode: RenderMode) -> ProcessedContent {
        match self.try_process(input, mode) {
            Ok(processed) => processed,
            Err(err) => {
                warn!(error = %err, ?mode, "content processing failed, passing input through");
                ProcessedContent::passthrough(input)
            }
        }
    }

    /// Process one message, reporting failures.
    pub fn try_process(
        &self,
        input: &str,
        mode: RenderMode,
    ) -> Result<ProcessedContent, TransformError> {
        let key = (mode, hash_str(input));
        if let Some(hit) = self.cached(&key, input) {
            trace!(?mode, "cache hit");
            return Ok(hit);
        }
        let pipeline = match mode {
            RenderMode::Assistant => &self.assistant,
            RenderMode::User => &self.user,
        };
        let pipeline = pipeline.as_ref().map_err(Clone::clone)?;
        let processed = try_process_with(pipeline, input)?;
        self.store(key, input, &processed);
        Ok(processed)
    }

    /// Number of memoized results
    pub fn cached_len(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| cache.lock().ok().map(|cache| cache.len()))
            .unwrap_or(0)
    }

    pub fn clear_cache(&self) {
        if let Some(mut cache) = self.cache.as_ref().and_then(|cache| cache.lock().ok()) {
            cache.clear();
        }
    }

    fn cached(&self, key: &(RenderMode, u64), input: &str) -> Option<ProcessedContent> {
        let hit = self.cache.as_ref()?.lock().ok()?.get(key)?;
        (hit.input == input).then_some(hit.processed)
    }

    fn store(&self, key: (RenderMode, u64), input: &str, processed: &ProcessedContent) {
        if let Some(mut cache) = self.cache.as_ref().and_then(|cache| cache.lock().ok()) {
            let entry = CachedResult {
                input: input.to_string(),
                processed: processed.clone(),
            };
            cache.insert(key, entry);
        }
    }
}

impl Default for ContentProcessor {
    fn default() -> Self {
        Self::from_options(PipelineOptions::default(), 0)
    }
}
