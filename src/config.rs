//! Configuration loading.
//!
//! `defaults/mdshield.default.toml` is embedded into the crate so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`MdshieldConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

use crate::rules::LatexHeuristics;
use crate::transforms::standard::PipelineOptions;

const DEFAULT_TOML: &str = include_str!("../defaults/mdshield.default.toml");

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MdshieldConfig {
    pub pipeline: PipelineConfig,
    pub citations: CitationConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub max_input_bytes: usize,
    pub regex_size_limit: usize,
    pub detect_bare_latex: bool,
    pub dollar_inline_math: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitationConfig {
    pub bare_urls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

impl MdshieldConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_input_bytes: self.pipeline.max_input_bytes,
            regex_size_limit: self.pipeline.regex_size_limit,
            latex: LatexHeuristics {
                dollar_inline: self.pipeline.dollar_inline_math,
                bare_expressions: self.pipeline.detect_bare_latex,
            },
            bare_url_citations: self.citations.bare_urls,
            extra_latex_patterns: Vec::new(),
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MdshieldConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdshieldConfig, ConfigError> {
    Loader::new().build()
}
