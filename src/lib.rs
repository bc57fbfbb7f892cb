//! # mdshield
//!
//! Prepares assistant-generated chat content for a markdown renderer.
//!
//! Raw model output mixes prose with code, currency amounts, LaTeX and loosely
//! formatted citations. Handing it straight to a markdown parser mangles code,
//! reads `$100` as a math delimiter and leaves sources as bare URLs. The content
//! pipeline runs, in this order:
//!
//! 1. code spans are swapped for placeholder tokens ([`spans`], [`rules`])
//! 2. monetary amounts likewise
//! 3. LaTeX blocks and inline math likewise, with their bodies recorded
//! 4. pipes inside link labels are escaped ([`link_pipes`])
//! 5. citations are rewritten into markdown links and numbered ([`citations`])
//! 6. code and monetary placeholders are restored
//!
//! The result ([`ProcessedContent`]) carries the text, the citation registry and
//! the LaTeX registry the renderer typesets in place of the remaining tokens.
//!
//! ```rust,ignore
//! use mdshield::{process_content, RenderMode};
//!
//! let out = process_content("Revenue hit $2.5M, see \\(x^2\\)", RenderMode::Assistant);
//! assert_eq!(out.processed_content, "Revenue hit $2.5M, see LATEXINLINE0END");
//! ```
//!
//! Processing never fails from the caller's point of view: on any error the
//! input comes back untouched with empty registries ([`processor`]).

pub mod cache;
pub mod citations;
pub mod config;
pub mod content;
pub mod export;
pub mod link_pipes;
pub mod processor;
pub mod rules;
pub mod spans;
pub mod transforms;

pub use citations::{CitationEntry, CitationRegistry};
pub use content::{LatexBlock, ProcessedContent, RenderMode, WorkingContent};
pub use processor::{process_content, ContentProcessor};
pub use spans::{ProtectedSpan, SpanKind};
pub use transforms::TransformError;
