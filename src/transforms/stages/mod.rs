//! Individual transformation stages
//!
//! This module contains the individual stages that can be composed into pipelines.
//! Each stage implements the `Runnable` trait.

pub mod citations;
pub mod guard;
pub mod link_pipes;
pub mod output;
pub mod protection;
pub mod restoration;

pub use citations::NormalizeCitations;
pub use guard::GuardInput;
pub use link_pipes::EscapeLinkPipes;
pub use output::Finish;
pub use protection::ProtectSpans;
pub use restoration::RestorePlaceholders;
