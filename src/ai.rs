//! Optional AI summary of a dataset profile.
//!
//! The external service sits behind [`client::TextGenerator`]; the
//! summarizer decides whether to call it and turns every failure into
//! "no narrative" so a run never depends on the service.

#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod summarizer;

pub use client::{OpenAiGenerator, TextGenerator};
pub use summarizer::InsightSummarizer;
