//! Chart artifacts for the report.
//!
//! The orchestrator decides which charts a profile calls for and in what
//! order; a [`ChartBackend`] turns prepared chart data into files. Every
//! artifact is attempted on its own, and the outcome of each one is
//! recorded in the [`VisualizationManifest`].

#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod manifest;
pub mod orchestrator;
pub mod svg;

pub use backend::ChartBackend;
pub use manifest::{ArtifactEntry, ArtifactKind, OmitReason, OmittedArtifact, VisualizationManifest};
pub use orchestrator::render;
pub use svg::SvgChartBackend;
