//! # tablescope - dataset profiling and reporting
//!
//! Loads one tabular file (CSV, Excel, JSON or Parquet), computes a
//! statistical profile, renders charts, optionally asks an AI model for a
//! short narrative, and writes an HTML report with a sample export.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tablescope::config::PipelineConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut config = PipelineConfig::new("data.csv", "output");
//! config.allow_ai = false;
//!
//! let outcome = tablescope::pipeline::run(&config).await?;
//! println!("{}", outcome.profile);
//! println!("Report: {}", outcome.report.html.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: Loading and profiling
//!   - [`analyser::logic`]: Readers, statistics and the profile types
//! - [`ai`]: Optional narrative summary through a text-generation service
//! - [`plots`]: Chart selection and SVG rendering
//! - [`report`]: HTML report, sample CSV and profile JSON
//! - [`pipeline`]: The end-to-end run
//! - [`config`]: Run and AI settings
//! - [`error`]: Error types for fatal failures
//! - [`logging`]: Tracing setup for the binary
//!
//! ## Stages
//!
//! ```text
//! load ─> profile ─┬─> charts ────┬─> report
//!                  └─> AI summary ┘
//! ```
//!
//! Loading, profiling and report writing are fatal on failure. Charts and the
//! AI summary degrade: a failed chart is listed as omitted, a failed summary
//! is simply absent.

#![warn(clippy::all, rust_2018_idioms)]

pub mod ai;
pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod plots;
pub mod report;
pub mod utils;
