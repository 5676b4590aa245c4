//! End-to-end run: load, profile, chart and summarize, then write the report.
//!
//! ```no_run
//! use tablescope::config::PipelineConfig;
//! use tablescope::pipeline::run;
//!
//! # async fn demo() -> tablescope::error::Result<()> {
//! let config = PipelineConfig::new("data.csv", "output");
//! let outcome = run(&config).await?;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

pub mod executor;

pub use executor::{RunOutcome, run, run_with};
