//! Error taxonomy for a profiling run.
//!
//! Only the stages whose failure must stop the run have a variant here: the
//! loader, the profiler and the report writer. The summarizer and the chart
//! renderer never return these errors; they degrade to an absent narrative or
//! an omitted artifact instead.
//!
//! ```
//! use tablescope::error::PipelineError;
//!
//! fn exit_code(err: &PipelineError) -> i32 {
//!     match err {
//!         PipelineError::FileNotFound(_) => 2,
//!         PipelineError::UnsupportedFormat { .. } => 3,
//!         _ => 1,
//!     }
//! }
//! # assert_eq!(exit_code(&PipelineError::FileNotFound("x.csv".into())), 2);
//! ```

use std::path::PathBuf;

/// Fatal errors of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input path does not resolve to a file.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The file extension is not one of the supported formats.
    #[error("Unsupported format '{extension}'. Supported: .csv, .xlsx, .xls, .json, .parquet")]
    UnsupportedFormat { extension: String },

    /// The file exists but its content could not be decoded.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Profiling a well-formed dataset failed.
    #[error("Profiling failed: {0}")]
    Profiling(String),

    /// The report, the sample export or the profile JSON could not be written.
    #[error("Failed to write {}: {message}", .path.display())]
    ReportWrite { path: PathBuf, message: String },

    /// Any other I/O failure, e.g. an uncreatable output directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn parse(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Parse {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }

    pub fn report_write(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::ReportWrite {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::Profiling(err.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
