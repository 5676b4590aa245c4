//! Machine-readable outputs next to the HTML report.

use anyhow::{Context as _, Result};
use std::path::Path;

use crate::analyser::logic::io::write_csv_head;
use crate::analyser::logic::types::{Dataset, Profile};

/// Rows kept in the sample export.
pub const SAMPLE_ROWS: usize = 10_000;

/// Writes the first [`SAMPLE_ROWS`] rows as CSV, whatever the input format.
pub fn write_sample(dataset: &Dataset, path: &Path) -> Result<usize> {
    write_csv_head(dataset.frame(), SAMPLE_ROWS, path)
}

/// Writes the profile as pretty-printed JSON.
///
/// Undefined statistics (NaN) are written as `null`.
pub fn write_profile_json(profile: &Profile, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(profile).context("Failed to serialize profile")?;
    std::fs::write(path, json).context("Failed to write profile JSON")?;
    Ok(())
}
