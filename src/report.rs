//! Report assembly: the HTML report, the sample export and the profile JSON.

pub mod export;
pub mod renderer;

use anyhow::Context as _;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analyser::logic::types::{Dataset, Narrative, Profile};
use crate::error::{PipelineError, Result};
use crate::plots::manifest::VisualizationManifest;

pub const REPORT_FILE: &str = "rapor.html";
pub const SAMPLE_FILE: &str = "veri_ornegi_ilk_10000.csv";
pub const PROFILE_FILE: &str = "profil.json";

/// Where the assembled outputs were written.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPaths {
    pub html: PathBuf,
    pub sample_csv: PathBuf,
    pub profile_json: PathBuf,
    pub sample_rows: usize,
}

/// Write every report output into `output_dir`, overwriting earlier runs.
///
/// # Errors
///
/// Returns [`PipelineError::ReportWrite`] naming the file that could not be
/// written. Files written before the failure are left in place.
pub fn assemble(
    profile: &Profile,
    narrative: Option<&Narrative>,
    manifest: &VisualizationManifest,
    dataset: &Dataset,
    output_dir: &Path,
) -> Result<ReportPaths> {
    let html_path = output_dir.join(REPORT_FILE);
    let source_name = dataset
        .source()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dataset.source().display().to_string());
    let html = renderer::render_html(profile, narrative, manifest, &source_name);
    std::fs::write(&html_path, html)
        .context("Failed to write HTML report")
        .map_err(|e| PipelineError::report_write(&html_path, &e))?;

    let sample_path = output_dir.join(SAMPLE_FILE);
    let sample_rows = export::write_sample(dataset, &sample_path)
        .map_err(|e| PipelineError::report_write(&sample_path, &e))?;

    let profile_path = output_dir.join(PROFILE_FILE);
    export::write_profile_json(profile, &profile_path)
        .map_err(|e| PipelineError::report_write(&profile_path, &e))?;

    tracing::info!(
        report = %html_path.display(),
        sample_rows,
        "Report written"
    );

    Ok(ReportPaths {
        html: html_path,
        sample_csv: sample_path,
        profile_json: profile_path,
        sample_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::{DataFormat, profile};
    use polars::prelude::*;

    fn dataset(rows: i64) -> Dataset {
        let ids: Vec<i64> = (0..rows).collect();
        let labels: Vec<String> = (0..rows).map(|i| format!("g{}", i % 3)).collect();
        let df = df!("id" => ids, "group" => labels).expect("frame");
        Dataset::new(df, "/some/where/rows.parquet", DataFormat::Parquet)
    }

    #[test]
    fn test_sample_export_caps_rows() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        for (rows, expected) in [(12_345, 10_000), (500, 500)] {
            let data = dataset(rows);
            let p = profile(&data)?;
            let paths = assemble(&p, None, &VisualizationManifest::default(), &data, dir.path())?;
            assert_eq!(paths.sample_rows, expected);
            let text = std::fs::read_to_string(&paths.sample_csv)?;
            assert_eq!(text.lines().count(), expected + 1, "header plus rows");
            assert!(text.starts_with("id,group\n0,g0\n"));
        }
        Ok(())
    }

    #[test]
    fn test_outputs_are_written() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let data = dataset(20);
        let p = profile(&data)?;
        let paths = assemble(&p, None, &VisualizationManifest::default(), &data, dir.path())?;

        let html = std::fs::read_to_string(&paths.html)?;
        assert!(html.contains("rows.parquet"));
        assert!(!html.contains("/some/where"), "no absolute paths in the report");

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&paths.profile_json)?)?;
        assert_eq!(json["row_count"], 20);
        assert_eq!(json["numeric_columns"][0], "id");
        Ok(())
    }

    #[test]
    fn test_unwritable_directory_is_report_write() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("not").join("there");
        let data = dataset(3);
        let p = profile(&data)?;
        let err = assemble(&p, None, &VisualizationManifest::default(), &data, &missing).unwrap_err();
        assert!(matches!(err, PipelineError::ReportWrite { .. }), "got {err}");
        Ok(())
    }
}
