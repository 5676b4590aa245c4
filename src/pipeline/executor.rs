//! Runs one profiling job from input file to report.
//!
//! Loading and profiling run on the blocking pool. The chart renderer and the
//! AI summarizer then run concurrently; the summarizer's network call never
//! delays rendering, and both finish before the report is assembled.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::InsightSummarizer;
use crate::analyser::logic::types::{Dataset, Narrative, Profile};
use crate::analyser::logic::{load, profile};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::plots::{ChartBackend, SvgChartBackend, VisualizationManifest, render};
use crate::report::{ReportPaths, assemble};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub profile: Arc<Profile>,
    pub narrative: Option<Narrative>,
    pub manifest: VisualizationManifest,
    pub report: ReportPaths,
    pub duration: Duration,
}

impl RunOutcome {
    /// One-line summary for the console.
    pub fn summary(&self) -> String {
        format!(
            "Run completed: {} rows, {} columns, {} charts ({} omitted), AI summary {}, {:.2}s",
            self.profile.row_count,
            self.profile.column_count,
            self.manifest.entries.len(),
            self.manifest.omitted.len(),
            if self.narrative.is_some() {
                "included"
            } else {
                "not included"
            },
            self.duration.as_secs_f64()
        )
    }
}

/// Run the pipeline with the production summarizer and SVG charts.
///
/// # Errors
///
/// Fails when the input cannot be loaded or profiled, or when the output
/// directory or report files cannot be written. Chart and AI failures are
/// not errors.
pub async fn run(config: &PipelineConfig) -> Result<RunOutcome> {
    let summarizer = InsightSummarizer::from_config(config.effective_ai());
    run_with(config, &summarizer, Arc::new(SvgChartBackend::new())).await
}

/// Run the pipeline with an explicit summarizer and chart backend.
///
/// # Errors
///
/// See [`run`].
pub async fn run_with(
    config: &PipelineConfig,
    summarizer: &InsightSummarizer,
    backend: Arc<dyn ChartBackend>,
) -> Result<RunOutcome> {
    let start = std::time::Instant::now();
    tracing::info!(input = %config.input.display(), output = %config.output_dir.display(), "Run started");

    let input = config.input.clone();
    let (dataset, profile) = tokio::task::spawn_blocking(move || -> Result<(Dataset, Profile)> {
        let dataset = load(&input)?;
        let profile = profile(&dataset)?;
        Ok((dataset, profile))
    })
    .await
    .map_err(|e| PipelineError::Io(std::io::Error::other(e)))??;

    std::fs::create_dir_all(&config.output_dir)?;

    let dataset = Arc::new(dataset);
    let profile = Arc::new(profile);

    let charts = render_charts(config, &dataset, &profile, backend);
    let (manifest, narrative) = tokio::join!(charts, summarizer.summarize(&profile));

    let report = assemble(
        &profile,
        narrative.as_ref(),
        &manifest,
        &dataset,
        &config.output_dir,
    )?;

    let outcome = RunOutcome {
        profile,
        narrative,
        manifest,
        report,
        duration: start.elapsed(),
    };
    tracing::info!("{}", outcome.summary());
    Ok(outcome)
}

async fn render_charts(
    config: &PipelineConfig,
    dataset: &Arc<Dataset>,
    profile: &Arc<Profile>,
    backend: Arc<dyn ChartBackend>,
) -> VisualizationManifest {
    if !config.generate_plots {
        tracing::info!("Charts skipped: disabled for this run");
        return VisualizationManifest::default();
    }

    let dataset = Arc::clone(dataset);
    let profile = Arc::clone(profile);
    let output_dir: PathBuf = config.output_dir.clone();
    let task = tokio::task::spawn_blocking(move || {
        render(&dataset, &profile, &output_dir, backend.as_ref())
    });

    match task.await {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!("Chart rendering failed: {e}");
            VisualizationManifest::default()
        }
    }
}
