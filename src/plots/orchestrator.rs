//! Decides which charts a profile calls for and renders them one by one.
//!
//! Production order is fixed, so two runs over the same data produce the same
//! manifest. A chart whose precondition is not met is recorded as skipped;
//! a chart whose backend call errors is recorded as failed and the remaining
//! charts are still attempted.

use std::collections::HashSet;
use std::path::Path;

use crate::analyser::logic::naming::sanitize_file_component;
use crate::analyser::logic::profiling::{self, quantile_sorted};
use crate::analyser::logic::types::{Dataset, NumericStats, Profile};

use super::backend::{
    BarData, BoxPlotData, ChartBackend, DashboardData, HeatmapData, HistogramData, ScatterData,
};
use super::manifest::{ArtifactEntry, ArtifactKind, OmitReason, OmittedArtifact, VisualizationManifest};

pub const HEATMAP_FILE: &str = "korelasyon_haritasi.svg";
pub const MISSINGNESS_FILE: &str = "eksik_degerler.svg";
pub const DASHBOARD_FILE: &str = "dashboard_ozet.svg";
/// Listed when there is no column pair to plot; never written.
pub const SCATTER_NONE: &str = "scatter_<none>.svg";

/// Upper bound on plotted scatter points; larger inputs are thinned evenly.
const MAX_SCATTER_POINTS: usize = 5000;
const MAX_OUTLIERS: usize = 500;
const MIN_BINS: usize = 5;
const MAX_BINS: usize = 50;
const CONSTANT_BINS: usize = 20;

pub fn distribution_file(column: &str) -> String {
    format!("dagilim_{}.svg", sanitize_file_component(column))
}

pub fn box_plot_file(column: &str) -> String {
    format!("kutu_{}.svg", sanitize_file_component(column))
}

pub fn value_counts_file(column: &str) -> String {
    format!("deger_sayilari_{}.svg", sanitize_file_component(column))
}

pub fn scatter_file(x: &str, y: &str) -> String {
    format!(
        "scatter_{}_vs_{}.svg",
        sanitize_file_component(x),
        sanitize_file_component(y)
    )
}

struct Session<'a> {
    output_dir: &'a Path,
    backend: &'a dyn ChartBackend,
    manifest: VisualizationManifest,
    used: HashSet<String>,
}

impl Session<'_> {
    /// Hands out `name`, or `stem_2.ext`, `stem_3.ext`... once it is taken.
    ///
    /// Distinct columns can sanitize to the same file name ("a b", "a_b").
    fn claim(&mut self, name: String) -> String {
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_owned(), format!(".{ext}")),
            None => (name.clone(), String::new()),
        };
        let mut candidate = name;
        let mut n = 1;
        while !self.used.insert(candidate.clone()) {
            n += 1;
            candidate = format!("{stem}_{n}{ext}");
        }
        candidate
    }

    fn attempt(
        &mut self,
        name: String,
        title: String,
        kind: ArtifactKind,
        draw: impl FnOnce(&dyn ChartBackend, &Path) -> anyhow::Result<()>,
    ) {
        let name = self.claim(name);
        let path = self.output_dir.join(&name);
        match draw(self.backend, &path) {
            Ok(()) => {
                tracing::debug!(artifact = %name, "Chart written");
                self.manifest.entries.push(ArtifactEntry { name, title, kind });
            }
            Err(e) => {
                tracing::warn!(artifact = %name, "Chart failed: {e:#}");
                // A half-written file must not be mistaken for a chart
                if path.exists() {
                    std::fs::remove_file(&path).ok();
                }
                self.manifest.omitted.push(OmittedArtifact {
                    name,
                    kind,
                    reason: OmitReason::Failed(format!("{e:#}")),
                });
            }
        }
    }

    fn skip(&mut self, name: String, kind: ArtifactKind, why: &str) {
        let name = self.claim(name);
        tracing::debug!(artifact = %name, "Chart skipped: {why}");
        self.manifest.omitted.push(OmittedArtifact {
            name,
            kind,
            reason: OmitReason::Skipped(why.to_owned()),
        });
    }
}

/// Renders every applicable chart into `output_dir`.
///
/// Never fails as a whole; see [`VisualizationManifest::omitted`] for what
/// was not produced and why.
pub fn render(
    dataset: &Dataset,
    profile: &Profile,
    output_dir: &Path,
    backend: &dyn ChartBackend,
) -> VisualizationManifest {
    let start = std::time::Instant::now();
    let mut session = Session {
        output_dir,
        backend,
        manifest: VisualizationManifest::default(),
        used: HashSet::new(),
    };

    let numeric: Vec<(&str, Vec<Option<f64>>)> = profile
        .numeric_columns
        .iter()
        .map(|name| (name.as_str(), column_values(dataset, name)))
        .collect();

    // 1. Correlation heatmap
    let heatmap = (profile.numeric_columns.len() >= 2).then(|| HeatmapData {
        columns: profile.correlation_matrix.columns.clone(),
        values: profile.correlation_matrix.data.clone(),
    });
    match &heatmap {
        Some(data) => session.attempt(
            HEATMAP_FILE.to_owned(),
            "Correlation matrix".to_owned(),
            ArtifactKind::Heatmap,
            |b, p| b.heatmap(data, p),
        ),
        None => session.skip(
            HEATMAP_FILE.to_owned(),
            ArtifactKind::Heatmap,
            "fewer than two numeric columns",
        ),
    }

    // 2. Scatter of the first two numeric columns
    match numeric.as_slice() {
        [(x, xs), (y, ys), ..] => {
            let name = scatter_file(x, y);
            let points = complete_pairs(xs, ys);
            if points.len() < 2 {
                session.skip(name, ArtifactKind::Scatter, "fewer than two complete rows");
            } else {
                let data = ScatterData {
                    x_label: (*x).to_owned(),
                    y_label: (*y).to_owned(),
                    points: thin(points, MAX_SCATTER_POINTS),
                };
                session.attempt(name, format!("{x} vs {y}"), ArtifactKind::Scatter, |b, p| {
                    b.scatter(&data, p)
                });
            }
        }
        _ => session.skip(
            SCATTER_NONE.to_owned(),
            ArtifactKind::Scatter,
            "fewer than two numeric columns",
        ),
    }

    // 3. Distribution and box plot per numeric column
    let mut histograms = Vec::new();
    for (column, values) in &numeric {
        let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
        sorted.sort_by(f64::total_cmp);

        let Some(stats) = profile.numeric(column).filter(|_| !sorted.is_empty()) else {
            session.skip(
                distribution_file(column),
                ArtifactKind::Distribution,
                "no non-missing values",
            );
            session.skip(
                box_plot_file(column),
                ArtifactKind::BoxPlot,
                "no non-missing values",
            );
            continue;
        };

        let hist = histogram(column, &sorted, stats);
        session.attempt(
            distribution_file(column),
            format!("Distribution: {column}"),
            ArtifactKind::Distribution,
            |b, p| b.histogram(&hist, p),
        );
        histograms.push(hist);

        let boxed = box_plot(column, &sorted, stats);
        session.attempt(
            box_plot_file(column),
            format!("Box plot: {column}"),
            ArtifactKind::BoxPlot,
            |b, p| b.box_plot(&boxed, p),
        );
    }

    // 4. Value counts per categorical column
    let mut first_bar = None;
    for stats in &profile.categorical_stats {
        let name = value_counts_file(&stats.column);
        if stats.top_values.is_empty() {
            session.skip(name, ArtifactKind::CategoricalBar, "no non-missing values");
            continue;
        }
        let data = BarData {
            title: format!(
                "Most frequent: {} (top {})",
                stats.column,
                stats.top_values.len()
            ),
            bars: stats
                .top_values
                .iter()
                .map(|v| (v.value.clone(), v.count))
                .collect(),
        };
        session.attempt(
            name,
            format!("Most frequent values: {}", stats.column),
            ArtifactKind::CategoricalBar,
            |b, p| b.bar(&data, p),
        );
        if first_bar.is_none() {
            first_bar = Some(data);
        }
    }

    // 5. Missing values
    if profile.has_missing() {
        let mut bars = profile.missing_by_column.clone();
        bars.sort_by(|a, b| b.1.cmp(&a.1));
        let data = BarData {
            title: "Missing values per column".to_owned(),
            bars,
        };
        session.attempt(
            MISSINGNESS_FILE.to_owned(),
            "Missing values per column".to_owned(),
            ArtifactKind::Missingness,
            |b, p| b.bar(&data, p),
        );
    } else {
        session.skip(
            MISSINGNESS_FILE.to_owned(),
            ArtifactKind::Missingness,
            "no missing values",
        );
    }

    // 6. Dashboard
    if session.manifest.is_empty() {
        session.skip(
            DASHBOARD_FILE.to_owned(),
            ArtifactKind::Dashboard,
            "no other chart was produced",
        );
    } else {
        histograms.truncate(2);
        let data = DashboardData {
            heatmap,
            distributions: histograms,
            categorical: first_bar,
        };
        session.attempt(
            DASHBOARD_FILE.to_owned(),
            "Dataset overview".to_owned(),
            ArtifactKind::Dashboard,
            |b, p| b.dashboard(&data, p),
        );
    }

    let manifest = session.manifest;
    tracing::info!(
        produced = manifest.entries.len(),
        omitted = manifest.omitted.len(),
        failed = manifest.failures().count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Charts rendered"
    );
    manifest
}

fn column_values(dataset: &Dataset, name: &str) -> Vec<Option<f64>> {
    let values = dataset
        .frame()
        .column(name)
        .map_err(anyhow::Error::from)
        .and_then(|c| profiling::float_values(c.as_materialized_series()));
    match values {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(column = %name, "Could not read column for charts: {e:#}");
            Vec::new()
        }
    }
}

fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect()
}

/// Keeps at most `max` items, taking every k-th so the spread is preserved.
fn thin<T>(items: Vec<T>, max: usize) -> Vec<T> {
    if items.len() <= max || max == 0 {
        return items;
    }
    let step = items.len().div_ceil(max);
    items.into_iter().step_by(step).collect()
}

/// Bins ascending values with the Freedman–Diaconis width.
///
/// The bin count is clamped to 5..=50. A constant column gets 20 unit-wide
/// bins with every value in bin 10, so it renders as a single centered bar.
pub fn histogram(column: &str, sorted: &[f64], stats: &NumericStats) -> HistogramData {
    let (Some(&min_v), Some(&max_v)) = (sorted.first(), sorted.last()) else {
        return HistogramData {
            column: column.to_owned(),
            bin_width: 0.0,
            bins: Vec::new(),
        };
    };

    if (max_v - min_v).abs() < f64::EPSILON {
        let bin_width = 1.0;
        let start = min_v - (CONSTANT_BINS / 2) as f64 * bin_width;
        let bins = (0..CONSTANT_BINS)
            .map(|i| {
                let count = if i == CONSTANT_BINS / 2 { sorted.len() } else { 0 };
                (start + i as f64 * bin_width, count)
            })
            .collect();
        return HistogramData {
            column: column.to_owned(),
            bin_width,
            bins,
        };
    }

    let n = sorted.len() as f64;
    let iqr = stats.q3 - stats.q1;
    let h = if iqr > 0.0 {
        2.0 * iqr / n.cbrt()
    } else {
        (max_v - min_v) / n.sqrt()
    };

    let num_bins = ((max_v - min_v) / h).ceil() as usize;
    let num_bins = num_bins.clamp(MIN_BINS, MAX_BINS);
    let bin_width = (max_v - min_v) / num_bins as f64;

    let mut counts = vec![0usize; num_bins];
    for &v in sorted {
        // The maximum lands exactly on the right edge; keep it in the last bin
        let idx = (((v - min_v) / bin_width).floor() as usize).min(num_bins - 1);
        if let Some(slot) = counts.get_mut(idx) {
            *slot += 1;
        }
    }

    HistogramData {
        column: column.to_owned(),
        bin_width,
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| (min_v + i as f64 * bin_width, c))
            .collect(),
    }
}

/// Tukey box plot: whiskers reach the furthest values within 1.5 IQR.
pub fn box_plot(column: &str, sorted: &[f64], stats: &NumericStats) -> BoxPlotData {
    let iqr = stats.q3 - stats.q1;
    let low_fence = stats.q1 - 1.5 * iqr;
    let high_fence = stats.q3 + 1.5 * iqr;

    let inside = || sorted.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
    let lower_whisker = inside().next().unwrap_or(stats.q1);
    let upper_whisker = inside().last().unwrap_or(stats.q3);

    let mut outliers: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();
    outliers.dedup();

    BoxPlotData {
        column: column.to_owned(),
        lower_whisker,
        q1: stats.q1,
        median: quantile_sorted(sorted, 0.5),
        q3: stats.q3,
        upper_whisker,
        outliers: thin(outliers, MAX_OUTLIERS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::{DataFormat, profile};
    use anyhow::{Result, bail};
    use polars::prelude::*;
    use std::sync::Mutex;

    /// Records calls and fails for one chosen kind.
    #[derive(Default)]
    struct RecordingBackend {
        fail_on: Option<ArtifactKind>,
        calls: Mutex<Vec<String>>,
        dashboard: Mutex<Option<DashboardData>>,
    }

    impl RecordingBackend {
        fn failing(kind: ArtifactKind) -> Self {
            Self {
                fail_on: Some(kind),
                ..Self::default()
            }
        }

        fn record(&self, kind: ArtifactKind, path: &Path) -> Result<()> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.calls.lock().expect("lock").push(name);
            if self.fail_on == Some(kind) {
                bail!("backend refused {kind}");
            }
            Ok(())
        }
    }

    impl ChartBackend for RecordingBackend {
        fn heatmap(&self, _: &HeatmapData, path: &Path) -> Result<()> {
            self.record(ArtifactKind::Heatmap, path)
        }
        fn scatter(&self, _: &ScatterData, path: &Path) -> Result<()> {
            self.record(ArtifactKind::Scatter, path)
        }
        fn histogram(&self, _: &HistogramData, path: &Path) -> Result<()> {
            self.record(ArtifactKind::Distribution, path)
        }
        fn box_plot(&self, _: &BoxPlotData, path: &Path) -> Result<()> {
            self.record(ArtifactKind::BoxPlot, path)
        }
        fn bar(&self, data: &BarData, path: &Path) -> Result<()> {
            let kind = if data.title.starts_with("Missing") {
                ArtifactKind::Missingness
            } else {
                ArtifactKind::CategoricalBar
            };
            self.record(kind, path)
        }
        fn dashboard(&self, data: &DashboardData, path: &Path) -> Result<()> {
            *self.dashboard.lock().expect("lock") = Some(data.clone());
            self.record(ArtifactKind::Dashboard, path)
        }
    }

    fn run(df: DataFrame, backend: &RecordingBackend) -> VisualizationManifest {
        let dataset = Dataset::new(df, "inline.csv", DataFormat::Csv);
        let profile = profile(&dataset).expect("profile");
        render(&dataset, &profile, Path::new("unused"), backend)
    }

    fn sample() -> DataFrame {
        df!(
            "id" => &[1i64, 2, 3, 4, 5],
            "category" => &["A", "A", "B", "B", "C"],
            "value" => &[Some(10i64), None, Some(30), Some(40), Some(50)]
        )
        .expect("frame")
    }

    fn stats_for(sorted: &[f64]) -> NumericStats {
        profiling::analyse_numeric("x", &sorted.iter().copied().map(Some).collect::<Vec<_>>())
    }

    #[test]
    fn test_production_order() {
        let backend = RecordingBackend::default();
        let manifest = run(sample(), &backend);
        let names: Vec<&str> = manifest.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "korelasyon_haritasi.svg",
                "scatter_id_vs_value.svg",
                "dagilim_id.svg",
                "kutu_id.svg",
                "dagilim_value.svg",
                "kutu_value.svg",
                "deger_sayilari_category.svg",
                "eksik_degerler.svg",
                "dashboard_ozet.svg",
            ]
        );
        assert_eq!(*backend.calls.lock().expect("lock"), names);
        assert!(manifest.omitted.is_empty());
    }

    #[test]
    fn test_single_numeric_column() {
        let df = df!(
            "city" => &["Ankara", "Izmir", "Ankara"],
            "temperature" => &[12.5, 21.0, 11.0]
        )
        .expect("frame");
        let manifest = run(df, &RecordingBackend::default());

        assert!(!manifest.contains(HEATMAP_FILE));
        assert_eq!(manifest.count_of(ArtifactKind::Heatmap), 0);
        assert_eq!(manifest.count_of(ArtifactKind::Scatter), 0);
        assert_eq!(manifest.count_of(ArtifactKind::Distribution), 1);
        assert!(manifest.contains("dagilim_temperature.svg"));
        assert!(!manifest.contains(MISSINGNESS_FILE));
        assert!(manifest.omitted.iter().any(|o| o.kind == ArtifactKind::Missingness
            && matches!(o.reason, OmitReason::Skipped(_))));
    }

    #[test]
    fn test_failed_chart_leaves_others() {
        let backend = RecordingBackend::failing(ArtifactKind::Distribution);
        let manifest = run(sample(), &backend);

        assert_eq!(manifest.count_of(ArtifactKind::Distribution), 0);
        assert_eq!(manifest.count_of(ArtifactKind::BoxPlot), 2);
        assert!(manifest.contains(HEATMAP_FILE));
        assert!(manifest.contains(DASHBOARD_FILE));

        let failed: Vec<&str> = manifest.failures().map(|o| o.name.as_str()).collect();
        assert_eq!(failed, vec!["dagilim_id.svg", "dagilim_value.svg"]);
    }

    #[test]
    fn test_dashboard_needs_another_chart() {
        // Only the missing-values chart applies, and it fails
        let df = df!("empty" => &[None::<f64>, None]).expect("frame");
        let backend = RecordingBackend::failing(ArtifactKind::Missingness);
        let manifest = run(df, &backend);
        assert!(manifest.is_empty());
        assert!(manifest.omitted.iter().any(|o| o.kind == ArtifactKind::Dashboard));
        assert!(manifest.omitted.iter().any(|o| o.name == "dagilim_empty.svg"));
    }

    #[test]
    fn test_dashboard_panels() {
        let backend = RecordingBackend::default();
        run(sample(), &backend);
        let data = backend.dashboard.lock().expect("lock").clone().expect("dashboard drawn");
        assert!(data.heatmap.is_some());
        assert_eq!(data.distributions.len(), 2);
        assert_eq!(data.distributions[0].column, "id");
        assert!(data.categorical.is_some());
    }

    #[test]
    fn test_scatter_needs_two_complete_rows() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(3.0)],
            "b" => &[None, Some(2.0), None]
        )
        .expect("frame");
        let manifest = run(df, &RecordingBackend::default());
        assert_eq!(manifest.count_of(ArtifactKind::Scatter), 0);
        assert!(manifest.omitted.iter().any(|o| o.name == "scatter_a_vs_b.svg"));
    }

    #[test]
    fn test_colliding_names_get_suffixes() {
        let df = df!(
            "a b" => &[1.0, 2.0, 3.0],
            "a_b" => &[10.0, 30.0, 20.0]
        )
        .expect("frame");
        let backend = RecordingBackend::default();
        let manifest = run(df, &backend);

        let names: Vec<&str> = manifest.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "korelasyon_haritasi.svg",
                "scatter_a_b_vs_a_b.svg",
                "dagilim_a_b.svg",
                "kutu_a_b.svg",
                "dagilim_a_b_2.svg",
                "kutu_a_b_2.svg",
                "dashboard_ozet.svg",
            ]
        );
        let titles: Vec<&str> = manifest.entries.iter().map(|e| e.title.as_str()).collect();
        assert!(titles.contains(&"Distribution: a b"));
        assert!(titles.contains(&"Distribution: a_b"));

        let calls = backend.calls.lock().expect("lock").clone();
        let unique: HashSet<&String> = calls.iter().collect();
        assert_eq!(unique.len(), calls.len(), "every chart gets its own file");
    }

    #[test]
    fn test_scatter_skip_uses_placeholder_name() {
        let df = df!("only" => &[1.0, 2.0, 3.0]).expect("frame");
        let manifest = run(df, &RecordingBackend::default());
        let scatter = manifest
            .omitted
            .iter()
            .find(|o| o.kind == ArtifactKind::Scatter)
            .expect("scatter listed as omitted");
        assert_eq!(scatter.name, SCATTER_NONE);
        assert!(matches!(scatter.reason, OmitReason::Skipped(_)));
    }

    #[test]
    fn test_sanitized_names() {
        assert_eq!(distribution_file("unit price ($)"), "dagilim_unit_price____.svg");
        assert_eq!(scatter_file("a/b", "c"), "scatter_a_b_vs_c.svg");
    }

    #[test]
    fn test_histogram_constant_column() {
        let sorted = [4.0; 7];
        let hist = histogram("c", &sorted, &stats_for(&sorted));
        assert_eq!(hist.bins.len(), 20);
        assert_eq!(hist.bins[10], (4.0, 7));
        assert!((hist.bin_width - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_histogram_bin_count_clamped() {
        let few = [1.0, 2.0];
        let hist = histogram("few", &few, &stats_for(&few));
        assert_eq!(hist.bins.len(), 5);
        assert_eq!(hist.bins.iter().map(|b| b.1).sum::<usize>(), 2);

        let many: Vec<f64> = (0..100_000).map(|i| (i as f64).powi(3)).collect();
        let hist = histogram("many", &many, &stats_for(&many));
        assert!(hist.bins.len() <= 50);
        assert_eq!(hist.bins.iter().map(|b| b.1).sum::<usize>(), many.len());
    }

    #[test]
    fn test_box_plot_whiskers_and_outliers() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let data = box_plot("x", &sorted, &stats_for(&sorted));
        assert!((data.lower_whisker - 1.0).abs() < 1e-12);
        assert!((data.upper_whisker - 5.0).abs() < 1e-12);
        assert_eq!(data.outliers, vec![100.0]);
    }

    #[test]
    fn test_thin_keeps_bounds() {
        let items: Vec<usize> = (0..10_000).collect();
        let kept = thin(items, 1000);
        assert!(kept.len() <= 1000);
        assert_eq!(kept[0], 0);
    }
}
