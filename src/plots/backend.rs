//! Chart data handed to a backend, and the backend capability itself.
//!
//! The data structs are fully prepared by the orchestrator (bins counted,
//! whiskers placed, pairs filtered), so a backend only draws.

use anyhow::Result;
use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapData {
    pub columns: Vec<String>,
    /// Square matrix; `NaN` marks an undefined coefficient.
    pub values: Vec<Vec<f64>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterData {
    pub x_label: String,
    pub y_label: String,
    /// Rows where both columns are present.
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramData {
    pub column: String,
    pub bin_width: f64,
    /// `(left edge, count)` per bin, ascending.
    pub bins: Vec<(f64, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxPlotData {
    pub column: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarData {
    pub title: String,
    /// `(label, count)`, drawn top to bottom in this order.
    pub bars: Vec<(String, usize)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardData {
    pub heatmap: Option<HeatmapData>,
    pub distributions: Vec<HistogramData>,
    pub categorical: Option<BarData>,
}

/// Draws one chart per call into the given file.
///
/// Implementations must be deterministic: the same data yields the same bytes.
pub trait ChartBackend: Send + Sync {
    fn heatmap(&self, data: &HeatmapData, path: &Path) -> Result<()>;
    fn scatter(&self, data: &ScatterData, path: &Path) -> Result<()>;
    fn histogram(&self, data: &HistogramData, path: &Path) -> Result<()>;
    fn box_plot(&self, data: &BoxPlotData, path: &Path) -> Result<()>;
    fn bar(&self, data: &BarData, path: &Path) -> Result<()>;
    fn dashboard(&self, data: &DashboardData, path: &Path) -> Result<()>;
}
