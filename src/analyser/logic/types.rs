use crate::utils::{fmt_bytes, fmt_f64};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum number of entries kept in a categorical top-values list.
pub const TOP_K: usize = 10;

#[derive(Clone, Copy, Serialize, PartialEq, Eq, Debug)]
pub enum DataFormat {
    Csv,
    Spreadsheet,
    Json,
    Parquet,
}

impl DataFormat {
    /// Maps a file extension (case-insensitive, without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Spreadsheet),
            "json" => Some(Self::Json),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Spreadsheet => "Spreadsheet",
            Self::Json => "JSON",
            Self::Parquet => "Parquet",
        }
    }
}

/// A loaded table. Immutable once constructed; consumers only get `&DataFrame`.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    source: PathBuf,
    format: DataFormat,
}

impl Dataset {
    pub fn new(df: DataFrame, source: impl Into<PathBuf>, format: DataFormat) -> Self {
        Self {
            df,
            source: source.into(),
            format,
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> DataFormat {
        self.format
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }
}

/// Physical kind of a column as declared by the source data.
#[derive(Clone, Copy, Serialize, PartialEq, Eq, Debug)]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Nested,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Temporal => "Temporal",
            Self::Boolean => "Boolean",
            Self::Nested => "Nested",
        }
    }
}

/// How the profiler summarizes a column.
#[derive(Clone, Copy, Serialize, PartialEq, Eq, Debug)]
pub enum ColumnRole {
    Numeric,
    Categorical,
    /// Counted in the shape but excluded from statistics.
    Unclassified,
}

#[derive(Clone, Serialize, Debug)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub role: ColumnRole,
    pub missing: usize,
}

/// Descriptive statistics over the non-missing values of a numeric column.
///
/// Every field other than `count` is `NaN` when `count` is zero.
#[derive(Clone, Serialize, Debug)]
pub struct NumericStats {
    pub column: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Clone, Serialize, Debug)]
pub struct CategoricalStats {
    pub column: String,
    pub unique_count: usize,
    pub missing: usize,
    /// At most [`TOP_K`] entries, descending by count, ties in first-seen order.
    pub top_values: Vec<ValueCount>,
}

/// Pairwise Pearson correlations between numeric columns.
///
/// `data[i][j]` is the coefficient between `columns[i]` and `columns[j]`;
/// undefined coefficients are `NaN`.
#[derive(Clone, Serialize, Debug, Default)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.data.get(i).and_then(|row| row.get(j)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Off-diagonal pairs with a defined coefficient, strongest first.
    ///
    /// Ties keep the upper-triangle order of the matrix.
    pub fn strongest_pairs(&self, limit: usize) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for (i, a) in self.columns.iter().enumerate() {
            for (j, b) in self.columns.iter().enumerate().skip(i + 1) {
                if let Some(r) = self.data.get(i).and_then(|row| row.get(j)).copied()
                    && r.is_finite()
                {
                    pairs.push((a.clone(), b.clone(), r));
                }
            }
        }
        pairs.sort_by(|x, y| y.2.abs().total_cmp(&x.2.abs()));
        pairs.truncate(limit);
        pairs
    }
}

/// Statistical summary of a dataset. Built once per run and never mutated.
#[derive(Clone, Serialize, Debug)]
pub struct Profile {
    pub row_count: usize,
    pub column_count: usize,
    /// Approximate in-memory size; see `analysis::estimate_column_bytes`.
    pub memory_estimate_bytes: u64,
    pub columns: Vec<ColumnProfile>,
    /// Only columns with at least one missing value, in column order.
    pub missing_by_column: Vec<(String, usize)>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub numeric_stats: Vec<NumericStats>,
    pub categorical_stats: Vec<CategoricalStats>,
    pub correlation_matrix: CorrelationMatrix,
}

impl Profile {
    pub fn numeric(&self, column: &str) -> Option<&NumericStats> {
        self.numeric_stats.iter().find(|s| s.column == column)
    }

    pub fn categorical(&self, column: &str) -> Option<&CategoricalStats> {
        self.categorical_stats.iter().find(|s| s.column == column)
    }

    pub fn missing(&self, column: &str) -> usize {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map_or(0, |c| c.missing)
    }

    pub fn has_missing(&self) -> bool {
        !self.missing_by_column.is_empty()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rows: {}", self.row_count)?;
        writeln!(f, "Columns: {}", self.column_count)?;
        writeln!(
            f,
            "Memory (estimate): {}",
            fmt_bytes(self.memory_estimate_bytes)
        )?;
        writeln!(f, "Numeric columns: {}", self.numeric_columns.join(", "))?;
        writeln!(
            f,
            "Categorical columns: {}",
            self.categorical_columns.join(", ")
        )?;

        if self.missing_by_column.is_empty() {
            writeln!(f, "Missing values: none")?;
        } else {
            let parts: Vec<String> = self
                .missing_by_column
                .iter()
                .map(|(name, n)| format!("{name}={n}"))
                .collect();
            writeln!(f, "Missing values: {}", parts.join(", "))?;
        }

        if !self.numeric_stats.is_empty() {
            writeln!(f)?;
            writeln!(f, "Numeric statistics:")?;
            for s in &self.numeric_stats {
                writeln!(
                    f,
                    "  {}: count={} min={} q1={} median={} q3={} max={} mean={} std={}",
                    s.column,
                    s.count,
                    fmt_f64(s.min),
                    fmt_f64(s.q1),
                    fmt_f64(s.median),
                    fmt_f64(s.q3),
                    fmt_f64(s.max),
                    fmt_f64(s.mean),
                    fmt_f64(s.std)
                )?;
            }
        }

        if !self.categorical_stats.is_empty() {
            writeln!(f)?;
            writeln!(f, "Categorical summary:")?;
            for s in &self.categorical_stats {
                let top = s
                    .top_values
                    .first()
                    .map(|v| format!("{} ({})", v.value, v.count))
                    .unwrap_or_else(|| "—".to_owned());
                writeln!(
                    f,
                    "  {}: unique={} missing={} most frequent={}",
                    s.column, s.unique_count, s.missing, top
                )?;
            }
        }

        if self.correlation_matrix.columns.len() >= 2 {
            writeln!(f)?;
            writeln!(f, "Correlation matrix:")?;
            let m = &self.correlation_matrix;
            writeln!(f, "  {:>12} {}", "", m.columns.join(" "))?;
            for (name, row) in m.columns.iter().zip(&m.data) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|v| {
                        if v.is_finite() {
                            format!("{v:.2}")
                        } else {
                            "NaN".to_owned()
                        }
                    })
                    .collect();
                writeln!(f, "  {:>12} {}", name, cells.join(" "))?;
            }
        }
        Ok(())
    }
}

/// Plain-text summary produced by the external text-generation service.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct Narrative(String);

impl Narrative {
    /// Returns `None` for blank text so an empty answer never counts as success.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DataFormat::from_extension("CSV"), Some(DataFormat::Csv));
        assert_eq!(
            DataFormat::from_extension("xls"),
            Some(DataFormat::Spreadsheet)
        );
        assert_eq!(
            DataFormat::from_extension("XLSX"),
            Some(DataFormat::Spreadsheet)
        );
        assert_eq!(DataFormat::from_extension("Parquet"), Some(DataFormat::Parquet));
        assert_eq!(DataFormat::from_extension("jsonl"), None);
        assert_eq!(DataFormat::from_extension(""), None);
    }

    #[test]
    fn test_narrative_rejects_blank() {
        assert!(Narrative::new("   \n").is_none());
        assert_eq!(
            Narrative::new("  Sales are flat. ").map(|n| n.as_str().to_owned()),
            Some("Sales are flat.".to_owned())
        );
    }

    #[test]
    fn test_strongest_pairs() {
        let m = CorrelationMatrix {
            columns: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
            data: vec![
                vec![1.0, 0.2, -0.9],
                vec![0.2, 1.0, f64::NAN],
                vec![-0.9, f64::NAN, 1.0],
            ],
        };
        let pairs = m.strongest_pairs(5);
        assert_eq!(pairs.len(), 2, "NaN pairs are skipped");
        assert_eq!((pairs[0].0.as_str(), pairs[0].1.as_str()), ("a", "c"));
        assert_eq!(m.get("c", "a"), Some(-0.9));
        assert_eq!(m.get("a", "zzz"), None);
    }
}
