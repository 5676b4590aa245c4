use super::profiling;
use super::types::{
    ColumnKind, ColumnProfile, ColumnRole, CorrelationMatrix, Dataset, NumericStats, Profile,
};
use crate::error::{PipelineError, Result};
use anyhow::Context as _;
use polars::prelude::*;

/// Builds the statistical profile of a dataset.
///
/// Pure and deterministic: the same frame always yields the same profile.
///
/// # Errors
///
/// Returns [`PipelineError::Profiling`] if polars fails on a column, which
/// does not happen for frames produced by the loader.
pub fn profile(dataset: &Dataset) -> Result<Profile> {
    let start = std::time::Instant::now();
    let df = dataset.frame();
    let row_count = df.height();

    let mut columns = Vec::with_capacity(df.width());
    let mut numeric_columns = Vec::new();
    let mut categorical_columns = Vec::new();
    let mut numeric_stats = Vec::new();
    let mut categorical_stats = Vec::new();
    let mut numeric_values: Vec<Vec<Option<f64>>> = Vec::new();
    let mut memory_estimate_bytes = 0u64;

    for col in df.get_columns() {
        let name = col.name().to_string();
        let series = col.as_materialized_series();

        let (kind, role) = profiling::classify(series)
            .with_context(|| format!("Classification failed for column '{name}'"))
            .map_err(profiling_error)?;
        let missing = profiling::missing_count(series)
            .with_context(|| format!("Missing-value count failed for column '{name}'"))
            .map_err(profiling_error)?;

        match role {
            ColumnRole::Numeric => {
                let values = profiling::float_values(series)
                    .with_context(|| format!("Analysis failed for numeric column '{name}'"))
                    .map_err(profiling_error)?;
                numeric_stats.push(profiling::analyse_numeric(&name, &values));
                numeric_values.push(values);
                numeric_columns.push(name.clone());
            }
            ColumnRole::Categorical => {
                let stats = profiling::analyse_categorical(&name, series, missing)
                    .with_context(|| format!("Analysis failed for categorical column '{name}'"))
                    .map_err(profiling_error)?;
                categorical_stats.push(stats);
                categorical_columns.push(name.clone());
            }
            ColumnRole::Unclassified => {
                tracing::debug!(column = %name, "Column excluded from statistics (nested type)");
            }
        }

        memory_estimate_bytes += estimate_column_bytes(kind, series, row_count);
        columns.push(ColumnProfile {
            name,
            kind,
            role,
            missing,
        });
    }

    let missing_by_column = columns
        .iter()
        .filter(|c| c.missing > 0)
        .map(|c| (c.name.clone(), c.missing))
        .collect();

    let correlation_matrix = correlation_matrix(&numeric_columns, &numeric_stats, &numeric_values);

    tracing::info!(
        rows = row_count,
        columns = columns.len(),
        numeric = numeric_columns.len(),
        categorical = categorical_columns.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Profile computed"
    );

    Ok(Profile {
        row_count,
        column_count: columns.len(),
        memory_estimate_bytes,
        columns,
        missing_by_column,
        numeric_columns,
        categorical_columns,
        numeric_stats,
        categorical_stats,
        correlation_matrix,
    })
}

fn profiling_error(err: anyhow::Error) -> PipelineError {
    PipelineError::Profiling(format!("{err:#}"))
}

/// Pairwise-complete Pearson matrix over the numeric columns.
///
/// Symmetric by construction. The diagonal is 1.0 for a column with nonzero
/// variance and NaN otherwise, so constant columns are undefined consistently.
pub fn correlation_matrix(
    names: &[String],
    stats: &[NumericStats],
    values: &[Vec<Option<f64>>],
) -> CorrelationMatrix {
    let n = names.len();
    let mut data = vec![vec![f64::NAN; n]; n];

    for i in 0..n {
        let varies = stats
            .get(i)
            .is_some_and(|s| s.count >= 2 && s.max > s.min);
        if let Some(cell) = data.get_mut(i).and_then(|row| row.get_mut(i)) {
            *cell = if varies { 1.0 } else { f64::NAN };
        }

        for j in (i + 1)..n {
            let (Some(x), Some(y)) = (values.get(i), values.get(j)) else {
                continue;
            };
            let r = profiling::pearson_pairwise(x, y);
            if let Some(cell) = data.get_mut(i).and_then(|row| row.get_mut(j)) {
                *cell = r;
            }
            if let Some(cell) = data.get_mut(j).and_then(|row| row.get_mut(i)) {
                *cell = r;
            }
        }
    }

    CorrelationMatrix {
        columns: names.to_vec(),
        data,
    }
}

/// Approximate in-memory footprint of one column.
///
/// Fixed widths per kind (8 bytes for numbers and timestamps, 1 for booleans)
/// plus a validity bitmap; text and nested columns add a 16-byte view per
/// row and the UTF-8 length of their present values. This is an estimate
/// for the report, not an exact accounting of polars buffers.
pub fn estimate_column_bytes(kind: ColumnKind, series: &Series, row_count: usize) -> u64 {
    let rows = row_count as u64;
    let validity = rows.div_ceil(8);
    let payload = match kind {
        ColumnKind::Numeric | ColumnKind::Temporal => 8 * rows,
        ColumnKind::Boolean => rows,
        ColumnKind::Text | ColumnKind::Nested => 16 * rows + profiling::text_bytes(series),
    };
    payload + validity
}
