//! Per-column statistics.
//!
//! Each function works on one polars `Series` and returns plain values, so the
//! profile assembled in `analysis` does not depend on how the frame was read.
//! Missing means null, or NaN in a float column. Statistics only ever see
//! the remaining values.
//!
//! Key rules:
//! - A text column is numeric when every non-missing value parses as a number
//! - Quartiles use linear interpolation between closest ranks
//! - Standard deviation is the sample estimate (ddof = 1)
//! - Top values are ordered by descending count with ties in first-seen order

use super::types::{CategoricalStats, ColumnKind, ColumnRole, NumericStats, TOP_K, ValueCount};
use anyhow::{Context as _, Result};
use polars::prelude::*;
use std::collections::HashMap;

/// Decides the declared kind and the summary role of a column.
pub fn classify(series: &Series) -> Result<(ColumnKind, ColumnRole)> {
    let dtype = series.dtype();

    if dtype.is_bool() {
        return Ok((ColumnKind::Boolean, ColumnRole::Categorical));
    }
    if dtype.is_primitive_numeric() {
        return Ok((ColumnKind::Numeric, ColumnRole::Numeric));
    }
    if dtype.is_temporal() {
        return Ok((ColumnKind::Temporal, ColumnRole::Categorical));
    }
    if dtype.is_nested() || matches!(dtype, DataType::Binary) {
        return Ok((ColumnKind::Nested, ColumnRole::Unclassified));
    }
    if matches!(dtype, DataType::String | DataType::Null) {
        let role = if parses_as_numbers(series)? {
            ColumnRole::Numeric
        } else {
            ColumnRole::Categorical
        };
        return Ok((ColumnKind::Text, role));
    }

    // Anything else is summarized through its string rendering when possible
    if series.cast(&DataType::String).is_ok() {
        Ok((ColumnKind::Text, ColumnRole::Categorical))
    } else {
        Ok((ColumnKind::Nested, ColumnRole::Unclassified))
    }
}

/// True when casting to `Float64` turns no present value into a null.
///
/// A column without any present value passes vacuously.
pub fn parses_as_numbers(series: &Series) -> Result<bool> {
    let casted = series
        .cast(&DataType::Float64)
        .context("Failed to cast column to Float64")?;
    Ok(casted.null_count() == series.null_count())
}

pub fn missing_count(series: &Series) -> Result<usize> {
    let nulls = series.null_count();
    if !series.dtype().is_float() {
        return Ok(nulls);
    }
    let casted = series.cast(&DataType::Float64)?;
    let nans = casted.f64()?.into_iter().flatten().filter(|v| v.is_nan()).count();
    Ok(nulls + nans)
}

/// The column as optional floats, with NaN mapped to `None`.
pub fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series
        .cast(&DataType::Float64)
        .context("Failed to cast column to Float64")?;
    let ca = casted.f64().map_err(|e| anyhow::anyhow!(e))?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

pub fn analyse_numeric(name: &str, values: &[Option<f64>]) -> NumericStats {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);
    let count = present.len();

    if count == 0 {
        return NumericStats {
            column: name.to_owned(),
            count,
            min: f64::NAN,
            q1: f64::NAN,
            median: f64::NAN,
            q3: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            std: f64::NAN,
        };
    }

    let mean = present.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let ss: f64 = present.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    } else {
        f64::NAN
    };

    NumericStats {
        column: name.to_owned(),
        count,
        min: present.first().copied().unwrap_or(f64::NAN),
        q1: quantile_sorted(&present, 0.25),
        median: quantile_sorted(&present, 0.5),
        q3: quantile_sorted(&present, 0.75),
        max: present.last().copied().unwrap_or(f64::NAN),
        mean,
        std,
    }
}

/// Linear-interpolated quantile of an ascending slice; NaN when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    match (sorted.get(lo), sorted.get(hi)) {
        (Some(&a), Some(&b)) => a + (b - a) * (pos - lo as f64),
        _ => f64::NAN,
    }
}

pub fn analyse_categorical(name: &str, series: &Series, missing: usize) -> Result<CategoricalStats> {
    let strings = if matches!(series.dtype(), DataType::String) {
        series.clone()
    } else {
        series
            .cast(&DataType::String)
            .context("Failed to render values as text")?
    };
    let ca = strings.str().map_err(|e| anyhow::anyhow!(e))?;

    let mut counts: Vec<ValueCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in ca.into_iter().flatten() {
        if let Some(entry) = index.get(value).and_then(|&i| counts.get_mut(i)) {
            entry.count += 1;
        } else {
            index.insert(value, counts.len());
            counts.push(ValueCount {
                value: value.to_owned(),
                count: 1,
            });
        }
    }

    let unique_count = counts.len();
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_K);

    Ok(CategoricalStats {
        column: name.to_owned(),
        unique_count,
        missing,
        top_values: counts,
    })
}

/// Pearson correlation over the rows where both sides are present.
///
/// NaN when fewer than two such rows exist or either side is constant on them.
pub fn pearson_pairwise(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// UTF-8 byte length of all present values, for the memory estimate.
pub fn text_bytes(series: &Series) -> u64 {
    let Ok(strings) = series.cast(&DataType::String) else {
        return 0;
    };
    strings.str().map_or(0, |ca| {
        ca.into_iter().flatten().map(|s| s.len() as u64).sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_sorted() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile_sorted(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile_sorted(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&v, 0.75) - 3.25).abs() < 1e-12);
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert!((quantile_sorted(&[7.0], 0.75) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_all_missing_is_nan() {
        let stats = analyse_numeric("empty", &[None, None]);
        assert_eq!(stats.count, 0);
        assert!(stats.min.is_nan() && stats.max.is_nan() && stats.mean.is_nan());
        assert!(stats.std.is_nan() && stats.median.is_nan());
    }

    #[test]
    fn test_numeric_single_value_std_is_nan() {
        let stats = analyse_numeric("one", &[Some(4.0), None]);
        assert_eq!(stats.count, 1);
        assert!((stats.mean - 4.0).abs() < 1e-12);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let z = [Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson_pairwise(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson_pairwise(&x, &z) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_is_pairwise_complete() {
        // The row with the outlier in y is dropped because x is missing there
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(10.0), Some(20.0), Some(-500.0), Some(40.0)];
        assert!((pearson_pairwise(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate_cases() {
        let constant = [Some(5.0), Some(5.0), Some(5.0)];
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        assert!(pearson_pairwise(&x, &constant).is_nan());
        assert!(pearson_pairwise(&[Some(1.0)], &[Some(2.0)]).is_nan());
        assert!(pearson_pairwise(&[Some(1.0), None], &[None, Some(2.0)]).is_nan());
    }

    #[test]
    fn test_categorical_ties_first_seen() -> Result<()> {
        let s = Series::new(
            "c".into(),
            vec![Some("b"), Some("a"), None, Some("a"), Some("b"), Some("c")],
        );
        let stats = analyse_categorical("c", &s, 1)?;
        assert_eq!(stats.unique_count, 3);
        let order: Vec<&str> = stats.top_values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        Ok(())
    }

    #[test]
    fn test_categorical_top_k_cap() -> Result<()> {
        let values: Vec<String> = (0..25).map(|i| format!("v{i}")).collect();
        let s = Series::new("c".into(), values);
        let stats = analyse_categorical("c", &s, 0)?;
        assert_eq!(stats.unique_count, 25);
        assert_eq!(stats.top_values.len(), TOP_K);
        Ok(())
    }

    #[test]
    fn test_classify_numeric_strings() -> Result<()> {
        let numeric_text = Series::new("n".into(), vec![Some("1.5"), None, Some("3")]);
        assert_eq!(
            classify(&numeric_text)?,
            (ColumnKind::Text, ColumnRole::Numeric)
        );

        let mixed = Series::new("m".into(), vec![Some("1.5"), Some("abc")]);
        assert_eq!(classify(&mixed)?, (ColumnKind::Text, ColumnRole::Categorical));

        let flags = Series::new("b".into(), vec![true, false]);
        assert_eq!(
            classify(&flags)?,
            (ColumnKind::Boolean, ColumnRole::Categorical)
        );
        Ok(())
    }

    #[test]
    fn test_missing_counts_nan_in_floats() -> Result<()> {
        let s = Series::new("f".into(), vec![Some(1.0), Some(f64::NAN), None]);
        assert_eq!(missing_count(&s)?, 2);
        assert_eq!(float_values(&s)?, vec![Some(1.0), None, None]);
        Ok(())
    }
}
