use super::naming::unique_header_names;
use super::types::{DataFormat, Dataset};
use crate::error::{PipelineError, Result};
use anyhow::Context as _;
use calamine::{Data, Range, Reader as _, open_workbook_auto};
use polars::prelude::*;
use std::path::Path;

/// Loads a dataset, choosing the reader from the file extension alone.
///
/// # Errors
///
/// - [`PipelineError::FileNotFound`] if `path` is not an existing file
/// - [`PipelineError::UnsupportedFormat`] for unknown extensions
/// - [`PipelineError::Parse`] if the content cannot be decoded
pub fn load(path: &Path) -> Result<Dataset> {
    if !path.is_file() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let format = DataFormat::from_extension(&ext)
        .ok_or_else(|| PipelineError::UnsupportedFormat { extension: ext })?;

    let df = read_frame(path, format).map_err(|e| PipelineError::parse(path, &e))?;

    tracing::info!(
        path = %path.display(),
        format = format.as_str(),
        rows = df.height(),
        columns = df.width(),
        "Dataset loaded"
    );

    Ok(Dataset::new(df, path, format))
}

fn read_frame(path: &Path, format: DataFormat) -> anyhow::Result<DataFrame> {
    let df = match format {
        // Infer from every row: a column may widen from int to float late in the file
        DataFormat::Csv => LazyCsvReader::new(path)
            .with_infer_schema_length(None)
            .with_has_header(true)
            .finish()?
            .collect()
            .context("Failed to read CSV")?,
        DataFormat::Parquet => ParquetReader::new(std::fs::File::open(path)?)
            .finish()
            .context("Failed to read Parquet")?,
        DataFormat::Json => JsonReader::new(std::fs::File::open(path)?)
            .finish()
            .context("Failed to read JSON")?,
        DataFormat::Spreadsheet => read_first_sheet(path)?,
    };
    Ok(df)
}

fn read_first_sheet(path: &Path) -> anyhow::Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).context("Failed to open spreadsheet")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("Spreadsheet contains no sheets"))?
        .context("Failed to read the first sheet")?;
    range_to_frame(&range)
}

/// Converts a sheet into a frame. The first row is the header.
///
/// A column whose non-empty cells are all integers becomes `Int64`, all
/// numbers `Float64`, all booleans `Boolean`; anything else is kept as text.
pub fn range_to_frame(range: &Range<Data>) -> anyhow::Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let raw_names: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let names = unique_header_names(&raw_names);
    let body: Vec<&[Data]> = rows.collect();

    let mut columns = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        let cells: Vec<Option<&Data>> = body
            .iter()
            .map(|row| row.get(idx).filter(|c| !is_blank(c)))
            .collect();
        columns.push(Column::from(build_series(name, &cells)));
    }

    DataFrame::new(columns).context("Failed to assemble spreadsheet columns")
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn build_series(name: &str, cells: &[Option<&Data>]) -> Series {
    let present = || cells.iter().flatten();

    if present().all(|c| matches!(c, Data::Int(_))) && present().next().is_some() {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Int(i)) => Some(*i),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    if present().all(|c| matches!(c, Data::Int(_) | Data::Float(_))) && present().next().is_some()
    {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Int(i)) => Some(*i as f64),
                Some(Data::Float(f)) => Some(*f),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    if present().all(|c| matches!(c, Data::Bool(_))) && present().next().is_some() {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Some(Data::Bool(b)) => Some(*b),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values);
    }

    let values: Vec<Option<String>> = cells
        .iter()
        .map(|c| c.and_then(|cell| cell_text(cell)))
        .collect();
    Series::new(name.into(), values)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Writes the first `limit` rows of a frame as CSV with a header row.
///
/// CSV has no nested values, so list, struct and binary columns are written
/// as their text rendering (`["a", "b"]`) in their original position.
pub fn write_csv_head(df: &DataFrame, limit: usize, path: &Path) -> anyhow::Result<usize> {
    let mut head = df.head(Some(limit));
    let nested: Vec<PlSmallStr> = head
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_nested() || matches!(c.dtype(), DataType::Binary))
        .map(|c| c.name().clone())
        .collect();
    for name in nested {
        let text = nested_as_text(head.column(&name)?.as_materialized_series())
            .with_context(|| format!("Failed to render column '{name}' as text"))?;
        head.with_column(text)?;
    }

    let file = std::fs::File::create(path).context("Failed to create CSV file")?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut head)
        .context("Failed to write CSV file")?;
    Ok(head.height())
}

fn nested_as_text(series: &Series) -> anyhow::Result<Series> {
    let mut values: Vec<Option<String>> = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        values.push(match series.get(i)? {
            AnyValue::Null => None,
            other => Some(other.to_string()),
        });
    }
    Ok(Series::new(series.name().clone(), values))
}
