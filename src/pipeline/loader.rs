//! Dataset loader for CSV and Parquet files
//!
//! Converts polars frames into the core's [`FeatureMatrix`] and
//! [`LabelVector`]. Primitive numeric dtypes become numeric columns, all
//! other dtypes become categorical strings with nulls mapped to
//! [`MISSING_CATEGORY`]. Nulls in numeric columns are rejected.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

use super::matrix::{FeatureColumn, FeatureMatrix, LabelVector};
use super::target::{column_to_strings, extract_labels, TargetMapping};

/// Category substituted for null values in categorical columns
pub const MISSING_CATEGORY: &str = "MISSING";

/// Features and labels ready for the pipeline
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: FeatureMatrix,
    pub labels: LabelVector,
    /// Rows dropped for a null or unmapped target
    pub skipped_rows: usize,
}

/// Load a dataset from a file (CSV or Parquet based on extension)
pub fn load_dataset(path: &Path) -> Result<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Load and collect a file into a DataFrame
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let df = load_dataset(path)?
        .collect()
        .with_context(|| format!("Failed to read {}", path.display()))?;
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "dataset loaded"
    );
    Ok(df)
}

fn to_feature_column(col: &Column, rows: Option<&[usize]>) -> Result<FeatureColumn> {
    let name = col.name().to_string();

    if col.dtype().is_primitive_numeric() {
        let cast = col
            .cast(&DataType::Float64)
            .with_context(|| format!("Failed to read numeric column '{}'", name))?;
        let values: Vec<Option<f64>> = cast.f64()?.into_iter().collect();
        let values = select(values, rows);
        if values.iter().any(Option::is_none) {
            anyhow::bail!(
                "Numeric column '{}' contains null values; impute or drop them first",
                name
            );
        }
        Ok(FeatureColumn::numeric(name, values.into_iter().flatten().collect()))
    } else {
        let values = select(column_to_strings(col)?, rows);
        Ok(FeatureColumn::categorical(
            name,
            values
                .into_iter()
                .map(|v| v.unwrap_or_else(|| MISSING_CATEGORY.to_string()))
                .collect(),
        ))
    }
}

fn select<T: Clone>(values: Vec<T>, rows: Option<&[usize]>) -> Vec<T> {
    match rows {
        Some(rows) => rows.iter().map(|&r| values[r].clone()).collect(),
        None => values,
    }
}

/// Build a feature matrix from every column except those in `exclude`
pub fn frame_to_features(df: &DataFrame, exclude: &[String]) -> Result<FeatureMatrix> {
    build_features(df, exclude, None)
}

fn build_features(df: &DataFrame, exclude: &[String], rows: Option<&[usize]>) -> Result<FeatureMatrix> {
    let columns = df
        .get_columns()
        .iter()
        .filter(|c| !exclude.iter().any(|e| e.as_str() == c.name().as_str()))
        .map(|c| to_feature_column(c, rows))
        .collect::<Result<Vec<_>>>()?;

    if columns.is_empty() {
        anyhow::bail!("No feature columns left after excluding {:?}", exclude);
    }

    Ok(FeatureMatrix::new(columns)?)
}

/// Split a frame into features and labels.
///
/// `drop_columns` are removed before anything else; rows without a usable
/// target value are left out of both features and labels.
pub fn frame_to_dataset(
    df: &DataFrame,
    target: &str,
    mapping: Option<&TargetMapping>,
    drop_columns: &[String],
) -> Result<Dataset> {
    for name in drop_columns {
        if df.column(name).is_err() {
            anyhow::bail!("Column '{}' listed for dropping does not exist", name);
        }
    }

    let extracted = extract_labels(df, target, mapping)?;

    let mut exclude = drop_columns.to_vec();
    exclude.push(target.to_string());
    let rows = (extracted.skipped > 0).then_some(extracted.rows.as_slice());
    let features = build_features(df, &exclude, rows)?;

    Ok(Dataset {
        features,
        labels: extracted.labels,
        skipped_rows: extracted.skipped,
    })
}
