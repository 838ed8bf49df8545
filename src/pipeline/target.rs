//! Target column extraction and mapping
//!
//! Turns a polars target column of any dtype into a [`LabelVector`],
//! optionally collapsing it to a binary event / non-event label first.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::matrix::LabelVector;

/// Label used for rows matching [`TargetMapping::event_value`]
pub const EVENT_LABEL: &str = "1";
/// Label used for rows matching [`TargetMapping::non_event_value`]
pub const NON_EVENT_LABEL: &str = "0";

/// Mapping from two raw target values to the binary labels "1" and "0"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to "1" (event)
    pub event_value: String,
    /// Value that maps to "0" (non-event)
    pub non_event_value: String,
}

impl TargetMapping {
    pub fn new(event_value: impl Into<String>, non_event_value: impl Into<String>) -> Self {
        Self {
            event_value: event_value.into(),
            non_event_value: non_event_value.into(),
        }
    }

    /// Binary label for a raw target value, if it is one of the two mapped values
    pub fn map(&self, value: &str) -> Option<&'static str> {
        if value == self.event_value {
            Some(EVENT_LABEL)
        } else if value == self.non_event_value {
            Some(NON_EVENT_LABEL)
        } else {
            None
        }
    }
}

/// Labels extracted from a target column
#[derive(Debug, Clone)]
pub struct ExtractedLabels {
    pub labels: LabelVector,
    /// Frame rows the labels belong to, ascending
    pub rows: Vec<usize>,
    /// Rows skipped for a null or unmapped target value
    pub skipped: usize,
}

/// Render any column as optional strings; nulls stay `None`
pub fn column_to_strings(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

/// Extract class labels from the target column.
///
/// Rows with a null target are skipped. With a mapping, rows whose value is
/// neither the event nor the non-event value are skipped too.
pub fn extract_labels(
    df: &DataFrame,
    target: &str,
    mapping: Option<&TargetMapping>,
) -> Result<ExtractedLabels> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if target_col.len() == 0 {
        anyhow::bail!("Target column '{}' is empty", target);
    }
    if target_col.null_count() == target_col.len() {
        anyhow::bail!("Target column '{}' contains only null values", target);
    }

    let mut rows = Vec::new();
    let mut values = Vec::new();
    for (row, value) in column_to_strings(target_col)?.into_iter().enumerate() {
        let label = match (value, mapping) {
            (Some(v), Some(m)) => m.map(&v).map(str::to_string),
            (Some(v), None) => Some(v),
            (None, _) => None,
        };
        if let Some(label) = label {
            rows.push(row);
            values.push(label);
        }
    }

    if values.is_empty() {
        anyhow::bail!(
            "Target column '{}' has no rows matching the target mapping",
            target
        );
    }

    let skipped = target_col.len() - rows.len();
    Ok(ExtractedLabels {
        labels: LabelVector::new(&values),
        rows,
        skipped,
    })
}

/// Count rows per distinct target value, sorted by value; nulls are left out
pub fn class_distribution(df: &DataFrame, target: &str) -> Result<Vec<(String, usize)>> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let mut counts = std::collections::BTreeMap::new();
    for value in column_to_strings(target_col)?.into_iter().flatten() {
        *counts.entry(value).or_insert(0usize) += 1;
    }
    Ok(counts.into_iter().collect())
}
