//! Tabular data model shared by every pipeline stage
//!
//! `FeatureMatrix` is the column-oriented input (numeric or categorical
//! columns), `LabelVector` holds class codes, and `NumericMatrix` is the
//! row-major, all-numeric form consumed by resampling and classifiers.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

/// Kind tag carried by every feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Values of a single column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
        }
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&r| values[r]).collect())
            }
            ColumnData::Categorical(values) => {
                ColumnData::Categorical(rows.iter().map(|&r| values[r].clone()).collect())
            }
        }
    }
}

/// A named feature column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    name: String,
    data: ColumnData,
}

impl FeatureColumn {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Name and kind of a column, recorded at fit time to validate inference input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered, uniquely named columns sharing one row count
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<FeatureColumn>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix, rejecting duplicate names, ragged columns and
    /// non-finite numeric values.
    pub fn new(columns: Vec<FeatureColumn>) -> Result<Self> {
        if columns.is_empty() {
            return Err(PipelineError::invalid("feature matrix needs at least one column"));
        }

        let n_rows = columns[0].len();
        let mut seen = HashSet::with_capacity(columns.len());

        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PipelineError::invalid(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
            if column.len() != n_rows {
                return Err(PipelineError::invalid(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    n_rows
                )));
            }
            if let ColumnData::Numeric(values) = &column.data {
                if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                    return Err(PipelineError::invalid(format!(
                        "column '{}' has a non-finite value at row {}",
                        column.name, row
                    )));
                }
            }
        }

        Ok(Self { columns, n_rows })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Numeric columns in matrix order
    pub fn numeric_columns(&self) -> Vec<(&str, &[f64])> {
        self.columns
            .iter()
            .filter_map(|c| match &c.data {
                ColumnData::Numeric(values) => Some((c.name.as_str(), values.as_slice())),
                ColumnData::Categorical(_) => None,
            })
            .collect()
    }

    pub fn schema(&self) -> Vec<ColumnSpec> {
        self.columns
            .iter()
            .map(|c| ColumnSpec {
                name: c.name.clone(),
                kind: c.kind(),
            })
            .collect()
    }

    /// Select rows by index (indices may repeat)
    pub fn take_rows(&self, rows: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self
                .columns
                .iter()
                .map(|c| FeatureColumn {
                    name: c.name.clone(),
                    data: c.data.take(rows),
                })
                .collect(),
            n_rows: rows.len(),
        }
    }

    /// Copy of the matrix without the named columns; unknown names are ignored
    pub fn without_columns(&self, names: &[String]) -> FeatureMatrix {
        let drop: HashSet<&str> = names.iter().map(String::as_str).collect();
        FeatureMatrix {
            columns: self
                .columns
                .iter()
                .filter(|c| !drop.contains(c.name.as_str()))
                .cloned()
                .collect(),
            n_rows: self.n_rows,
        }
    }

    /// Check that every column of `schema` exists with the same kind
    pub fn check_schema(&self, schema: &[ColumnSpec]) -> Result<()> {
        for spec in schema {
            match self.column(&spec.name) {
                None => {
                    return Err(PipelineError::SchemaMismatch {
                        column: spec.name.clone(),
                        message: "column is missing".to_string(),
                    })
                }
                Some(column) if column.kind() != spec.kind => {
                    return Err(PipelineError::SchemaMismatch {
                        column: spec.name.clone(),
                        message: format!("expected {} column, found {}", spec.kind, column.kind()),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Restrict the matrix to the columns of `schema`, in schema order
    pub fn select_schema(&self, schema: &[ColumnSpec]) -> Result<FeatureMatrix> {
        self.check_schema(schema)?;
        let columns = schema
            .iter()
            .filter_map(|spec| self.column(&spec.name).cloned())
            .collect();
        Ok(FeatureMatrix {
            columns,
            n_rows: self.n_rows,
        })
    }
}

/// Class labels stored as codes into a sorted list of class names
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVector {
    classes: Vec<String>,
    codes: Vec<usize>,
}

impl LabelVector {
    /// Build labels from raw class identifiers; classes are sorted
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        let mut classes: Vec<String> = values.iter().map(|v| v.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();

        let index: BTreeMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let codes = values.iter().map(|v| index[v.as_ref()]).collect();

        Self { classes, codes }
    }

    /// Build labels from precomputed codes
    pub fn from_codes(codes: Vec<usize>, classes: Vec<String>) -> Result<Self> {
        if let Some(&bad) = codes.iter().find(|&&c| c >= classes.len()) {
            return Err(PipelineError::invalid(format!(
                "class code {} out of range for {} classes",
                bad,
                classes.len()
            )));
        }
        Ok(Self { classes, codes })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    pub fn class_name(&self, code: usize) -> &str {
        &self.classes[code]
    }

    /// Row count per class code
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &code in &self.codes {
            counts[code] += 1;
        }
        counts
    }

    /// Select rows by index, keeping the full class list so codes stay stable
    pub fn take(&self, rows: &[usize]) -> LabelVector {
        LabelVector {
            classes: self.classes.clone(),
            codes: rows.iter().map(|&r| self.codes[r]).collect(),
        }
    }

    /// Fail unless at least two distinct classes are present
    pub fn require_two_classes(&self) -> Result<()> {
        let present = self.class_counts().iter().filter(|&&c| c > 0).count();
        if present < 2 {
            return Err(PipelineError::invalid(format!(
                "labels contain {} distinct class(es), at least 2 are required",
                present
            )));
        }
        Ok(())
    }
}

/// Check that a matrix and label vector describe the same rows
pub fn check_aligned(matrix_rows: usize, labels: &LabelVector) -> Result<()> {
    if matrix_rows != labels.len() {
        return Err(PipelineError::invalid(format!(
            "matrix has {} rows but label vector has {}",
            matrix_rows,
            labels.len()
        )));
    }
    Ok(())
}

/// Row-major, all-numeric feature matrix
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl NumericMatrix {
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(PipelineError::invalid(format!(
                "row {} has {} values, expected {}",
                i,
                row.len(),
                names.len()
            )));
        }
        Ok(Self { names, rows })
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> &[f64] {
        &self.rows[index]
    }

    pub fn take_rows(&self, rows: &[usize]) -> NumericMatrix {
        NumericMatrix {
            names: self.names.clone(),
            rows: rows.iter().map(|&r| self.rows[r].clone()).collect(),
        }
    }

    /// Append rows that are known to have the right width
    pub(crate) fn push_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.names.len());
        self.rows.push(row);
    }
}
