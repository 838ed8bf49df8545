//! Correlation-based feature pruning

use faer::Mat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{PipelineError, Result};
use super::matrix::FeatureMatrix;

/// Represents a correlated pair of features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Pearson correlation over the numeric columns of a matrix.
///
/// Symmetric with a unit diagonal. A constant column has zero correlation
/// with every other column. Immutable once computed.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Mat<f64>,
}

impl CorrelationMatrix {
    /// Compute the correlation matrix of the numeric columns of `matrix`.
    ///
    /// Algorithm:
    /// 1. Standardize every column: Z = (X - mean) / (std * sqrt(n))
    /// 2. Compute R = Z^T * Z
    pub fn compute(matrix: &FeatureMatrix) -> Self {
        let numeric = matrix.numeric_columns();
        let names: Vec<String> = numeric.iter().map(|(name, _)| name.to_string()).collect();
        let n_cols = numeric.len();
        let n_rows = matrix.n_rows();

        // Standardize columns in parallel; constant columns become all zeros
        let standardized: Vec<Vec<f64>> = numeric
            .par_iter()
            .map(|(_, values)| standardize(values))
            .collect();

        let mut z = Mat::<f64>::zeros(n_rows, n_cols);
        for (col_idx, col_data) in standardized.iter().enumerate() {
            for (row_idx, &val) in col_data.iter().enumerate() {
                z[(row_idx, col_idx)] = val;
            }
        }

        let mut values = z.transpose() * &z;
        for i in 0..n_cols {
            values[(i, i)] = 1.0;
            for j in 0..n_cols {
                if i != j {
                    values[(i, j)] = values[(i, j)].clamp(-1.0, 1.0);
                }
            }
        }

        Self { names, values }
    }

    /// Numeric column names, in matrix order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Pairs `(i, j)`, `i < j`, whose absolute correlation exceeds `threshold`,
    /// in index order
    pub fn correlated_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.size();
        let mut pairs = Vec::new();

        // Extract upper triangle
        for i in 0..n {
            for j in (i + 1)..n {
                let corr = self.get(i, j);
                if corr.abs() > threshold && !corr.is_nan() {
                    pairs.push(CorrelatedPair {
                        feature1: self.names[i].clone(),
                        feature2: self.names[j].clone(),
                        correlation: corr,
                    });
                }
            }
        }

        pairs
    }
}

/// Scale a column to zero mean and unit norm so that Z^T Z is the correlation
fn standardize(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;
    let std = var.sqrt();

    if std == 0.0 || !std.is_finite() {
        return vec![0.0; n];
    }

    let scale = std * (n as f64).sqrt();
    values.iter().map(|x| (x - mean) / scale).collect()
}

/// Columns dropped by the correlation pruner, with the evidence for each drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropList {
    /// Threshold the list was fit with
    pub threshold: f64,
    /// Dropped columns, in column order
    pub columns: Vec<String>,
    /// Correlated pairs that caused a drop (retained feature first)
    pub pairs: Vec<CorrelatedPair>,
}

impl DropList {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

/// Validate a correlation threshold
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(PipelineError::config(format!(
            "correlation threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Determine which features to drop from the correlation matrix.
///
/// Strategy: every pair above the threshold marks its higher-index column
/// for removal, so the lower index of each pair is always retained. Every
/// causing pair is recorded, including pairs whose higher member was
/// already marked by an earlier pair.
pub fn select_features_to_drop(
    corr: &CorrelationMatrix,
    threshold: f64,
) -> (Vec<String>, Vec<CorrelatedPair>) {
    let n = corr.size();
    let mut dropped = vec![false; n];
    let mut causes = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let c = corr.get(i, j);
            if c.abs() > threshold && !c.is_nan() {
                dropped[j] = true;
                causes.push(CorrelatedPair {
                    feature1: corr.names()[i].clone(),
                    feature2: corr.names()[j].clone(),
                    correlation: c,
                });
            }
        }
    }

    let columns = corr
        .names()
        .iter()
        .zip(dropped.iter())
        .filter(|(_, &d)| d)
        .map(|(name, _)| name.clone())
        .collect();

    (columns, causes)
}

/// Fit the pruner on a training matrix
pub fn fit(train: &FeatureMatrix, threshold: f64) -> Result<DropList> {
    validate_threshold(threshold)?;

    let corr = CorrelationMatrix::compute(train);
    let (columns, pairs) = select_features_to_drop(&corr, threshold);

    debug!(
        numeric_columns = corr.size(),
        dropped = columns.len(),
        threshold,
        "correlation pruner fitted"
    );

    Ok(DropList {
        threshold,
        columns,
        pairs,
    })
}

/// Remove the drop-list columns; the input matrix is left untouched
pub fn apply(matrix: &FeatureMatrix, drop_list: &DropList) -> FeatureMatrix {
    matrix.without_columns(&drop_list.columns)
}
