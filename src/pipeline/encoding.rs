//! Categorical encoding for high-cardinality columns
//!
//! `fit` builds an [`EncodingTable`] from the training rows only;
//! `transform` replays that table on any matrix without looking at the
//! statistics of the data it is given.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{PipelineError, Result};
use super::matrix::{check_aligned, ColumnData, FeatureMatrix, LabelVector, NumericMatrix};

/// Encoding strategy for a categorical column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingStrategy {
    /// Category -> number of occurrences in the fit set
    Frequency,
    /// Category -> mean of the binary label over its rows
    Target,
    /// One 0/1 column per category (low-cardinality columns only)
    OneHot,
}

impl std::fmt::Display for EncodingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingStrategy::Frequency => write!(f, "frequency"),
            EncodingStrategy::Target => write!(f, "target"),
            EncodingStrategy::OneHot => write!(f, "one-hot"),
        }
    }
}

impl std::str::FromStr for EncodingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frequency" => Ok(EncodingStrategy::Frequency),
            "target" => Ok(EncodingStrategy::Target),
            "one-hot" | "onehot" => Ok(EncodingStrategy::OneHot),
            _ => Err(format!(
                "Unknown encoding strategy: '{}'. Use 'frequency', 'target' or 'one-hot'.",
                s
            )),
        }
    }
}

/// Per-column strategy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Distinct-value count at or above which a column is high-cardinality
    pub cardinality_threshold: usize,
    /// Strategy for high-cardinality columns
    pub high_cardinality: EncodingStrategy,
    /// Strategy for the remaining categorical columns
    pub low_cardinality: EncodingStrategy,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            cardinality_threshold: 10,
            high_cardinality: EncodingStrategy::Frequency,
            low_cardinality: EncodingStrategy::OneHot,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cardinality_threshold == 0 {
            return Err(PipelineError::config("cardinality threshold must be at least 1"));
        }
        Ok(())
    }

    fn strategy_for(&self, cardinality: usize) -> EncodingStrategy {
        if cardinality >= self.cardinality_threshold {
            self.high_cardinality
        } else {
            self.low_cardinality
        }
    }
}

/// Fitted encoding of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ColumnEncoding {
    Frequency {
        counts: BTreeMap<String, f64>,
    },
    Target {
        means: BTreeMap<String, f64>,
        global_mean: f64,
    },
    OneHot {
        categories: Vec<String>,
    },
}

impl ColumnEncoding {
    pub fn strategy(&self) -> EncodingStrategy {
        match self {
            ColumnEncoding::Frequency { .. } => EncodingStrategy::Frequency,
            ColumnEncoding::Target { .. } => EncodingStrategy::Target,
            ColumnEncoding::OneHot { .. } => EncodingStrategy::OneHot,
        }
    }

    /// Code assigned to categories never seen during fit
    pub fn default_code(&self) -> Vec<f64> {
        match self {
            ColumnEncoding::Frequency { .. } => vec![0.0],
            ColumnEncoding::Target { global_mean, .. } => vec![*global_mean],
            ColumnEncoding::OneHot { categories } => vec![0.0; categories.len()],
        }
    }

    /// Number of output columns this encoding produces
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoding::OneHot { categories } => categories.len(),
            _ => 1,
        }
    }

    fn encode_into(&self, category: &str, out: &mut Vec<f64>) {
        match self {
            ColumnEncoding::Frequency { counts } => {
                out.push(counts.get(category).copied().unwrap_or(0.0));
            }
            ColumnEncoding::Target { means, global_mean } => {
                out.push(means.get(category).copied().unwrap_or(*global_mean));
            }
            ColumnEncoding::OneHot { categories } => {
                out.extend(categories.iter().map(|c| if c == category { 1.0 } else { 0.0 }));
            }
        }
    }

    /// Encode a single category
    pub fn encode(&self, category: &str) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        self.encode_into(category, &mut out);
        out
    }
}

/// Fitted encoding of a named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub column: String,
    /// Distinct values seen at fit time
    pub cardinality: usize,
    #[serde(flatten)]
    pub encoding: ColumnEncoding,
}

impl EncodedColumn {
    /// Names of the output columns
    pub fn output_names(&self) -> Vec<String> {
        match &self.encoding {
            ColumnEncoding::OneHot { categories } => categories
                .iter()
                .map(|c| format!("{}={}", self.column, c))
                .collect(),
            _ => vec![self.column.clone()],
        }
    }
}

/// Encoding of every categorical column seen at fit time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingTable {
    pub columns: Vec<EncodedColumn>,
}

impl EncodingTable {
    pub fn get(&self, column: &str) -> Option<&EncodedColumn> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Fit an encoding table on the training rows
pub fn fit(
    train: &FeatureMatrix,
    labels: &LabelVector,
    config: &EncoderConfig,
) -> Result<EncodingTable> {
    config.validate()?;
    check_aligned(train.n_rows(), labels)?;

    let categorical: Vec<(&str, &[String])> = train
        .columns()
        .iter()
        .filter_map(|c| match c.data() {
            ColumnData::Categorical(values) => Some((c.name(), values.as_slice())),
            ColumnData::Numeric(_) => None,
        })
        .collect();

    let columns = categorical
        .par_iter()
        .map(|(name, values)| fit_column(name, values, labels, config))
        .collect::<Result<Vec<_>>>()?;

    debug!(columns = columns.len(), "encoding table fitted");

    Ok(EncodingTable { columns })
}

fn fit_column(
    name: &str,
    values: &[String],
    labels: &LabelVector,
    config: &EncoderConfig,
) -> Result<EncodedColumn> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }
    let cardinality = counts.len();

    let encoding = match config.strategy_for(cardinality) {
        EncodingStrategy::Frequency => ColumnEncoding::Frequency {
            counts: counts
                .iter()
                .map(|(k, &v)| (k.to_string(), v as f64))
                .collect(),
        },
        EncodingStrategy::Target => {
            if labels.n_classes() != 2 {
                return Err(PipelineError::encoding(
                    name,
                    format!(
                        "target encoding needs a binary label, found {} classes",
                        labels.n_classes()
                    ),
                ));
            }

            let mut positives: BTreeMap<&str, usize> = BTreeMap::new();
            for (v, &code) in values.iter().zip(labels.codes()) {
                *positives.entry(v.as_str()).or_insert(0) += usize::from(code == 1);
            }

            let total_positive: usize = positives.values().sum();
            let global_mean = if values.is_empty() {
                0.0
            } else {
                total_positive as f64 / values.len() as f64
            };

            ColumnEncoding::Target {
                means: counts
                    .iter()
                    .map(|(k, &n)| (k.to_string(), positives[k] as f64 / n as f64))
                    .collect(),
                global_mean,
            }
        }
        EncodingStrategy::OneHot => {
            if cardinality >= config.cardinality_threshold {
                return Err(PipelineError::encoding(
                    name,
                    format!(
                        "one-hot requested for {} distinct values (cardinality threshold {})",
                        cardinality, config.cardinality_threshold
                    ),
                ));
            }
            ColumnEncoding::OneHot {
                categories: counts.keys().map(|k| k.to_string()).collect(),
            }
        }
    };

    Ok(EncodedColumn {
        column: name.to_string(),
        cardinality,
        encoding,
    })
}

/// Encode a matrix with a fitted table.
///
/// Numeric columns pass through; categorical columns are replaced in place
/// by their encoded columns.
pub fn transform(matrix: &FeatureMatrix, table: &EncodingTable) -> Result<NumericMatrix> {
    let mut names = Vec::new();
    let mut rows: Vec<Vec<f64>> = vec![Vec::new(); matrix.n_rows()];

    for column in matrix.columns() {
        match column.data() {
            ColumnData::Numeric(values) => {
                names.push(column.name().to_string());
                for (row, &v) in rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
            ColumnData::Categorical(values) => {
                let encoded = table.get(column.name()).ok_or_else(|| {
                    PipelineError::encoding(column.name(), "column is not in the encoding table")
                })?;
                names.extend(encoded.output_names());
                for (row, v) in rows.iter_mut().zip(values) {
                    encoded.encoding.encode_into(v, row);
                }
            }
        }
    }

    NumericMatrix::new(names, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::matrix::FeatureColumn;

    fn train() -> (FeatureMatrix, LabelVector) {
        let m = FeatureMatrix::new(vec![
            FeatureColumn::numeric("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            FeatureColumn::categorical("city", vec!["a", "b", "a", "c", "a", "b"]),
        ])
        .unwrap();
        let labels = LabelVector::new(&["1", "0", "1", "0", "0", "1"]);
        (m, labels)
    }

    fn config(strategy: EncodingStrategy) -> EncoderConfig {
        EncoderConfig {
            cardinality_threshold: 2,
            high_cardinality: strategy,
            low_cardinality: EncodingStrategy::OneHot,
        }
    }

    #[test]
    fn test_frequency_reproduces_counts() {
        let (m, labels) = train();
        let table = fit(&m, &labels, &config(EncodingStrategy::Frequency)).unwrap();
        let encoded = transform(&m, &table).unwrap();
        let city: Vec<f64> = encoded.rows().iter().map(|r| r[1]).collect();
        assert_eq!(city, vec![3.0, 2.0, 3.0, 1.0, 3.0, 2.0]);
        assert_eq!(encoded.names(), &["x", "city"]);
    }

    #[test]
    fn test_target_means_and_unseen_default() {
        let (m, labels) = train();
        let table = fit(&m, &labels, &config(EncodingStrategy::Target)).unwrap();
        let col = table.get("city").unwrap();
        assert_eq!(col.encoding.encode("a"), vec![2.0 / 3.0]);
        assert_eq!(col.encoding.encode("c"), vec![0.0]);
        assert_eq!(col.encoding.encode("zzz"), vec![0.5]);
    }

    #[test]
    fn test_one_hot_rejected_for_high_cardinality() {
        let (m, labels) = train();
        let err = fit(&m, &labels, &config(EncodingStrategy::OneHot)).unwrap_err();
        assert!(matches!(err, PipelineError::Encoding { ref column, .. } if column == "city"));
    }

    #[test]
    fn test_one_hot_for_low_cardinality() {
        let (m, labels) = train();
        let cfg = EncoderConfig {
            cardinality_threshold: 10,
            ..EncoderConfig::default()
        };
        let table = fit(&m, &labels, &cfg).unwrap();
        let encoded = transform(&m, &table).unwrap();
        assert_eq!(encoded.names(), &["x", "city=a", "city=b", "city=c"]);
        assert_eq!(encoded.row(3), &[4.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_target_requires_binary_label() {
        let (m, _) = train();
        let labels = LabelVector::new(&["a", "b", "c", "a", "b", "c"]);
        let err = fit(&m, &labels, &config(EncodingStrategy::Target)).unwrap_err();
        assert!(err.to_string().contains("binary label"));
    }

    #[test]
    fn test_unknown_column_fails_transform() {
        let (m, labels) = train();
        let table = fit(&m, &labels, &config(EncodingStrategy::Frequency)).unwrap();
        let other = FeatureMatrix::new(vec![FeatureColumn::categorical("zip", vec!["1"])]).unwrap();
        assert!(transform(&other, &table).is_err());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("one-hot".parse::<EncodingStrategy>(), Ok(EncodingStrategy::OneHot));
        assert_eq!("Target".parse::<EncodingStrategy>(), Ok(EncodingStrategy::Target));
        assert!("woe".parse::<EncodingStrategy>().is_err());
    }
}
