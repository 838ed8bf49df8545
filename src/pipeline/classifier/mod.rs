//! Pluggable classifier capability
//!
//! The search engine and orchestrator only see the [`Classifier`] and
//! [`TrainedModel`] traits. Three learner families ship with the crate;
//! callers can supply their own.

mod knn;
mod logistic;
mod naive_bayes;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use knn::KNearestNeighbors;
pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;

use super::error::{PipelineError, Result};
use super::matrix::{check_aligned, LabelVector, NumericMatrix};
use super::space::Configuration;

/// Trains a model from features, labels and hyperparameters
pub trait Classifier: Send + Sync {
    /// Learner family name, used in logs and artifacts
    fn name(&self) -> &str;

    /// Parameter names this learner accepts
    fn parameters(&self) -> &[&'static str];

    fn train(
        &self,
        features: &NumericMatrix,
        labels: &LabelVector,
        params: &Configuration,
    ) -> Result<Box<dyn TrainedModel>>;
}

/// A trained model that maps feature rows to class codes
pub trait TrainedModel: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>>;
}

/// Built-in learner families
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearnerKind {
    #[default]
    Logistic,
    Knn,
    NaiveBayes,
}

impl LearnerKind {
    pub fn build(&self) -> Arc<dyn Classifier> {
        match self {
            LearnerKind::Logistic => Arc::new(LogisticRegression),
            LearnerKind::Knn => Arc::new(KNearestNeighbors),
            LearnerKind::NaiveBayes => Arc::new(GaussianNaiveBayes),
        }
    }
}

impl std::fmt::Display for LearnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnerKind::Logistic => write!(f, "logistic"),
            LearnerKind::Knn => write!(f, "knn"),
            LearnerKind::NaiveBayes => write!(f, "naive-bayes"),
        }
    }
}

impl std::str::FromStr for LearnerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" => Ok(LearnerKind::Logistic),
            "knn" => Ok(LearnerKind::Knn),
            "naive-bayes" | "naive_bayes" | "nb" => Ok(LearnerKind::NaiveBayes),
            _ => Err(format!(
                "Unknown learner: '{}'. Use 'logistic', 'knn' or 'naive-bayes'.",
                s
            )),
        }
    }
}

/// Common checks before training
fn check_training_input(
    learner: &str,
    features: &NumericMatrix,
    labels: &LabelVector,
) -> Result<()> {
    check_aligned(features.n_rows(), labels)?;
    if features.n_rows() == 0 {
        return Err(PipelineError::Classifier {
            learner: learner.to_string(),
            message: "cannot train on zero rows".to_string(),
        });
    }
    Ok(())
}

/// Common checks before prediction
fn check_width(learner: &str, features: &NumericMatrix, expected: usize) -> Result<()> {
    if features.n_cols() != expected {
        return Err(PipelineError::Classifier {
            learner: learner.to_string(),
            message: format!(
                "prediction input has {} features, expected {}",
                features.n_cols(),
                expected
            ),
        });
    }
    Ok(())
}

/// Per-feature z-score scaling fitted on training rows
#[derive(Debug, Clone)]
struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    fn fit(features: &NumericMatrix) -> Self {
        let n = features.n_rows().max(1) as f64;
        let width = features.n_cols();
        let mut means = vec![0.0; width];
        for row in features.rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut scales = vec![0.0; width];
        for row in features.rows() {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in scales.iter_mut() {
            let std = (*s / n).sqrt();
            *s = if std > 0.0 { std } else { 1.0 };
        }

        Self { means, scales }
    }

    fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }

    fn transform(&self, features: &NumericMatrix) -> Vec<Vec<f64>> {
        features.rows().iter().map(|r| self.transform_row(r)).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learner_kind_roundtrip_names() {
        for kind in [LearnerKind::Logistic, LearnerKind::Knn, LearnerKind::NaiveBayes] {
            assert_eq!(kind.to_string().parse::<LearnerKind>(), Ok(kind));
            assert_eq!(kind.build().name(), kind.to_string());
        }
    }

    #[test]
    fn test_standardizer_constant_column() {
        let m = NumericMatrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 5.0], vec![3.0, 5.0]],
        )
        .unwrap();
        let s = Standardizer::fit(&m);
        assert_eq!(s.transform_row(&[1.0, 5.0]), vec![-1.0, 0.0]);
    }
}
