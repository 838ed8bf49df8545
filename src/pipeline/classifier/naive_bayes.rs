//! Gaussian naive Bayes

use std::f64::consts::PI;

use super::{check_training_input, check_width, Classifier, TrainedModel};
use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::matrix::{LabelVector, NumericMatrix};
use crate::pipeline::space::Configuration;

const PARAMETERS: &[&str] = &["var_smoothing"];

/// Probabilistic learner family
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianNaiveBayes;

#[derive(Debug, Clone)]
struct ClassStats {
    code: usize,
    log_prior: f64,
    means: Vec<f64>,
    variances: Vec<f64>,
}

#[derive(Debug, Clone)]
struct NaiveBayesModel {
    width: usize,
    classes: Vec<ClassStats>,
}

impl Classifier for GaussianNaiveBayes {
    fn name(&self) -> &str {
        "naive-bayes"
    }

    fn parameters(&self) -> &[&'static str] {
        PARAMETERS
    }

    fn train(
        &self,
        features: &NumericMatrix,
        labels: &LabelVector,
        params: &Configuration,
    ) -> Result<Box<dyn TrainedModel>> {
        params.check_known(self.name(), PARAMETERS)?;
        check_training_input(self.name(), features, labels)?;

        let var_smoothing = params.f64_or("var_smoothing", 1e-9)?;
        if var_smoothing < 0.0 {
            return Err(PipelineError::config("var_smoothing must be >= 0"));
        }

        let width = features.n_cols();
        let n = features.n_rows() as f64;

        // Smoothing is relative to the largest feature variance
        let epsilon = var_smoothing * largest_variance(features).max(1.0);

        let mut classes = Vec::new();
        for (code, &count) in labels.class_counts().iter().enumerate() {
            if count == 0 {
                continue;
            }

            // Single-pass Welford mean and variance
            let mut means = vec![0.0; width];
            let mut m2 = vec![0.0; width];
            let mut seen = 0.0;
            for (row, _) in features
                .rows()
                .iter()
                .zip(labels.codes())
                .filter(|(_, c)| **c == code)
            {
                seen += 1.0;
                for ((mean, m), &x) in means.iter_mut().zip(m2.iter_mut()).zip(row) {
                    let delta = x - *mean;
                    *mean += delta / seen;
                    *m += delta * (x - *mean);
                }
            }

            classes.push(ClassStats {
                code,
                log_prior: (count as f64 / n).ln(),
                means,
                variances: m2.iter().map(|m| m / seen + epsilon).collect(),
            });
        }

        Ok(Box::new(NaiveBayesModel { width, classes }))
    }
}

fn largest_variance(features: &NumericMatrix) -> f64 {
    let n = features.n_rows() as f64;
    (0..features.n_cols())
        .map(|c| {
            let mean = features.rows().iter().map(|r| r[c]).sum::<f64>() / n;
            features.rows().iter().map(|r| (r[c] - mean).powi(2)).sum::<f64>() / n
        })
        .fold(0.0, f64::max)
}

impl ClassStats {
    fn log_posterior(&self, row: &[f64]) -> f64 {
        let likelihood: f64 = row
            .iter()
            .zip(&self.means)
            .zip(&self.variances)
            .map(|((&x, &mean), &var)| {
                if var > 0.0 {
                    -0.5 * ((x - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
                } else if x == mean {
                    0.0
                } else {
                    f64::NEG_INFINITY
                }
            })
            .sum();
        self.log_prior + likelihood
    }
}

impl TrainedModel for NaiveBayesModel {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>> {
        check_width("naive-bayes", features, self.width)?;

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                self.classes
                    .iter()
                    .map(|c| (c.log_posterior(row), c.code))
                    .fold((f64::NEG_INFINITY, self.classes[0].code), |best, cur| {
                        if cur.0 > best.0 {
                            cur
                        } else {
                            best
                        }
                    })
                    .1
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classifier::test_support::{accuracy, blobs};

    #[test]
    fn test_separates_blobs() {
        let (m, labels) = blobs();
        let model = GaussianNaiveBayes
            .train(&m, &labels, &Configuration::new())
            .unwrap();
        assert_eq!(accuracy(model.as_ref(), &m, &labels), 1.0);
    }

    #[test]
    fn test_prior_breaks_ambiguity() {
        // Identical feature distributions, class "a" three times as common
        let rows = vec![vec![0.0], vec![1.0], vec![0.0], vec![1.0], vec![0.0], vec![1.0], vec![0.0], vec![1.0]];
        let m = NumericMatrix::new(vec!["x".into()], rows).unwrap();
        let labels = LabelVector::new(&["a", "a", "a", "a", "a", "a", "b", "b"]);
        let model = GaussianNaiveBayes
            .train(&m, &labels, &Configuration::new())
            .unwrap();
        let query = NumericMatrix::new(vec!["x".into()], vec![vec![0.5]]).unwrap();
        assert_eq!(model.predict(&query).unwrap(), vec![0]);
    }

    #[test]
    fn test_negative_smoothing_rejected() {
        let (m, labels) = blobs();
        let params = Configuration::new().with("var_smoothing", -1.0);
        assert!(GaussianNaiveBayes.train(&m, &labels, &params).is_err());
    }
}
