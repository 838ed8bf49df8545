//! One-vs-rest logistic regression trained by batch gradient descent

use super::{check_training_input, check_width, Classifier, Standardizer, TrainedModel};
use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::matrix::{LabelVector, NumericMatrix};
use crate::pipeline::space::Configuration;

const PARAMETERS: &[&str] = &["learning_rate", "epochs", "l2"];

/// Linear learner family
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticRegression;

#[derive(Debug, Clone)]
struct LogisticModel {
    scaler: Standardizer,
    /// One (weights, bias) per scored class
    weights: Vec<(Vec<f64>, f64)>,
    /// Class code scored by each weight vector
    scored: Vec<usize>,
    binary: bool,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

/// Fit one binary model for `targets` (1.0 / 0.0)
fn fit_binary(x: &[Vec<f64>], targets: &[f64], lr: f64, epochs: usize, l2: f64) -> (Vec<f64>, f64) {
    let n = x.len() as f64;
    let width = x.first().map_or(0, Vec::len);
    let mut w = vec![0.0; width];
    let mut b = 0.0;

    for _ in 0..epochs {
        let mut grad_w = vec![0.0; width];
        let mut grad_b = 0.0;
        for (row, &t) in x.iter().zip(targets) {
            let err = sigmoid(dot(&w, row) + b) - t;
            for (g, v) in grad_w.iter_mut().zip(row) {
                *g += err * v;
            }
            grad_b += err;
        }
        for (wi, g) in w.iter_mut().zip(&grad_w) {
            *wi -= lr * (g / n + l2 * *wi);
        }
        b -= lr * grad_b / n;
    }

    (w, b)
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic"
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

        let lr = params.f64_or("learning_rate", 0.1)?;
        let epochs = params.usize_or("epochs", 200)?;
        let l2 = params.f64_or("l2", 0.0)?;
        if !(lr > 0.0) || l2 < 0.0 {
            return Err(PipelineError::config(format!(
                "logistic needs learning_rate > 0 and l2 >= 0, got {} and {}",
                lr, l2
            )));
        }

        let scaler = Standardizer::fit(features);
        let x = scaler.transform(features);

        let binary = labels.n_classes() == 2;
        let scored: Vec<usize> = if binary {
            vec![1]
        } else {
            (0..labels.n_classes()).collect()
        };

        let weights = scored
            .iter()
            .map(|&class| {
                let targets: Vec<f64> = labels
                    .codes()
                    .iter()
                    .map(|&c| if c == class { 1.0 } else { 0.0 })
                    .collect();
                fit_binary(&x, &targets, lr, epochs, l2)
            })
            .collect();

        Ok(Box::new(LogisticModel {
            scaler,
            weights,
            scored,
            binary,
        }))
    }
}

impl TrainedModel for LogisticModel {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>> {
        check_width("logistic", features, self.scaler.means.len())?;

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                let x = self.scaler.transform_row(row);
                if self.binary {
                    let (w, b) = &self.weights[0];
                    usize::from(sigmoid(dot(w, &x) + b) >= 0.5)
                } else {
                    self.weights
                        .iter()
                        .zip(&self.scored)
                        .map(|((w, b), &class)| (dot(w, &x) + b, class))
                        .fold((f64::NEG_INFINITY, 0), |best, cur| {
                            if cur.0 > best.0 {
                                cur
                            } else {
                                best
                            }
                        })
                        .1
                }
            })
            .collect())
    }
}
