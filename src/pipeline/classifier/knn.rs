//! k-nearest-neighbors voting on standardized features

use rayon::prelude::*;

use super::{check_training_input, check_width, Classifier, Standardizer, TrainedModel};
use crate::pipeline::error::{PipelineError, Result};
use crate::pipeline::matrix::{LabelVector, NumericMatrix};
use crate::pipeline::space::Configuration;

const PARAMETERS: &[&str] = &["k", "weights"];

/// Instance-based learner family
#[derive(Debug, Clone, Copy, Default)]
pub struct KNearestNeighbors;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Weighting {
    Uniform,
    /// Votes weighted by inverse distance
    Distance,
}

#[derive(Debug, Clone)]
struct KnnModel {
    scaler: Standardizer,
    points: Vec<Vec<f64>>,
    codes: Vec<usize>,
    n_classes: usize,
    k: usize,
    weighting: Weighting,
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        "knn"
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

        let k = params.usize_or("k", 5)?;
        if k == 0 {
            return Err(PipelineError::config("knn needs k >= 1"));
        }
        let weighting = match params.get("weights").map(|v| v.as_str()) {
            None | Some(Some("uniform")) => Weighting::Uniform,
            Some(Some("distance")) => Weighting::Distance,
            Some(_) => {
                return Err(PipelineError::config(
                    "knn weights must be 'uniform' or 'distance'",
                ))
            }
        };

        let scaler = Standardizer::fit(features);
        let points = scaler.transform(features);

        Ok(Box::new(KnnModel {
            scaler,
            points,
            codes: labels.codes().to_vec(),
            n_classes: labels.n_classes(),
            k: k.min(features.n_rows()),
            weighting,
        }))
    }
}

impl KnnModel {
    fn vote(&self, query: &[f64]) -> usize {
        let mut distances: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let d: f64 = p.iter().zip(query).map(|(a, b)| (a - b) * (a - b)).sum();
                (d.sqrt(), i)
            })
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes = vec![0.0; self.n_classes];
        for &(d, i) in distances.iter().take(self.k) {
            votes[self.codes[i]] += match self.weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance => 1.0 / (d + 1e-12),
            };
        }

        // Highest vote, lowest class code on ties
        votes
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (class, &v)| {
                if v > best.1 {
                    (class, v)
                } else {
                    best
                }
            })
            .0
    }
}

impl TrainedModel for KnnModel {
    fn predict(&self, features: &NumericMatrix) -> Result<Vec<usize>> {
        check_width("knn", features, self.scaler.means.len())?;

        Ok(features
            .rows()
            .par_iter()
            .map(|row| self.vote(&self.scaler.transform_row(row)))
            .collect())
    }
}
