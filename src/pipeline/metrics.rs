//! Classification metrics used to score cross-validation folds

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};

/// Metric to maximize during the search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    Accuracy,
    /// Mean per-class recall
    #[default]
    BalancedAccuracy,
    /// Macro-averaged F1
    F1,
    /// Macro-averaged precision
    Precision,
    /// Macro-averaged recall
    Recall,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Accuracy => write!(f, "accuracy"),
            Metric::BalancedAccuracy => write!(f, "balanced-accuracy"),
            Metric::F1 => write!(f, "f1"),
            Metric::Precision => write!(f, "precision"),
            Metric::Recall => write!(f, "recall"),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "accuracy" => Ok(Metric::Accuracy),
            "balanced-accuracy" => Ok(Metric::BalancedAccuracy),
            "f1" => Ok(Metric::F1),
            "precision" => Ok(Metric::Precision),
            "recall" => Ok(Metric::Recall),
            _ => Err(format!(
                "Unknown metric: '{}'. Use accuracy, balanced-accuracy, f1, precision or recall.",
                s
            )),
        }
    }
}

/// Confusion counts indexed `[actual][predicted]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[usize], predicted: &[usize], n_classes: usize) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(PipelineError::invalid(format!(
                "{} labels but {} predictions",
                actual.len(),
                predicted.len()
            )));
        }

        let mut counts = vec![vec![0usize; n_classes]; n_classes];
        for (&a, &p) in actual.iter().zip(predicted) {
            if a >= n_classes || p >= n_classes {
                return Err(PipelineError::invalid(format!(
                    "class code out of range for {} classes",
                    n_classes
                )));
            }
            counts[a][p] += 1;
        }
        Ok(Self { counts })
    }

    fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    fn correct(&self, class: usize) -> usize {
        self.counts[class][class]
    }

    /// Classes that occur in either the truth or the predictions
    fn active_classes(&self) -> Vec<usize> {
        (0..self.counts.len())
            .filter(|&c| self.support(c) > 0 || self.predicted(c) > 0)
            .collect()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = (0..self.counts.len()).map(|c| self.correct(c)).sum();
        correct as f64 / total as f64
    }

    fn precision_of(&self, class: usize) -> f64 {
        let predicted = self.predicted(class);
        if predicted == 0 {
            0.0
        } else {
            self.correct(class) as f64 / predicted as f64
        }
    }

    fn recall_of(&self, class: usize) -> f64 {
        let support = self.support(class);
        if support == 0 {
            0.0
        } else {
            self.correct(class) as f64 / support as f64
        }
    }

    fn macro_average(&self, f: impl Fn(usize) -> f64) -> f64 {
        let classes = self.active_classes();
        if classes.is_empty() {
            return 0.0;
        }
        classes.iter().map(|&c| f(c)).sum::<f64>() / classes.len() as f64
    }

    pub fn balanced_accuracy(&self) -> f64 {
        let present: Vec<usize> = (0..self.counts.len())
            .filter(|&c| self.support(c) > 0)
            .collect();
        if present.is_empty() {
            return 0.0;
        }
        present.iter().map(|&c| self.recall_of(c)).sum::<f64>() / present.len() as f64
    }

    pub fn macro_precision(&self) -> f64 {
        self.macro_average(|c| self.precision_of(c))
    }

    pub fn macro_recall(&self) -> f64 {
        self.macro_average(|c| self.recall_of(c))
    }

    pub fn macro_f1(&self) -> f64 {
        self.macro_average(|c| {
            let p = self.precision_of(c);
            let r = self.recall_of(c);
            if p + r == 0.0 {
                0.0
            } else {
                2.0 * p * r / (p + r)
            }
        })
    }
}

impl Metric {
    /// Score predictions against the truth; higher is better
    pub fn score(&self, actual: &[usize], predicted: &[usize], n_classes: usize) -> Result<f64> {
        let cm = ConfusionMatrix::from_labels(actual, predicted, n_classes)?;
        Ok(match self {
            Metric::Accuracy => cm.accuracy(),
            Metric::BalancedAccuracy => cm.balanced_accuracy(),
            Metric::F1 => cm.macro_f1(),
            Metric::Precision => cm.macro_precision(),
            Metric::Recall => cm.macro_recall(),
        })
    }
}

/// Mean and population variance
pub fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_vs_balanced_accuracy() {
        // 8 of class 0 all right, 2 of class 1 all predicted as 0
        let actual = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let predicted = [0; 10];
        assert!((Metric::Accuracy.score(&actual, &predicted, 2).unwrap() - 0.8).abs() < 1e-12);
        assert!(
            (Metric::BalancedAccuracy.score(&actual, &predicted, 2).unwrap() - 0.5).abs() < 1e-12
        );
    }

    #[test]
    fn test_macro_f1() {
        let actual = [0, 0, 1, 1];
        let predicted = [0, 1, 1, 1];
        // class 0: p=1, r=0.5 -> f1=2/3; class 1: p=2/3, r=1 -> f1=0.8
        let f1 = Metric::F1.score(&actual, &predicted, 2).unwrap();
        assert!((f1 - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(Metric::Accuracy.score(&[0, 1], &[0], 2).is_err());
    }

    #[test]
    fn test_mean_and_variance() {
        let (mean, var) = mean_and_variance(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(mean, 2.5);
        assert_eq!(var, 1.25);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("balanced_accuracy".parse::<Metric>(), Ok(Metric::BalancedAccuracy));
        assert_eq!("F1".parse::<Metric>(), Ok(Metric::F1));
        assert!("auc".parse::<Metric>().is_err());
    }
}
