//! Cross-validated hyperparameter search
//!
//! Each fold's preprocessing is fitted once on that fold's training rows and
//! shared by every configuration. Configurations are evaluated on the rayon
//! pool; each trial owns its result and a single coordinator ranks them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::classifier::Classifier;
use super::error::{PipelineError, Result};
use super::folds::{stratified_splits, FoldSplit};
use super::matrix::{check_aligned, FeatureMatrix, LabelVector, NumericMatrix};
use super::metrics::{mean_and_variance, Metric};
use super::preprocess::{prepare_training, PreprocessConfig};
use super::space::{Configuration, SearchSpace};
use crate::utils::progress::{create_progress_bar, finish_with_success, finish_with_warning};

/// Outcome of evaluating one configuration across all folds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// 1-based position after ranking
    pub rank: usize,
    /// Position of the configuration in the declared search space
    pub position: usize,
    pub configuration: Configuration,
    pub mean: f64,
    pub variance: f64,
    /// Metric value per fold, in fold order
    pub fold_scores: Vec<f64>,
}

/// Cooperative cancellation shared between a caller and a running search
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A fold after preprocessing
struct PreparedFold {
    fold: usize,
    train: NumericMatrix,
    train_labels: LabelVector,
    test: NumericMatrix,
    test_codes: Vec<usize>,
}

/// Runs cross-validated search for one classifier
pub struct SearchEngine {
    classifier: Arc<dyn Classifier>,
    preprocess: PreprocessConfig,
    seed: u64,
    cancel: Option<CancellationToken>,
    show_progress: bool,
}

impl SearchEngine {
    pub fn new(classifier: Arc<dyn Classifier>, preprocess: PreprocessConfig) -> Self {
        Self {
            classifier,
            preprocess,
            seed: 42,
            cancel: None,
            show_progress: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Draw a progress bar on stderr while trials run
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Evaluate every configuration with stratified k-fold cross-validation.
    ///
    /// Returns the trials ranked by mean metric (descending), then variance
    /// (ascending), then declared position.
    #[instrument(skip_all, fields(learner = self.classifier.name(), k_folds = k_folds, metric = %metric))]
    pub fn search(
        &self,
        matrix: &FeatureMatrix,
        labels: &LabelVector,
        space: &SearchSpace,
        k_folds: usize,
        metric: Metric,
    ) -> Result<Vec<TrialResult>> {
        let configurations = space.configurations()?;
        if configurations.is_empty() {
            return Err(PipelineError::EmptySearchSpace);
        }
        check_aligned(matrix.n_rows(), labels)?;
        labels.require_two_classes()?;
        self.preprocess.validate()?;

        let splits = stratified_splits(labels, k_folds, self.seed)?;
        info!(
            configurations = configurations.len(),
            rows = matrix.n_rows(),
            "search space expanded"
        );

        let folds = splits
            .par_iter()
            .map(|split| self.prepare_fold(matrix, labels, split))
            .collect::<Result<Vec<_>>>()?;

        let pb = if self.show_progress {
            create_progress_bar(configurations.len() as u64, "Evaluating configurations")
        } else {
            ProgressBar::hidden()
        };

        let outcomes: Vec<Option<Result<TrialResult>>> = configurations
            .par_iter()
            .enumerate()
            .map(|(position, configuration)| {
                if self.is_cancelled() {
                    return None;
                }
                let trial = self.evaluate(position, configuration, &folds, labels.n_classes(), metric);
                pb.inc(1);
                Some(trial)
            })
            .collect();

        let mut trials = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.into_iter().flatten() {
            trials.push(outcome?);
        }

        let skipped = configurations.len() - trials.len();
        if skipped > 0 {
            finish_with_warning(&pb, "Search cancelled");
            warn!(
                completed = trials.len(),
                skipped, "search cancelled, returning partial ranking"
            );
        } else {
            finish_with_success(&pb, "Search complete");
        }

        rank_trials(&mut trials);

        if let Some(best) = trials.first() {
            info!(
                best_position = best.position,
                mean = best.mean,
                variance = best.variance,
                configuration = %best.configuration,
                "search complete"
            );
        }

        Ok(trials)
    }

    fn prepare_fold(
        &self,
        matrix: &FeatureMatrix,
        labels: &LabelVector,
        split: &FoldSplit,
    ) -> Result<PreparedFold> {
        let train = matrix.take_rows(&split.train_indices);
        let train_labels = labels.take(&split.train_indices);
        let fold_seed = self.seed.wrapping_add(split.fold as u64);

        let prepared = prepare_training(&train, &train_labels, &self.preprocess, fold_seed)?;
        let test = prepared
            .transforms
            .transform(&matrix.take_rows(&split.test_indices))?;
        let test_codes = labels.take(&split.test_indices).codes().to_vec();

        debug!(
            fold = split.fold,
            train_rows = prepared.features.n_rows(),
            test_rows = test.n_rows(),
            features = test.n_cols(),
            dropped = prepared.transforms.drop_list.len(),
            "fold prepared"
        );

        Ok(PreparedFold {
            fold: split.fold,
            train: prepared.features,
            train_labels: prepared.labels,
            test,
            test_codes,
        })
    }

    fn evaluate(
        &self,
        position: usize,
        configuration: &Configuration,
        folds: &[PreparedFold],
        n_classes: usize,
        metric: Metric,
    ) -> Result<TrialResult> {
        let fold_scores = folds
            .par_iter()
            .map(|fold| {
                let model = self
                    .classifier
                    .train(&fold.train, &fold.train_labels, configuration)?;
                let predicted = model.predict(&fold.test)?;
                let score = metric.score(&fold.test_codes, &predicted, n_classes)?;
                debug!(position, fold = fold.fold, score, "fold evaluated");
                Ok(score)
            })
            .collect::<Result<Vec<f64>>>()?;

        let (mean, variance) = mean_and_variance(&fold_scores);

        Ok(TrialResult {
            rank: 0,
            position,
            configuration: configuration.clone(),
            mean,
            variance,
            fold_scores,
        })
    }
}

/// Sort trials into rank order and assign 1-based ranks
pub fn rank_trials(trials: &mut [TrialResult]) {
    trials.sort_by(|a, b| {
        b.mean
            .total_cmp(&a.mean)
            .then(a.variance.total_cmp(&b.variance))
            .then(a.position.cmp(&b.position))
    });
    for (i, trial) in trials.iter_mut().enumerate() {
        trial.rank = i + 1;
    }
}
