//! Fit/predict lifecycle over the preprocessing chain and the search engine

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::classifier::{Classifier, TrainedModel};
use super::config::PipelineConfig;
use super::error::{PipelineError, Result};
use super::matrix::{check_aligned, ColumnSpec, FeatureMatrix, LabelVector};
use super::metrics::Metric;
use super::preprocess::{prepare_training, FittedTransforms};
use super::search::{CancellationToken, SearchEngine, TrialResult};
use super::space::Configuration;

/// Lifecycle state of a [`Pipeline`]
///
/// Prediction has no state of its own: `predict`, `predict_codes` and
/// `score` borrow the pipeline immutably, so any number of them may run
/// concurrently against a `Fitted` pipeline and it stays `Fitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Unfit,
    Fitting,
    Fitted,
}

/// Everything needed to replay inference-time preprocessing, plus the
/// search that chose the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub learner: String,
    pub configuration: Configuration,
    #[serde(flatten)]
    pub transforms: FittedTransforms,
    /// Input columns seen at fit time
    pub schema: Vec<ColumnSpec>,
    /// Class names indexed by class code
    pub classes: Vec<String>,
    pub metric: Metric,
    pub k_folds: usize,
    pub seed: u64,
    pub trials: Vec<TrialResult>,
    /// Rows the final model was trained on, after resampling
    pub training_rows: usize,
    /// RFC 3339 timestamp
    pub fitted_at: String,
    pub version: String,
}

impl PipelineArtifact {
    pub fn best_trial(&self) -> Option<&TrialResult> {
        self.trials.first()
    }
}

struct Fitted {
    artifact: Arc<PipelineArtifact>,
    model: Box<dyn TrainedModel>,
}

/// Composes pruning, encoding, resampling and search into one lifecycle
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    config: PipelineConfig,
    state: PipelineState,
    fitted: Option<Fitted>,
    cancel: Option<CancellationToken>,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classifier>, config: PipelineConfig) -> Self {
        Self {
            classifier,
            config,
            state: PipelineState::Unfit,
            fitted: None,
            cancel: None,
            show_progress: false,
        }
    }

    /// Reassemble a fitted pipeline from a persisted artifact and a model
    /// the caller restored for the same learner
    pub fn from_parts(
        classifier: Arc<dyn Classifier>,
        config: PipelineConfig,
        artifact: PipelineArtifact,
        model: Box<dyn TrainedModel>,
    ) -> Result<Self> {
        if artifact.learner != classifier.name() {
            return Err(PipelineError::config(format!(
                "artifact was fitted with learner '{}', not '{}'",
                artifact.learner,
                classifier.name()
            )));
        }
        let mut pipeline = Self::new(classifier, config);
        pipeline.fitted = Some(Fitted {
            artifact: Arc::new(artifact),
            model,
        });
        pipeline.state = PipelineState::Fitted;
        Ok(pipeline)
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifact(&self) -> Option<Arc<PipelineArtifact>> {
        self.fitted.as_ref().map(|f| Arc::clone(&f.artifact))
    }

    /// Search, then refit the chain and the winning configuration on all rows.
    ///
    /// A failed fit leaves the pipeline unfit with no artifact, even if it
    /// was fitted before.
    #[instrument(skip_all, fields(rows = matrix.n_rows(), learner = self.classifier.name()))]
    pub fn fit(
        &mut self,
        matrix: &FeatureMatrix,
        labels: &LabelVector,
    ) -> Result<Arc<PipelineArtifact>> {
        self.state = PipelineState::Fitting;
        self.fitted = None;

        match self.run_fit(matrix, labels) {
            Ok(fitted) => {
                let artifact = Arc::clone(&fitted.artifact);
                self.fitted = Some(fitted);
                self.state = PipelineState::Fitted;
                Ok(artifact)
            }
            Err(e) => {
                self.state = PipelineState::Unfit;
                Err(e)
            }
        }
    }

    fn run_fit(&self, matrix: &FeatureMatrix, labels: &LabelVector) -> Result<Fitted> {
        self.config.validate()?;
        check_aligned(matrix.n_rows(), labels)?;
        labels.require_two_classes()?;

        let preprocess = self.config.preprocess();
        let mut engine = SearchEngine::new(Arc::clone(&self.classifier), preprocess.clone())
            .with_seed(self.config.seed)
            .with_progress(self.show_progress);
        if let Some(token) = &self.cancel {
            engine = engine.with_cancellation(token.clone());
        }

        let trials = engine.search(
            matrix,
            labels,
            &self.config.search_space,
            self.config.k_folds,
            self.config.metric,
        )?;
        let best = trials.first().ok_or(PipelineError::Cancelled)?;

        let prepared = prepare_training(matrix, labels, &preprocess, self.config.seed)?;
        let model = self
            .classifier
            .train(&prepared.features, &prepared.labels, &best.configuration)?;

        info!(
            configuration = %best.configuration,
            mean = best.mean,
            dropped = prepared.transforms.drop_list.len(),
            encoded = prepared.transforms.encoding.len(),
            training_rows = prepared.features.n_rows(),
            "final model trained"
        );

        let artifact = PipelineArtifact {
            learner: self.classifier.name().to_string(),
            configuration: best.configuration.clone(),
            transforms: prepared.transforms,
            schema: matrix.schema(),
            classes: labels.classes().to_vec(),
            metric: self.config.metric,
            k_folds: self.config.k_folds,
            seed: self.config.seed,
            training_rows: prepared.features.n_rows(),
            trials,
            fitted_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        Ok(Fitted {
            artifact: Arc::new(artifact),
            model,
        })
    }

    /// Predict class codes, indexing [`PipelineArtifact::classes`]
    pub fn predict_codes(&self, matrix: &FeatureMatrix) -> Result<Vec<usize>> {
        let fitted = self.fitted.as_ref().ok_or(PipelineError::NotFitted)?;
        let selected = matrix.select_schema(&fitted.artifact.schema)?;
        let encoded = fitted.artifact.transforms.transform(&selected)?;
        fitted.model.predict(&encoded)
    }

    /// Predict class names
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<String>> {
        let codes = self.predict_codes(matrix)?;
        let classes = &self
            .fitted
            .as_ref()
            .ok_or(PipelineError::NotFitted)?
            .artifact
            .classes;

        codes
            .into_iter()
            .map(|code| {
                classes.get(code).cloned().ok_or_else(|| {
                    PipelineError::invalid(format!("model predicted unknown class code {}", code))
                })
            })
            .collect()
    }

    /// Score predictions on labelled data. Classes unseen at fit time count
    /// as always mispredicted.
    pub fn score(&self, matrix: &FeatureMatrix, labels: &LabelVector, metric: Metric) -> Result<f64> {
        check_aligned(matrix.n_rows(), labels)?;
        let predicted = self.predict_codes(matrix)?;
        let fitted_classes = &self
            .fitted
            .as_ref()
            .ok_or(PipelineError::NotFitted)?
            .artifact
            .classes;

        let mut classes = fitted_classes.clone();
        let remap: Vec<usize> = labels
            .classes()
            .iter()
            .map(|name| match classes.iter().position(|c| c == name) {
                Some(code) => code,
                None => {
                    classes.push(name.clone());
                    classes.len() - 1
                }
            })
            .collect();
        let actual: Vec<usize> = labels.codes().iter().map(|&c| remap[c]).collect();

        metric.score(&actual, &predicted, classes.len())
    }
}
