//! Pipeline module - the preprocessing and model-selection core
//!
//! Leaf-first: [`correlation`] prunes redundant numeric features,
//! [`encoding`] turns categorical columns into numbers, [`resampling`]
//! rebalances training partitions, [`search`] cross-validates a search
//! space and [`orchestrator`] ties them into one fit/predict lifecycle.
//! [`loader`] and [`target`] sit outside the core and bring polars frames in.

pub mod classifier;
pub mod config;
pub mod correlation;
pub mod encoding;
pub mod error;
pub mod folds;
pub mod loader;
pub mod matrix;
pub mod metrics;
pub mod orchestrator;
pub mod preprocess;
pub mod resampling;
pub mod search;
pub mod space;
pub mod target;

pub use classifier::{
    Classifier, GaussianNaiveBayes, KNearestNeighbors, LearnerKind, LogisticRegression,
    TrainedModel,
};
pub use config::PipelineConfig;
pub use correlation::{CorrelatedPair, CorrelationMatrix, DropList};
pub use encoding::{EncoderConfig, EncodingStrategy, EncodingTable};
pub use error::{PipelineError, Result};
pub use loader::{frame_to_dataset, frame_to_features, load_dataset, read_frame, Dataset};
pub use matrix::{ColumnKind, ColumnSpec, FeatureColumn, FeatureMatrix, LabelVector, NumericMatrix};
pub use metrics::Metric;
pub use orchestrator::{Pipeline, PipelineArtifact, PipelineState};
pub use preprocess::{FittedTransforms, PreprocessConfig};
pub use resampling::{ResamplingPlan, ResamplingPolicy};
pub use search::{CancellationToken, SearchEngine, TrialResult};
pub use space::{Configuration, Distribution, ParamValue, SearchSpace};
pub use target::TargetMapping;
