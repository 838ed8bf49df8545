//! The prune, encode and resample chain fitted on one training partition

use serde::{Deserialize, Serialize};

use super::correlation::{self, DropList};
use super::encoding::{self, EncoderConfig, EncodingTable};
use super::error::Result;
use super::matrix::{check_aligned, FeatureMatrix, LabelVector, NumericMatrix};
use super::resampling::{self, ResamplingPlan, ResamplingPolicy};

/// Settings for the preprocessing chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Absolute correlation above which the later feature of a pair is dropped
    pub correlation_threshold: f64,
    pub encoder: EncoderConfig,
    pub resampling: ResamplingPolicy,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.9,
            encoder: EncoderConfig::default(),
            resampling: ResamplingPolicy::default(),
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        correlation::validate_threshold(self.correlation_threshold)?;
        self.encoder.validate()?;
        self.resampling.validate()
    }
}

/// Artifacts replayed on every later matrix: the drop list and encoding table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransforms {
    pub drop_list: DropList,
    pub encoding: EncodingTable,
}

impl FittedTransforms {
    /// Fit the pruner, then the encoder on the pruned training rows
    pub fn fit(train: &FeatureMatrix, labels: &LabelVector, config: &PreprocessConfig) -> Result<Self> {
        check_aligned(train.n_rows(), labels)?;
        let drop_list = correlation::fit(train, config.correlation_threshold)?;
        let pruned = correlation::apply(train, &drop_list);
        let encoding = encoding::fit(&pruned, labels, &config.encoder)?;
        Ok(Self {
            drop_list,
            encoding,
        })
    }

    /// Prune and encode without refitting anything
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<NumericMatrix> {
        let pruned = correlation::apply(matrix, &self.drop_list);
        encoding::transform(&pruned, &self.encoding)
    }
}

/// A training partition after the full chain, ready for a classifier
#[derive(Debug, Clone)]
pub struct PreparedTraining {
    pub transforms: FittedTransforms,
    pub plan: ResamplingPlan,
    pub features: NumericMatrix,
    pub labels: LabelVector,
}

/// Fit the chain on `train` and return the resampled numeric training set
pub fn prepare_training(
    train: &FeatureMatrix,
    labels: &LabelVector,
    config: &PreprocessConfig,
    seed: u64,
) -> Result<PreparedTraining> {
    let transforms = FittedTransforms::fit(train, labels, config)?;
    let encoded = transforms.transform(train)?;
    let plan = resampling::plan(&encoded, labels, &config.resampling, seed)?;
    let (features, labels) = resampling::apply(&plan, &encoded, labels)?;

    Ok(PreparedTraining {
        transforms,
        plan,
        features,
        labels,
    })
}
