//! Pipeline configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::encoding::EncoderConfig;
use super::error::{PipelineError, Result as PipelineResult};
use super::metrics::Metric;
use super::preprocess::PreprocessConfig;
use super::resampling::ResamplingPolicy;
use super::space::SearchSpace;

/// Everything a fit needs apart from the data and the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub correlation_threshold: f64,
    pub encoder: EncoderConfig,
    pub resampling: ResamplingPolicy,
    pub k_folds: usize,
    pub metric: Metric,
    pub seed: u64,
    pub search_space: SearchSpace,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.9,
            encoder: EncoderConfig::default(),
            resampling: ResamplingPolicy::default(),
            k_folds: 5,
            metric: Metric::default(),
            seed: 42,
            search_space: SearchSpace::default(),
        }
    }
}

impl PipelineConfig {
    /// Preprocessing settings shared by the search and the final fit
    pub fn preprocess(&self) -> PreprocessConfig {
        PreprocessConfig {
            correlation_threshold: self.correlation_threshold,
            encoder: self.encoder.clone(),
            resampling: self.resampling.clone(),
        }
    }

    /// Validate every setting that can be checked without data
    pub fn validate(&self) -> PipelineResult<()> {
        self.preprocess().validate()?;
        if self.k_folds < 2 {
            return Err(PipelineError::config(format!(
                "k_folds must be at least 2, got {}",
                self.k_folds
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encoding::EncodingStrategy;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.k_folds, 5);
        assert_eq!(config.correlation_threshold, 0.9);
        assert_eq!(config.metric, Metric::BalancedAccuracy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{
                "k_folds": 3,
                "encoder": { "high_cardinality": "target" },
                "resampling": { "policy": "undersample-random", "ratio": 0.5 },
                "search_space": { "kind": "grid", "parameters": { "k": [1, 3, 5] } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.k_folds, 3);
        assert_eq!(config.seed, 42);
        assert_eq!(config.encoder.high_cardinality, EncodingStrategy::Target);
        assert_eq!(config.encoder.cardinality_threshold, 10);
        assert_eq!(config.resampling, ResamplingPolicy::UndersampleRandom { ratio: 0.5 });
        assert_eq!(config.search_space.configurations().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_k_folds() {
        let config = PipelineConfig {
            k_folds: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration { .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "metric": "f1", "correlation_threshold": 0.8 }}"#).unwrap();
        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.metric, Metric::F1);
        assert_eq!(config.correlation_threshold, 0.8);
    }

    #[test]
    fn test_from_json_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "correlation_threshold": 2.0 }}"#).unwrap();
        assert!(PipelineConfig::from_json_file(file.path()).is_err());
    }
}
