//! Command-line argument definitions using clap

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::pipeline::classifier::LearnerKind;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::encoding::EncodingStrategy;
use crate::pipeline::metrics::Metric;
use crate::pipeline::resampling::{ResamplingPolicy, DEFAULT_K_NEIGHBORS};
use crate::pipeline::space::{ParamValue, SearchSpace};
use crate::pipeline::target::TargetMapping;

/// Resampling policy names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResamplingKind {
    None,
    OversampleDuplicate,
    UndersampleRandom,
    SyntheticInterpolate,
}

/// tabsel - Prune, encode, resample and cross-validate a classifier on tabular data
#[derive(Parser, Debug)]
#[command(name = "tabsel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target column name
    #[arg(short, long)]
    pub target: String,

    /// Value in target column that represents EVENT (maps to "1").
    /// Required together with --non-event-value.
    #[arg(long, requires = "non_event_value")]
    pub event_value: Option<String>,

    /// Value in target column that represents NON-EVENT (maps to "0").
    /// Required together with --event-value.
    #[arg(long, requires = "event_value")]
    pub non_event_value: Option<String>,

    /// Artifact output path (JSON).
    /// Defaults to the input directory with an '_artifact.json' suffix.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pipeline configuration file (JSON). Flags below override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Learner family to search over
    #[arg(short, long, default_value = "logistic")]
    pub learner: LearnerKind,

    /// Correlation threshold - drop the later feature of pairs with |r| above this value
    #[arg(long, value_parser = validate_unit_interval)]
    pub correlation_threshold: Option<f64>,

    /// Distinct-value count at which a categorical column counts as high-cardinality
    #[arg(long)]
    pub cardinality_threshold: Option<usize>,

    /// Encoding for high-cardinality columns: frequency or target
    #[arg(long)]
    pub high_cardinality: Option<EncodingStrategy>,

    /// Encoding for low-cardinality columns: frequency, target or one-hot
    #[arg(long)]
    pub low_cardinality: Option<EncodingStrategy>,

    /// Resampling policy applied to training partitions
    #[arg(long, value_enum)]
    pub resampling: Option<ResamplingKind>,

    /// Desired minority/majority ratio after resampling, in (0, 1]
    #[arg(long, value_parser = validate_ratio)]
    pub ratio: Option<f64>,

    /// Neighbors considered by synthetic interpolation
    #[arg(long)]
    pub k_neighbors: Option<usize>,

    /// Number of cross-validation folds
    #[arg(short, long)]
    pub k_folds: Option<usize>,

    /// Metric to maximize: accuracy, balanced-accuracy, f1, precision, recall
    #[arg(short, long)]
    pub metric: Option<Metric>,

    /// Seed for folds, resampling and random search
    #[arg(long)]
    pub seed: Option<u64>,

    /// Grid parameter as NAME=V1,V2,... (repeatable). Replaces the configured search space.
    #[arg(short = 'p', long = "param", value_parser = parse_param_spec)]
    pub params: Vec<(String, Vec<ParamValue>)>,

    /// Columns to drop before processing (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Second dataset to predict with the fitted pipeline
    #[arg(long)]
    pub predict: Option<PathBuf>,

    /// Predictions output path (CSV or Parquet).
    /// Defaults to the predict input with a '_predictions.csv' suffix.
    #[arg(long, requires = "predict")]
    pub predictions_output: Option<PathBuf>,

    /// Number of ranked trials to print
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Hide the progress bar
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Log debug output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors, and skip the banner and tables
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Get the artifact path, deriving it from the input if not given
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| crate::report::default_artifact_path(&self.input))
    }

    /// Get the predictions path, deriving it from the predict input if not given
    pub fn predictions_path(&self) -> Option<PathBuf> {
        let predict = self.predict.as_ref()?;
        Some(self.predictions_output.clone().unwrap_or_else(|| {
            let parent = predict.parent().unwrap_or_else(|| std::path::Path::new("."));
            let stem = predict
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            parent.join(format!("{}_predictions.csv", stem))
        }))
    }

    pub fn target_mapping(&self) -> Option<TargetMapping> {
        match (&self.event_value, &self.non_event_value) {
            (Some(event), Some(non_event)) => Some(TargetMapping::new(event, non_event)),
            _ => None,
        }
    }

    /// Load the configuration file (or defaults) and apply flag overrides
    pub fn resolve_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(threshold) = self.correlation_threshold {
            config.correlation_threshold = threshold;
        }
        if let Some(threshold) = self.cardinality_threshold {
            config.encoder.cardinality_threshold = threshold;
        }
        if let Some(strategy) = self.high_cardinality {
            config.encoder.high_cardinality = strategy;
        }
        if let Some(strategy) = self.low_cardinality {
            config.encoder.low_cardinality = strategy;
        }
        config.resampling = self.resampling_policy(&config.resampling);
        if let Some(k) = self.k_folds {
            config.k_folds = k;
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if !self.params.is_empty() {
            config.search_space = SearchSpace::Grid {
                parameters: self.params.iter().cloned().collect(),
            };
        }

        config.validate()?;
        Ok(config)
    }

    fn resampling_policy(&self, current: &ResamplingPolicy) -> ResamplingPolicy {
        let (current_ratio, current_k) = match current {
            ResamplingPolicy::None => (1.0, DEFAULT_K_NEIGHBORS),
            ResamplingPolicy::OversampleDuplicate { ratio }
            | ResamplingPolicy::UndersampleRandom { ratio } => (*ratio, DEFAULT_K_NEIGHBORS),
            ResamplingPolicy::SyntheticInterpolate { ratio, k_neighbors } => (*ratio, *k_neighbors),
        };
        let ratio = self.ratio.unwrap_or(current_ratio);
        let k_neighbors = self.k_neighbors.unwrap_or(current_k);

        let kind = match (self.resampling, current) {
            (Some(kind), _) => kind,
            (None, ResamplingPolicy::None) => ResamplingKind::None,
            (None, ResamplingPolicy::OversampleDuplicate { .. }) => ResamplingKind::OversampleDuplicate,
            (None, ResamplingPolicy::UndersampleRandom { .. }) => ResamplingKind::UndersampleRandom,
            (None, ResamplingPolicy::SyntheticInterpolate { .. }) => ResamplingKind::SyntheticInterpolate,
        };

        match kind {
            ResamplingKind::None => ResamplingPolicy::None,
            ResamplingKind::OversampleDuplicate => ResamplingPolicy::OversampleDuplicate { ratio },
            ResamplingKind::UndersampleRandom => ResamplingPolicy::UndersampleRandom { ratio },
            ResamplingKind::SyntheticInterpolate => {
                ResamplingPolicy::SyntheticInterpolate { ratio, k_neighbors }
            }
        }
    }
}

/// Validator for thresholds in [0, 1]
pub fn validate_unit_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for resampling ratios in (0, 1]
fn validate_ratio(s: &str) -> Result<f64, String> {
    let value = validate_unit_interval(s)?;
    if value == 0.0 {
        Err("ratio must be greater than 0.0".to_string())
    } else {
        Ok(value)
    }
}

fn parse_param_value(raw: &str) -> ParamValue {
    if let Ok(b) = raw.parse::<bool>() {
        ParamValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        ParamValue::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        ParamValue::Float(f)
    } else {
        ParamValue::Str(raw.to_string())
    }
}

/// Parse NAME=V1,V2,... into a grid axis
pub fn parse_param_spec(s: &str) -> Result<(String, Vec<ParamValue>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=V1,V2,..., got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", s));
    }
    let values: Vec<ParamValue> = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_param_value)
        .collect();
    if values.is_empty() {
        return Err(format!("no values given for parameter '{}'", name));
    }
    Ok((name.to_string(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_spec() {
        let (name, values) = parse_param_spec("k=1, 3,5").unwrap();
        assert_eq!(name, "k");
        assert_eq!(values, vec![ParamValue::Int(1), ParamValue::Int(3), ParamValue::Int(5)]);

        let (_, values) = parse_param_spec("weights=uniform,distance").unwrap();
        assert_eq!(values[1], ParamValue::Str("distance".to_string()));

        let (_, values) = parse_param_spec("lr=0.1,true").unwrap();
        assert_eq!(values, vec![ParamValue::Float(0.1), ParamValue::Bool(true)]);

        assert!(parse_param_spec("k").is_err());
        assert!(parse_param_spec("=1").is_err());
        assert!(parse_param_spec("k=").is_err());
    }

    #[test]
    fn test_validate_ratio() {
        assert!(validate_ratio("0.5").is_ok());
        assert!(validate_ratio("0").is_err());
        assert!(validate_ratio("1.5").is_err());
    }
}
