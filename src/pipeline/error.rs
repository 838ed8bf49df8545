//! Error types for the preprocessing and model-selection core.
//!
//! Every failure in the core is local and synchronous. Nothing here is
//! retried; a caller that wants retries owns them.

/// Convenience alias used throughout the `pipeline` module.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors produced by the pruner, encoder, resampler, search engine and
/// orchestrator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// An invalid threshold, ratio, fold count or parameter was supplied.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable description of the rejected setting.
        message: String,
    },

    /// A categorical column could not be encoded with the requested strategy.
    #[error("encoding error in column '{column}': {message}")]
    Encoding {
        /// Column that failed to encode.
        column: String,
        /// Why the strategy could not be applied.
        message: String,
    },

    /// A class has too few rows for the requested resampling.
    #[error("class '{class}' has only {count} samples, need at least {required} for resampling")]
    InsufficientSamples {
        /// The offending class.
        class: String,
        /// Number of rows of that class in the training partition.
        count: usize,
        /// Minimum number of rows the policy needs.
        required: usize,
    },

    /// More folds were requested than the smallest class can populate.
    #[error("k_folds = {k_folds} exceeds the {count} samples of class '{class}'")]
    FoldSize {
        /// Requested number of folds.
        k_folds: usize,
        /// The smallest class.
        class: String,
        /// Number of rows of that class.
        count: usize,
    },

    /// The search space produced no configurations.
    #[error("search space contains no configurations")]
    EmptySearchSpace,

    /// The search was cancelled before any configuration was evaluated.
    #[error("search cancelled before any configuration was evaluated")]
    Cancelled,

    /// `predict` or `score` was called before a successful `fit`.
    #[error("pipeline is not fitted; call fit before predict")]
    NotFitted,

    /// The supplied matrix or labels violate a data-model invariant.
    #[error("invalid data: {message}")]
    InvalidData {
        /// What was wrong with the input.
        message: String,
    },

    /// An inference matrix does not match the schema seen at fit time.
    #[error("schema mismatch for column '{column}': {message}")]
    SchemaMismatch {
        /// Column that is missing or has the wrong kind.
        column: String,
        /// Description of the mismatch.
        message: String,
    },

    /// The classifier capability failed to train or predict.
    #[error("classifier '{learner}' failed: {message}")]
    Classifier {
        /// Name of the learner family.
        learner: String,
        /// Description of the failure.
        message: String,
    },
}

impl PipelineError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        PipelineError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PipelineError::InvalidData {
            message: message.into(),
        }
    }

    pub(crate) fn encoding(column: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Encoding {
            column: column.into(),
            message: message.into(),
        }
    }
}
