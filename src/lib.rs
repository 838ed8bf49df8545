//! tabsel: tabular preprocessing and model selection
//!
//! A library for fitting a deterministic preprocessing chain (correlation
//! pruning, categorical encoding, class resampling) together with a
//! cross-validated hyperparameter search over a pluggable classifier.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
