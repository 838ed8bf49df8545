//! CLI module - argument parsing

mod args;

pub use args::{parse_param_spec, validate_unit_interval, Cli, ResamplingKind};
