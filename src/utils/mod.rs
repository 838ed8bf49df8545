//! Terminal helpers shared by the CLI and the search engine

pub mod progress;
pub mod styling;

pub use progress::*;
pub use styling::*;
