//! Report module - rendering and exporting fit results

pub mod artifact_export;
pub mod summary;

pub use artifact_export::*;
pub use summary::*;
