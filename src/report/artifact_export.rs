//! JSON export and import of fitted pipeline artifacts

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::pipeline::config::PipelineConfig;
use crate::pipeline::orchestrator::PipelineArtifact;
use crate::pipeline::target::TargetMapping;

/// Metadata about the run that produced the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Export timestamp (ISO 8601 format)
    pub timestamp: String,
    pub tabsel_version: String,
    pub input_file: String,
    pub target_column: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_mapping: Option<TargetMapping>,
    /// Columns removed before fitting
    #[serde(default)]
    pub dropped_columns: Vec<String>,
}

/// Complete artifact export: run metadata, the configuration and the artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactExport {
    pub metadata: RunMetadata,
    pub config: PipelineConfig,
    pub artifact: PipelineArtifact,
}

/// Parameters describing the run, for the export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub target_column: &'a str,
    pub target_mapping: Option<&'a TargetMapping>,
    pub dropped_columns: &'a [String],
}

/// Write the artifact and its run metadata as pretty-printed JSON
pub fn export_artifact(
    artifact: &PipelineArtifact,
    config: &PipelineConfig,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = ArtifactExport {
        metadata: RunMetadata {
            timestamp: Utc::now().to_rfc3339(),
            tabsel_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            target_column: params.target_column.to_string(),
            target_mapping: params.target_mapping.cloned(),
            dropped_columns: params.dropped_columns.to_vec(),
        },
        config: config.clone(),
        artifact: artifact.clone(),
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize artifact")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write artifact file: {}", output_path.display()))?;

    Ok(())
}

/// Read an export written by [`export_artifact`]
pub fn import_artifact(path: &Path) -> Result<ArtifactExport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read artifact file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse artifact file: {}", path.display()))
}

/// Default artifact path: next to the input, with an `_artifact.json` suffix
pub fn default_artifact_path(input: &Path) -> std::path::PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}_artifact.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_artifact_path() {
        assert_eq!(
            default_artifact_path(Path::new("/data/loans.csv")),
            Path::new("/data/loans_artifact.json")
        );
    }
}
