//! tabsel: command-line front end
//!
//! Loads a dataset, fits the preprocessing chain and cross-validated search,
//! prints the ranked trials and writes the fitted artifact as JSON.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use polars::prelude::*;
use tracing::info;

use tabsel::cli::Cli;
use tabsel::pipeline::{
    frame_to_dataset, frame_to_features, read_frame, target::class_distribution, Pipeline,
};
use tabsel::report::{display_trials, export_artifact, ExportParams, FitSummary};
use tabsel::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config()?;
    let output_path = cli.output_path();
    let mapping = cli.target_mapping();
    let show = !cli.quiet;

    if show {
        print_banner(env!("CARGO_PKG_VERSION"));
        print_config(
            &cli.input,
            &cli.target,
            &output_path,
            &cli.learner.to_string(),
            &config,
        );
    }

    // Step 1: Load dataset
    if show {
        print_step_header(1, "Load Dataset");
    }
    let step_start = Instant::now();
    let df = read_frame(&cli.input)?;
    let dataset = frame_to_dataset(&df, &cli.target, mapping.as_ref(), &cli.drop_columns)?;
    let mut summary = FitSummary::new(
        dataset.features.n_cols(),
        dataset.features.n_rows(),
        dataset.skipped_rows,
    );
    let load_elapsed = step_start.elapsed();
    summary.set_load_time(load_elapsed);

    if show {
        print_success("Dataset loaded");
        println!("      Rows: {}", df.height());
        println!("      Feature columns: {}", dataset.features.n_cols());
        for (class, count) in class_distribution(&df, &cli.target)? {
            println!("      Class {}: {}", class, count);
        }
        if dataset.skipped_rows > 0 {
            print_count(
                "row(s) without a usable target",
                dataset.skipped_rows,
                Some("(skipped)"),
            );
        }
        print_step_time(load_elapsed);
    }

    // Step 2: Search and fit
    if show {
        print_step_header(2, "Search and Fit");
    }
    let step_start = Instant::now();
    let mut pipeline = Pipeline::new(cli.learner.build(), config.clone())
        .with_progress(show && !cli.no_progress);
    let artifact = pipeline
        .fit(&dataset.features, &dataset.labels)
        .context("Pipeline fit failed")?;
    let fit_elapsed = step_start.elapsed();
    summary.set_fit_time(fit_elapsed);
    info!(trials = artifact.trials.len(), "pipeline fitted");

    if show {
        print_success(&format!("Evaluated {} configuration(s)", artifact.trials.len()));
        if artifact.transforms.drop_list.is_empty() {
            print_info("No highly correlated feature pairs found");
        } else {
            print_count(
                "correlated feature(s) dropped",
                artifact.transforms.drop_list.len(),
                Some(&format!("(|r| > {:.2})", config.correlation_threshold)),
            );
        }
        print_step_time(fit_elapsed);
    }

    // Step 3: Save artifact
    if show {
        print_step_header(3, "Save Artifact");
    }
    let step_start = Instant::now();
    let input_file = cli.input.display().to_string();
    export_artifact(
        &artifact,
        &config,
        &output_path,
        &ExportParams {
            input_file: &input_file,
            target_column: &cli.target,
            target_mapping: mapping.as_ref(),
            dropped_columns: &cli.drop_columns,
        },
    )?;
    let save_elapsed = step_start.elapsed();
    summary.set_save_time(save_elapsed);
    if show {
        print_success(&format!("Saved to {}", output_path.display()));
        print_step_time(save_elapsed);
    }

    // Step 4: Optional predictions on a second file
    if let (Some(predict_path), Some(predictions_path)) = (&cli.predict, cli.predictions_path()) {
        if show {
            print_step_header(4, "Predict");
        }
        let step_start = Instant::now();
        let spinner = show.then(|| create_spinner("Predicting..."));

        let predict_df = read_frame(predict_path)?;
        let mut exclude = cli.drop_columns.clone();
        if predict_df.column(&cli.target).is_ok() {
            exclude.push(cli.target.clone());
        }
        let features = frame_to_features(&predict_df, &exclude)?;
        let predictions = pipeline
            .predict(&features)
            .context("Prediction failed")?;

        let rows: Vec<u32> = (0..predictions.len() as u32).collect();
        let mut out = DataFrame::new(vec![
            Column::new("row".into(), rows),
            Column::new("prediction".into(), predictions),
        ])?;
        save_dataset(&mut out, &predictions_path)?;

        if let Some(spinner) = spinner {
            finish_with_success(
                &spinner,
                &format!("Saved predictions to {}", predictions_path.display()),
            );
            print_step_time(step_start.elapsed());
        }
    }

    if show {
        display_trials(&artifact.trials, artifact.metric, cli.top);
        summary.display(&artifact);
        print_completion();
    }

    Ok(())
}

/// Save a frame to file (CSV or Parquet based on extension)
fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}
