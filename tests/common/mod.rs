//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use tabsel::pipeline::{frame_to_dataset, Configuration, Dataset, SearchSpace};
use tempfile::TempDir;

/// Create a seeded, imbalanced mixed-type DataFrame
///
/// This DataFrame includes:
/// - `target`: Binary target (0/1) with `minority` rows of class 1
/// - `signal`: Numeric feature that separates the classes with some overlap
/// - `signal_copy`: Near-linear copy of `signal` (|r| well above 0.9)
/// - `noise`: Uniform noise
/// - `region`: Low-cardinality categorical (3 values)
/// - `store`: High-cardinality categorical (15 values)
pub fn create_imbalanced_dataframe(rows: usize, minority: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(&mut rng);
    let mut target = vec![0i32; rows];
    for &row in order.iter().take(minority) {
        target[row] = 1;
    }

    let mut signal = Vec::with_capacity(rows);
    let mut signal_copy = Vec::with_capacity(rows);
    let mut noise = Vec::with_capacity(rows);
    let mut region = Vec::with_capacity(rows);
    let mut store = Vec::with_capacity(rows);

    for &t in &target {
        let base = if t == 1 { 1.5 } else { 0.0 };
        let s = base + rng.gen::<f64>() * 2.0;
        signal.push(s);
        signal_copy.push(2.0 * s + rng.gen::<f64>() * 0.01);
        noise.push(rng.gen::<f64>());
        region.push(["north", "south", "west"][rng.gen_range(0..3)].to_string());
        store.push(format!("store_{}", rng.gen_range(0..15)));
    }

    DataFrame::new(vec![
        Column::new("target".into(), target),
        Column::new("signal".into(), signal),
        Column::new("signal_copy".into(), signal_copy),
        Column::new("noise".into(), noise),
        Column::new("region".into(), region),
        Column::new("store".into(), store),
    ])
    .unwrap()
}

/// The fixture above split into features and labels
pub fn create_imbalanced_dataset(rows: usize, minority: usize, seed: u64) -> Dataset {
    let df = create_imbalanced_dataframe(rows, minority, seed);
    frame_to_dataset(&df, "target", None, &[]).unwrap()
}

/// Three logistic-regression configurations with different step sizes
pub fn logistic_configurations() -> SearchSpace {
    SearchSpace::list(vec![
        Configuration::new().with("learning_rate", 0.01),
        Configuration::new().with("learning_rate", 0.1),
        Configuration::new()
            .with("learning_rate", 0.5)
            .with("epochs", 50),
    ])
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a list of scores is sorted in descending order
pub fn assert_descending(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "Scores not in descending order: {:?}",
            values
        );
    }
}
