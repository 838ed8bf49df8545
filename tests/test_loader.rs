//! Tests for dataset loading and frame conversion

use polars::prelude::*;
use std::io::Write;
use tabsel::pipeline::loader::MISSING_CATEGORY;
use tabsel::pipeline::matrix::ColumnData;
use tabsel::pipeline::target::{class_distribution, extract_labels};
use tabsel::pipeline::{
    frame_to_dataset, frame_to_features, load_dataset, read_frame, ColumnKind, TargetMapping,
};
use tempfile::TempDir;

mod common;

#[test]
fn test_load_csv_file() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "a,b,c").unwrap();
    writeln!(file, "1,2,x").unwrap();
    writeln!(file, "4,5,y").unwrap();
    drop(file);

    let df = read_frame(&csv_path).unwrap();

    assert_eq!(df.height(), 2);
    assert_eq!(df.get_column_names(), &["a", "b", "c"]);
}

#[test]
fn test_load_parquet_round_trips_generated_frame() {
    let mut df = common::create_imbalanced_dataframe(50, 10, 8);
    let (_temp_dir, path) = common::create_temp_parquet(&mut df);

    let loaded = read_frame(&path).unwrap();

    assert_eq!(loaded.shape(), (50, 6));
    let dataset = frame_to_dataset(&loaded, "target", None, &[]).unwrap();
    assert_eq!(dataset.labels.class_counts(), vec![40, 10]);
    assert_eq!(dataset.features.n_cols(), 5);
}

#[test]
fn test_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data.xlsx");
    std::fs::write(&path, "irrelevant").unwrap();

    match load_dataset(&path) {
        Err(err) => assert!(err.to_string().contains("Unsupported file format")),
        Ok(_) => panic!("an xlsx file should be rejected"),
    }
}

#[test]
fn test_nonexistent_file() {
    let result = read_frame(std::path::Path::new("/nonexistent/path/data.csv"));
    assert!(result.is_err());
}

#[test]
fn test_column_kinds() {
    let df = df! {
        "amount" => [1.5f64, 2.5, 3.5],
        "count" => [1i64, 2, 3],
        "city" => ["a", "b", "a"],
    }
    .unwrap();

    let features = frame_to_features(&df, &[]).unwrap();

    let kinds: Vec<ColumnKind> = features.columns().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![ColumnKind::Numeric, ColumnKind::Numeric, ColumnKind::Categorical]
    );
}

#[test]
fn test_categorical_nulls_become_missing_category() {
    let df = df! {
        "city" => [Some("a"), None, Some("b")],
    }
    .unwrap();

    let features = frame_to_features(&df, &[]).unwrap();

    match features.columns()[0].data() {
        ColumnData::Categorical(values) => {
            assert_eq!(values, &vec!["a", MISSING_CATEGORY, "b"]);
        }
        other => panic!("expected categorical column, got {:?}", other),
    }
}

#[test]
fn test_numeric_nulls_are_rejected() {
    let df = df! {
        "amount" => [Some(1.0f64), None, Some(3.0)],
    }
    .unwrap();

    let err = frame_to_features(&df, &[]).unwrap_err();
    assert!(err.to_string().contains("null values"));
}

#[test]
fn test_rows_without_target_are_skipped() {
    let df = df! {
        "target" => [Some(0i32), None, Some(1), Some(0)],
        "x" => [1.0f64, 2.0, 3.0, 4.0],
    }
    .unwrap();

    let dataset = frame_to_dataset(&df, "target", None, &[]).unwrap();

    assert_eq!(dataset.skipped_rows, 1);
    assert_eq!(dataset.labels.len(), 3);
    assert_eq!(dataset.features.n_rows(), 3);
    match dataset.features.columns()[0].data() {
        ColumnData::Numeric(values) => {
            assert_eq!(values, &vec![1.0, 3.0, 4.0]);
        }
        other => panic!("expected numeric column, got {:?}", other),
    }
}

#[test]
fn test_target_mapping_filters_rows() {
    let df = df! {
        "status" => ["good", "bad", "unknown", "bad", "good"],
        "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
    }
    .unwrap();
    let mapping = TargetMapping::new("bad", "good");

    let extracted = extract_labels(&df, "status", Some(&mapping)).unwrap();

    assert_eq!(extracted.rows, vec![0, 1, 3, 4]);
    assert_eq!(extracted.skipped, 1);
    assert_eq!(extracted.labels.classes(), &["0", "1"]);
    assert_eq!(extracted.labels.codes(), &[0, 1, 1, 0]);
}

#[test]
fn test_missing_target_column() {
    let df = df! { "x" => [1.0f64, 2.0] }.unwrap();

    let err = frame_to_dataset(&df, "target", None, &[]).unwrap_err();
    assert!(err.to_string().contains("Target column 'target' not found"));
}

#[test]
fn test_drop_columns() {
    let df = df! {
        "target" => [0i32, 1, 0],
        "id" => [10i64, 11, 12],
        "x" => [1.0f64, 2.0, 3.0],
    }
    .unwrap();

    let dataset = frame_to_dataset(&df, "target", None, &["id".to_string()]).unwrap();
    assert_eq!(dataset.features.column_names(), vec!["x"]);

    let err = frame_to_dataset(&df, "target", None, &["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_class_distribution() {
    let mut df = common::create_imbalanced_dataframe(30, 6, 2);
    let (_temp_dir, path) = common::create_temp_csv(&mut df);
    let loaded = read_frame(&path).unwrap();

    let counts = class_distribution(&loaded, "target").unwrap();

    assert_eq!(counts, vec![("0".to_string(), 24), ("1".to_string(), 6)]);
}
