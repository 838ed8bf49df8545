//! Tests for the imbalance resampler

use tabsel::pipeline::resampling::{self, ResamplingPolicy};
use tabsel::pipeline::{LabelVector, NumericMatrix, PipelineError};

/// 20 majority rows along a line, 6 minority rows in a separate cluster
fn partition() -> (NumericMatrix, LabelVector) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..20 {
        rows.push(vec![i as f64, 0.0]);
        labels.push("0");
    }
    for i in 0..6 {
        rows.push(vec![100.0 + i as f64, 50.0 + i as f64]);
        labels.push("1");
    }
    let matrix = NumericMatrix::new(vec!["x".to_string(), "y".to_string()], rows).unwrap();
    (matrix, LabelVector::new(&labels))
}

fn counts(labels: &LabelVector) -> Vec<usize> {
    labels.class_counts()
}

#[test]
fn test_none_is_identity() {
    let (m, labels) = partition();
    let plan = resampling::plan(&m, &labels, &ResamplingPolicy::None, 1).unwrap();

    let (out, out_labels) = resampling::apply(&plan, &m, &labels).unwrap();

    assert_eq!(out, m);
    assert_eq!(out_labels, labels);
}

#[test]
fn test_oversample_balances_within_one() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::OversampleDuplicate { ratio: 1.0 };

    let plan = resampling::plan(&m, &labels, &policy, 1).unwrap();
    let (out, out_labels) = resampling::apply(&plan, &m, &labels).unwrap();

    let c = counts(&out_labels);
    assert!(c[0].abs_diff(c[1]) <= 1, "counts {:?} not balanced", c);
    assert_eq!(out.n_rows(), plan.output_len());
    // Duplicates are copies of minority rows
    for &r in &plan.duplicated {
        assert_eq!(labels.codes()[r], 1);
    }
}

#[test]
fn test_oversample_partial_ratio() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::OversampleDuplicate { ratio: 0.5 };

    let plan = resampling::plan(&m, &labels, &policy, 1).unwrap();
    let (_, out_labels) = resampling::apply(&plan, &m, &labels).unwrap();

    assert_eq!(counts(&out_labels), vec![20, 10]);
}

#[test]
fn test_undersample_drops_majority_only() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::UndersampleRandom { ratio: 1.0 };

    let plan = resampling::plan(&m, &labels, &policy, 9).unwrap();
    let (_, out_labels) = resampling::apply(&plan, &m, &labels).unwrap();

    assert_eq!(counts(&out_labels), vec![6, 6]);
    assert_eq!(plan.dropped.len(), 14);
    assert!(plan.dropped.iter().all(|&r| labels.codes()[r] == 0));
}

#[test]
fn test_synthetic_rows_lie_between_minority_points() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::SyntheticInterpolate {
        ratio: 1.0,
        k_neighbors: 3,
    };

    let plan = resampling::plan(&m, &labels, &policy, 5).unwrap();
    let (out, out_labels) = resampling::apply(&plan, &m, &labels).unwrap();

    assert_eq!(counts(&out_labels), vec![20, 20]);
    assert_eq!(plan.synthetic.len(), 14);
    for row in &out.rows()[m.n_rows()..] {
        assert!(row[0] >= 100.0 && row[0] <= 105.0, "x = {} outside cluster", row[0]);
        assert!(row[1] >= 50.0 && row[1] <= 55.0, "y = {} outside cluster", row[1]);
    }
}

#[test]
fn test_synthetic_is_deterministic_for_a_seed() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::SyntheticInterpolate {
        ratio: 1.0,
        k_neighbors: 2,
    };

    let first = resampling::plan(&m, &labels, &policy, 17).unwrap();
    let second = resampling::plan(&m, &labels, &policy, 17).unwrap();
    let other = resampling::plan(&m, &labels, &policy, 18).unwrap();

    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn test_synthetic_insufficient_samples() {
    let (m, labels) = partition();
    let policy = ResamplingPolicy::SyntheticInterpolate {
        ratio: 1.0,
        k_neighbors: 6,
    };

    let result = resampling::plan(&m, &labels, &policy, 1);

    match result {
        Err(PipelineError::InsufficientSamples {
            class,
            count,
            required,
        }) => {
            assert_eq!(class, "1");
            assert_eq!(count, 6);
            assert_eq!(required, 7);
        }
        other => panic!("expected InsufficientSamples, got {:?}", other),
    }
}

#[test]
fn test_invalid_ratio() {
    let (m, labels) = partition();
    for ratio in [0.0, 1.5, f64::NAN] {
        let policy = ResamplingPolicy::OversampleDuplicate { ratio };
        assert!(matches!(
            resampling::plan(&m, &labels, &policy, 1),
            Err(PipelineError::Configuration { .. })
        ));
    }
}

#[test]
fn test_plan_rejects_foreign_partition() {
    let (m, labels) = partition();
    let plan = resampling::plan(
        &m,
        &labels,
        &ResamplingPolicy::OversampleDuplicate { ratio: 1.0 },
        1,
    )
    .unwrap();

    let small = m.take_rows(&[0, 1, 2]);
    let small_labels = labels.take(&[0, 1, 2]);

    assert!(resampling::apply(&plan, &small, &small_labels).is_err());
}
