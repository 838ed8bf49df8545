//! Benchmark for cross-validated search across learners
//!
//! Run with: cargo bench --bench search_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::SeedableRng;

use tabsel::pipeline::{
    FeatureColumn, FeatureMatrix, LabelVector, LearnerKind, Metric, PreprocessConfig,
    ResamplingPolicy, SearchEngine, SearchSpace,
};

/// Imbalanced two-class data: 4 numeric features and one categorical
fn generate_dataset(n_rows: usize, seed: u64) -> (FeatureMatrix, LabelVector) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let labels: Vec<&str> = (0..n_rows)
        .map(|_| if rng.gen::<f64>() < 0.15 { "1" } else { "0" })
        .collect();

    let mut columns: Vec<FeatureColumn> = (0..4)
        .map(|f| {
            let values = labels
                .iter()
                .map(|&l| {
                    let shift = if l == "1" { 0.5 * f as f64 } else { 0.0 };
                    shift + rng.gen::<f64>() * 2.0
                })
                .collect();
            FeatureColumn::numeric(format!("x{}", f), values)
        })
        .collect();
    let segments: Vec<String> = (0..n_rows)
        .map(|_| format!("seg_{}", rng.gen_range(0..20)))
        .collect();
    columns.push(FeatureColumn::categorical("segment", segments));

    (
        FeatureMatrix::new(columns).expect("Failed to create matrix"),
        LabelVector::new(&labels),
    )
}

fn spaces() -> Vec<(LearnerKind, SearchSpace)> {
    vec![
        (
            LearnerKind::Logistic,
            SearchSpace::grid([("learning_rate", vec![0.05, 0.1, 0.5])]),
        ),
        (LearnerKind::Knn, SearchSpace::grid([("k", vec![3, 5, 9])])),
        (
            LearnerKind::NaiveBayes,
            SearchSpace::grid([("var_smoothing", vec![1e-9, 1e-6, 1e-3])]),
        ),
    ]
}

/// Five-fold search over three configurations per learner
fn benchmark_search_by_learner(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_by_learner");
    group.sample_size(10);

    let (matrix, labels) = generate_dataset(2_000, 42);

    for (learner, space) in spaces() {
        let engine = SearchEngine::new(learner.build(), PreprocessConfig::default());
        group.bench_with_input(
            BenchmarkId::new("five_fold", learner),
            &space,
            |b, space| {
                b.iter(|| {
                    engine.search(
                        black_box(&matrix),
                        black_box(&labels),
                        space,
                        5,
                        Metric::BalancedAccuracy,
                    )
                });
            },
        );
    }

    group.finish();
}

/// Preprocessing cost of each resampling policy inside a search
fn benchmark_search_by_resampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_by_resampling");
    group.sample_size(10);

    let (matrix, labels) = generate_dataset(2_000, 7);
    let space = SearchSpace::grid([("var_smoothing", vec![1e-9])]);
    let policies = [
        ResamplingPolicy::None,
        ResamplingPolicy::OversampleDuplicate { ratio: 1.0 },
        ResamplingPolicy::UndersampleRandom { ratio: 1.0 },
        ResamplingPolicy::SyntheticInterpolate {
            ratio: 1.0,
            k_neighbors: 5,
        },
    ];

    for policy in policies {
        let name = policy.name();
        let preprocess = PreprocessConfig {
            resampling: policy,
            ..Default::default()
        };
        let engine = SearchEngine::new(LearnerKind::NaiveBayes.build(), preprocess);
        group.bench_function(BenchmarkId::new("naive_bayes", name), |b| {
            b.iter(|| {
                engine.search(
                    black_box(&matrix),
                    black_box(&labels),
                    &space,
                    5,
                    Metric::BalancedAccuracy,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_search_by_learner,
    benchmark_search_by_resampling
);
criterion_main!(benches);
