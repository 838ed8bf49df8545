//! Class-imbalance resampling for training partitions
//!
//! A [`ResamplingPlan`] is a pure description of which rows to keep,
//! duplicate, drop or synthesize. It is produced by [`plan`] and replayed
//! by [`apply`]; the held-out fold of a cross-validation split never goes
//! through either.

use std::cmp::Ordering;

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{PipelineError, Result};
use super::matrix::{check_aligned, LabelVector, NumericMatrix};

/// Default number of neighbors for synthetic interpolation
pub const DEFAULT_K_NEIGHBORS: usize = 5;

fn default_ratio() -> f64 {
    1.0
}

fn default_k_neighbors() -> usize {
    DEFAULT_K_NEIGHBORS
}

/// How to rebalance a training partition.
///
/// `ratio` is the desired minority/majority ratio in `(0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ResamplingPolicy {
    /// Leave the partition untouched
    None,
    /// Duplicate minority rows round-robin
    OversampleDuplicate {
        #[serde(default = "default_ratio")]
        ratio: f64,
    },
    /// Randomly drop majority rows
    UndersampleRandom {
        #[serde(default = "default_ratio")]
        ratio: f64,
    },
    /// Interpolate new minority rows between same-class nearest neighbors
    SyntheticInterpolate {
        #[serde(default = "default_ratio")]
        ratio: f64,
        #[serde(default = "default_k_neighbors")]
        k_neighbors: usize,
    },
}

impl Default for ResamplingPolicy {
    fn default() -> Self {
        ResamplingPolicy::OversampleDuplicate { ratio: 1.0 }
    }
}

impl ResamplingPolicy {
    pub fn validate(&self) -> Result<()> {
        let ratio = match self {
            ResamplingPolicy::None => return Ok(()),
            ResamplingPolicy::OversampleDuplicate { ratio }
            | ResamplingPolicy::UndersampleRandom { ratio } => *ratio,
            ResamplingPolicy::SyntheticInterpolate { ratio, k_neighbors } => {
                if *k_neighbors == 0 {
                    return Err(PipelineError::config("k_neighbors must be at least 1"));
                }
                *ratio
            }
        };

        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(PipelineError::config(format!(
                "resampling ratio must be in (0, 1], got {}",
                ratio
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResamplingPolicy::None => "none",
            ResamplingPolicy::OversampleDuplicate { .. } => "oversample-duplicate",
            ResamplingPolicy::UndersampleRandom { .. } => "undersample-random",
            ResamplingPolicy::SyntheticInterpolate { .. } => "synthetic-interpolate",
        }
    }
}

/// A synthetic row: `base + gap * (neighbor - base)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSample {
    pub class: usize,
    pub base: usize,
    pub neighbor: usize,
    pub gap: f64,
}

/// Row-level description of one resampling of a training partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResamplingPlan {
    /// Original rows kept, ascending
    pub retained: Vec<usize>,
    /// Rows appended again as duplicates
    pub duplicated: Vec<usize>,
    /// Rows removed
    pub dropped: Vec<usize>,
    /// Rows generated by interpolation
    pub synthetic: Vec<SyntheticSample>,
}

impl ResamplingPlan {
    fn identity(n_rows: usize) -> Self {
        Self {
            retained: (0..n_rows).collect(),
            ..Default::default()
        }
    }

    /// Number of rows `apply` produces
    pub fn output_len(&self) -> usize {
        self.retained.len() + self.duplicated.len() + self.synthetic.len()
    }
}

/// Rows of each class code, ascending
fn rows_by_class(labels: &LabelVector) -> Vec<Vec<usize>> {
    let mut rows = vec![Vec::new(); labels.n_classes()];
    for (i, &code) in labels.codes().iter().enumerate() {
        rows[code].push(i);
    }
    rows
}

/// Build a resampling plan for a training partition
pub fn plan(
    train: &NumericMatrix,
    labels: &LabelVector,
    policy: &ResamplingPolicy,
    seed: u64,
) -> Result<ResamplingPlan> {
    policy.validate()?;
    check_aligned(train.n_rows(), labels)?;

    let by_class = rows_by_class(labels);
    let present: Vec<usize> = by_class.iter().map(Vec::len).filter(|&c| c > 0).collect();
    let (minority, majority) = match (present.iter().min(), present.iter().max()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => return Ok(ResamplingPlan::identity(train.n_rows())),
    };

    let plan = match policy {
        ResamplingPolicy::None => ResamplingPlan::identity(train.n_rows()),
        ResamplingPolicy::OversampleDuplicate { ratio } => {
            let target = ((ratio * majority as f64).round() as usize).max(1);
            let mut plan = ResamplingPlan::identity(train.n_rows());
            for rows in by_class.iter().filter(|r| !r.is_empty()) {
                let need = target.saturating_sub(rows.len());
                plan.duplicated
                    .extend((0..need).map(|i| rows[i % rows.len()]));
            }
            plan
        }
        ResamplingPolicy::UndersampleRandom { ratio } => {
            let target = ((minority as f64 / ratio).round() as usize).max(1);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut dropped = Vec::new();
            for rows in by_class.iter().filter(|r| r.len() > target) {
                let mut keep = vec![false; rows.len()];
                for i in index::sample(&mut rng, rows.len(), target) {
                    keep[i] = true;
                }
                dropped.extend(
                    rows.iter()
                        .zip(keep.iter())
                        .filter(|(_, &k)| !k)
                        .map(|(&r, _)| r),
                );
            }
            dropped.sort_unstable();
            let retained = (0..train.n_rows())
                .filter(|r| dropped.binary_search(r).is_err())
                .collect();
            ResamplingPlan {
                retained,
                dropped,
                ..Default::default()
            }
        }
        ResamplingPolicy::SyntheticInterpolate { ratio, k_neighbors } => {
            let target = ((ratio * majority as f64).round() as usize).max(1);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut plan = ResamplingPlan::identity(train.n_rows());

            for (class, rows) in by_class.iter().enumerate() {
                let need = target.saturating_sub(rows.len());
                if rows.is_empty() || need == 0 {
                    continue;
                }
                if rows.len() < k_neighbors + 1 {
                    return Err(PipelineError::InsufficientSamples {
                        class: labels.class_name(class).to_string(),
                        count: rows.len(),
                        required: k_neighbors + 1,
                    });
                }

                let bases = need.min(rows.len());
                let neighbors: Vec<Vec<usize>> = (0..bases)
                    .into_par_iter()
                    .map(|b| nearest_neighbors(train, rows, rows[b], *k_neighbors))
                    .collect();

                for i in 0..need {
                    let b = i % rows.len();
                    let candidates = &neighbors[b];
                    let neighbor = candidates[rng.gen_range(0..candidates.len())];
                    let gap: f64 = rng.gen();
                    plan.synthetic.push(SyntheticSample {
                        class,
                        base: rows[b],
                        neighbor,
                        gap,
                    });
                }
            }
            plan
        }
    };

    debug!(
        policy = policy.name(),
        rows_in = train.n_rows(),
        rows_out = plan.output_len(),
        duplicated = plan.duplicated.len(),
        dropped = plan.dropped.len(),
        synthetic = plan.synthetic.len(),
        "resampling plan built"
    );

    Ok(plan)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// `k` nearest rows of the same class, excluding `point` itself.
/// Ties are broken by lower row index.
fn nearest_neighbors(train: &NumericMatrix, class_rows: &[usize], point: usize, k: usize) -> Vec<usize> {
    let origin = train.row(point);
    let mut distances: Vec<(f64, usize)> = class_rows
        .iter()
        .filter(|&&r| r != point)
        .map(|&r| (squared_distance(origin, train.row(r)), r))
        .collect();

    distances.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    distances.truncate(k);
    distances.into_iter().map(|(_, r)| r).collect()
}

/// Materialize a plan against the partition it was built from
pub fn apply(
    plan: &ResamplingPlan,
    train: &NumericMatrix,
    labels: &LabelVector,
) -> Result<(NumericMatrix, LabelVector)> {
    check_aligned(train.n_rows(), labels)?;

    let n = train.n_rows();
    let out_of_range = plan
        .retained
        .iter()
        .chain(&plan.duplicated)
        .chain(plan.synthetic.iter().flat_map(|s| [&s.base, &s.neighbor]))
        .find(|&&r| r >= n);
    if let Some(&r) = out_of_range {
        return Err(PipelineError::invalid(format!(
            "resampling plan references row {} of a {}-row partition",
            r, n
        )));
    }

    let mut source_rows = plan.retained.clone();
    source_rows.extend_from_slice(&plan.duplicated);

    let mut matrix = train.take_rows(&source_rows);
    let mut codes: Vec<usize> = source_rows.iter().map(|&r| labels.codes()[r]).collect();

    for s in &plan.synthetic {
        let base = train.row(s.base);
        let neighbor = train.row(s.neighbor);
        let row = base
            .iter()
            .zip(neighbor)
            .map(|(&b, &n)| b + s.gap * (n - b))
            .collect();
        matrix.push_row(row);
        codes.push(s.class);
    }

    let labels = LabelVector::from_codes(codes, labels.classes().to_vec())?;
    Ok((matrix, labels))
}
