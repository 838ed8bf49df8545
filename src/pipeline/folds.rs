//! Stratified contiguous k-fold partitioning

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::error::{PipelineError, Result};
use super::matrix::LabelVector;

/// A single train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct FoldSplit {
    pub fold: usize,
    /// Training rows, ascending
    pub train_indices: Vec<usize>,
    /// Held-out rows, ascending
    pub test_indices: Vec<usize>,
}

/// Validate a fold count against the class distribution
pub fn validate_k_folds(labels: &LabelVector, k_folds: usize) -> Result<()> {
    if k_folds < 2 {
        return Err(PipelineError::config(format!(
            "k_folds must be at least 2, got {}",
            k_folds
        )));
    }

    let smallest = labels
        .class_counts()
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .min_by_key(|(code, count)| (*count, *code));

    if let Some((code, count)) = smallest {
        if k_folds > count {
            return Err(PipelineError::FoldSize {
                k_folds,
                class: labels.class_name(code).to_string(),
                count,
            });
        }
    }
    Ok(())
}

/// Assign every row to a fold.
///
/// The rows of each class, in ascending index order, are cut into `k`
/// contiguous chunks whose sizes differ by at most one. The folds that
/// receive the larger chunks rotate from class to class, starting at a
/// seed-chosen fold, which keeps total fold sizes within one row as well.
pub fn assign_folds(labels: &LabelVector, k_folds: usize, seed: u64) -> Result<Vec<usize>> {
    validate_k_folds(labels, k_folds)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut offset = rng.gen_range(0..k_folds);

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); labels.n_classes()];
    for (row, &code) in labels.codes().iter().enumerate() {
        by_class[code].push(row);
    }

    let mut assignment = vec![0usize; labels.len()];

    for rows in by_class.iter().filter(|r| !r.is_empty()) {
        let base = rows.len() / k_folds;
        let remainder = rows.len() % k_folds;

        let mut sizes = vec![base; k_folds];
        for t in 0..remainder {
            sizes[(offset + t) % k_folds] += 1;
        }
        offset = (offset + remainder) % k_folds;

        let mut start = 0;
        for (fold, &size) in sizes.iter().enumerate() {
            for &row in &rows[start..start + size] {
                assignment[row] = fold;
            }
            start += size;
        }
    }

    Ok(assignment)
}

/// Build the `k` train/test splits
pub fn stratified_splits(labels: &LabelVector, k_folds: usize, seed: u64) -> Result<Vec<FoldSplit>> {
    let assignment = assign_folds(labels, k_folds, seed)?;

    let splits = (0..k_folds)
        .map(|fold| {
            let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                (0..assignment.len()).partition(|&row| assignment[row] == fold);
            FoldSplit {
                fold,
                train_indices,
                test_indices,
            }
        })
        .collect();

    Ok(splits)
}
