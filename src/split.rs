//! Partitioning utilities for train/test splits and K-fold assignment
//!
//! Both helpers operate on row indices of a single class; the runners call
//! them once per table, which is what makes the splits stratified: each class
//! keeps approximately its global share in every partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Disjoint train/test index sets over `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Indices assigned to the training partition
    pub train: Vec<usize>,
    /// Indices assigned to the test partition
    pub test: Vec<usize>,
}

/// Randomly split `0..n` into train/test partitions.
///
/// The partitions are disjoint and their sizes sum to `n`; the train side
/// receives `round(fraction * n)` indices.
#[must_use]
pub fn random_split(n: usize, fraction: f64, rng: &mut StdRng) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n_train = ((fraction * n as f64).round() as usize).min(n);
    let test = indices.split_off(n_train);
    SplitIndices { train: indices, test }
}

/// Assign `0..n` to `folds` disjoint folds, round-robin after a shuffle.
///
/// Every index lands in exactly one fold and the union of all folds is the
/// full range; fold sizes differ by at most one.
#[must_use]
pub fn fold_assignments(n: usize, folds: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut assignment = vec![Vec::with_capacity(n / folds + 1); folds];
    for (i, idx) in indices.into_iter().enumerate() {
        assignment[i % folds].push(idx);
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_random_split_disjoint_and_complete() {
        let mut rng = StdRng::seed_from_u64(7);
        let split = random_split(101, 0.7, &mut rng);

        assert_eq!(split.train.len() + split.test.len(), 101);
        let train: HashSet<_> = split.train.iter().collect();
        assert!(split.test.iter().all(|i| !train.contains(i)));
        assert_eq!(split.train.len(), 71); // round(0.7 * 101)
    }

    #[test]
    fn test_random_split_deterministic_per_seed() {
        let a = random_split(50, 0.5, &mut StdRng::seed_from_u64(42));
        let b = random_split(50, 0.5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_fold_assignments_cover_every_index_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let folds = fold_assignments(25, 4, &mut rng);

        assert_eq!(folds.len(), 4);
        let mut seen = HashSet::new();
        for fold in &folds {
            for &idx in fold {
                assert!(seen.insert(idx), "index {idx} assigned twice");
            }
        }
        assert_eq!(seen.len(), 25);
        // Sizes differ by at most one.
        let sizes: Vec<_> = folds.iter().map(Vec::len).collect();
        assert_eq!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap(), 1);
    }
}
