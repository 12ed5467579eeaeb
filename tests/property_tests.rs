//! Property-based tests for the partitioning and curve invariants the
//! runners rely on.

use std::collections::HashSet;

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ttbar_mva::eval::RocCurve;
use ttbar_mva::split::{fold_assignments, random_split};

proptest! {
    /// Property: train/test partitions are disjoint and cover every index.
    #[test]
    fn prop_random_split_partitions(
        n in 0_usize..300,
        fraction in 0.05_f64..0.95,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let split = random_split(n, fraction, &mut rng);

        prop_assert_eq!(split.train.len() + split.test.len(), n);
        let mut seen = HashSet::new();
        for &idx in split.train.iter().chain(&split.test) {
            prop_assert!(idx < n);
            prop_assert!(seen.insert(idx), "index {} assigned twice", idx);
        }
    }

    /// Property: K folds, every index in exactly one fold, union is complete.
    #[test]
    fn prop_folds_partition_exactly(
        n in 0_usize..150,
        folds in 2_usize..8,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let assignment = fold_assignments(n, folds, &mut rng);

        prop_assert_eq!(assignment.len(), folds);
        let mut seen = HashSet::new();
        for fold in &assignment {
            for &idx in fold {
                prop_assert!(idx < n);
                prop_assert!(seen.insert(idx), "index {} assigned twice", idx);
            }
        }
        prop_assert_eq!(seen.len(), n);
    }

    /// Property: a ROC curve is monotone in both rates and its AUC is a
    /// probability.
    #[test]
    fn prop_roc_curve_well_formed(
        signal in prop::collection::vec(-10.0_f64..10.0, 1..60),
        background in prop::collection::vec(-10.0_f64..10.0, 1..60),
    ) {
        let curve = RocCurve::from_scores(&signal, &background);

        let auc = curve.auc();
        prop_assert!((0.0..=1.0).contains(&auc), "AUC {} out of range", auc);
        for w in curve.points().windows(2) {
            prop_assert!(w[1].fpr >= w[0].fpr);
            prop_assert!(w[1].tpr >= w[0].tpr);
        }
    }

    /// Property: averaging fold curves keeps the grid and the AUC range.
    #[test]
    fn prop_averaged_curve_in_range(
        seeds in prop::collection::vec(any::<u64>(), 2..5),
    ) {
        let curves: Vec<RocCurve> = seeds
            .iter()
            .map(|&s| {
                // Deterministic but varied score sets per fold.
                let signal: Vec<f64> = (0..20).map(|i| f64::from(i) + (s % 7) as f64).collect();
                let background: Vec<f64> = (0..20).map(|i| f64::from(i) - (s % 5) as f64).collect();
                RocCurve::from_scores(&signal, &background)
            })
            .collect();

        let averaged = RocCurve::average(&curves);
        let auc = averaged.auc();
        prop_assert!((0.0..=1.0).contains(&auc));
        for w in averaged.points().windows(2) {
            prop_assert!(w[1].tpr >= w[0].tpr - 1e-12);
        }
    }
}
