//! Evaluation artifacts: ROC curves, per-classifier results, output containers
//!
//! The backends hand back one score per test row; everything here is a sweep
//! over those scores. Curves are built empirically (one point per distinct
//! threshold), resampled onto a fixed false-positive-rate grid when folds
//! need to be averaged, and summarized by the trapezoid-rule AUC.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierKind;
use crate::models::ClassifierModel;

/// Number of FPR grid points used when resampling/averaging curves
pub const ROC_GRID_POINTS: usize = 101;

/// One point of a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    /// False-positive rate (background efficiency)
    pub fpr: f64,
    /// True-positive rate (signal efficiency)
    pub tpr: f64,
}

/// A ROC curve, points ordered by ascending false-positive rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    points: Vec<RocPoint>,
}

impl RocCurve {
    /// Build the empirical curve from per-row scores, sweeping thresholds
    /// from the highest score down. Tied scores move together, so the curve
    /// is threshold-consistent.
    #[must_use]
    pub fn from_scores(signal_scores: &[f64], background_scores: &[f64]) -> Self {
        let n_sig = signal_scores.len();
        let n_bkg = background_scores.len();
        if n_sig == 0 || n_bkg == 0 {
            // Degenerate one-class input: only the trivial endpoints exist.
            return Self {
                points: vec![
                    RocPoint { fpr: 0.0, tpr: 0.0 },
                    RocPoint { fpr: 1.0, tpr: 1.0 },
                ],
            };
        }

        let mut scored: Vec<(f64, bool)> = signal_scores
            .iter()
            .map(|&s| (s, true))
            .chain(background_scores.iter().map(|&s| (s, false)))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut points = Vec::with_capacity(scored.len() + 1);
        points.push(RocPoint { fpr: 0.0, tpr: 0.0 });

        let (mut tp, mut fp) = (0_usize, 0_usize);
        let mut i = 0;
        while i < scored.len() {
            let threshold = scored[i].0;
            while i < scored.len() && scored[i].0 == threshold {
                if scored[i].1 {
                    tp += 1;
                } else {
                    fp += 1;
                }
                i += 1;
            }
            #[allow(clippy::cast_precision_loss)]
            points.push(RocPoint {
                fpr: fp as f64 / n_bkg as f64,
                tpr: tp as f64 / n_sig as f64,
            });
        }

        Self { points }
    }

    /// Curve points, ascending in FPR.
    #[must_use]
    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    /// Area under the curve (trapezoid rule).
    #[must_use]
    pub fn auc(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
            .sum()
    }

    /// Resample onto `n` evenly spaced FPR grid points by linear
    /// interpolation (vertical steps resolve to their upper TPR).
    #[must_use]
    pub fn resampled(&self, n: usize) -> Self {
        let n = n.max(2);
        #[allow(clippy::cast_precision_loss)]
        let points = (0..n)
            .map(|i| {
                let fpr = i as f64 / (n - 1) as f64;
                RocPoint { fpr, tpr: self.tpr_at(fpr) }
            })
            .collect();
        Self { points }
    }

    /// Average several curves: mean TPR at each grid FPR.
    ///
    /// Returns an empty curve when `curves` is empty (the runners never pass
    /// fewer than two folds).
    #[must_use]
    pub fn average(curves: &[Self]) -> Self {
        if curves.is_empty() {
            return Self { points: Vec::new() };
        }

        let mut summed = vec![0.0_f64; ROC_GRID_POINTS];
        for curve in curves {
            let resampled = curve.resampled(ROC_GRID_POINTS);
            for (acc, point) in summed.iter_mut().zip(resampled.points) {
                *acc += point.tpr;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let m = curves.len() as f64;
        #[allow(clippy::cast_precision_loss)]
        let points = summed
            .into_iter()
            .enumerate()
            .map(|(i, sum)| RocPoint {
                fpr: i as f64 / (ROC_GRID_POINTS - 1) as f64,
                tpr: sum / m,
            })
            .collect();
        Self { points }
    }

    /// TPR at a given FPR, interpolating between the bracketing points.
    fn tpr_at(&self, fpr: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }

        // Last point at or below the requested FPR; on a vertical step this
        // picks the top, which is the efficiency actually reachable there.
        let mut lo = 0;
        for (i, point) in self.points.iter().enumerate() {
            if point.fpr <= fpr {
                lo = i;
            } else {
                break;
            }
        }

        let lo_point = self.points[lo];
        self.points.get(lo + 1).map_or(lo_point.tpr, |hi_point| {
            let span = hi_point.fpr - lo_point.fpr;
            if span <= 0.0 {
                lo_point.tpr
            } else {
                lo_point.tpr + (fpr - lo_point.fpr) / span * (hi_point.tpr - lo_point.tpr)
            }
        })
    }
}

/// Per-classifier outcome of a training run.
///
/// The trained model handle is kept for the caller but never serialized; the
/// persisted artifact carries only scores and curve data.
#[derive(Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Spec name (keys the artifact)
    pub classifier: String,
    /// Classifier kind
    pub kind: ClassifierKind,
    /// Area under the test-set ROC curve
    pub auc: f64,
    /// Class label of each test row (1 signal, 0 background)
    pub test_labels: Vec<i32>,
    /// Backend score of each test row, same order as `test_labels`
    pub test_scores: Vec<f64>,
    /// Test-set ROC curve
    pub roc: RocCurve,
    /// Trained-model handle, owned by the backend; dropped on serialization
    #[serde(skip)]
    pub model: Option<Box<dyn ClassifierModel>>,
}

impl std::fmt::Debug for EvaluationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationResult")
            .field("classifier", &self.classifier)
            .field("kind", &self.kind)
            .field("auc", &self.auc)
            .field("test_rows", &self.test_labels.len())
            .finish_non_exhaustive()
    }
}

/// One classifier evaluated on one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// Fold index in `0..folds`
    pub fold: usize,
    /// Spec name
    pub classifier: String,
    /// AUC on the held-out fold
    pub auc: f64,
    /// ROC curve on the held-out fold
    pub roc: RocCurve,
}

/// Output container of a training run. Written whole on every run, replacing
/// any previous artifact at the same path.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingArtifact {
    /// Application name of the run that wrote the artifact
    pub app: String,
    /// Wall-clock time of the write
    pub created_at: DateTime<Utc>,
    /// Per-classifier results, in booking order
    pub results: Vec<EvaluationResult>,
}

/// Output container of a cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationArtifact {
    /// Application name of the run that wrote the artifact
    pub app: String,
    /// Wall-clock time of the write
    pub created_at: DateTime<Utc>,
    /// Number of folds
    pub folds: usize,
    /// Every per-fold result, in (fold, booking) order
    pub fold_results: Vec<FoldResult>,
    /// Fold-averaged ROC curve per classifier name
    pub averaged: BTreeMap<String, RocCurve>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_separation_gives_unit_auc() {
        let curve = RocCurve::from_scores(&[0.9, 0.8, 0.7], &[0.1, 0.2, 0.3]);
        assert!((curve.auc() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_scores_give_zero_auc() {
        let curve = RocCurve::from_scores(&[0.1, 0.2], &[0.8, 0.9]);
        assert!(curve.auc().abs() < 1e-12);
    }

    #[test]
    fn test_curve_endpoints() {
        let curve = RocCurve::from_scores(&[0.6, 0.4], &[0.5, 0.3]);
        let points = curve.points();
        assert_eq!(points[0], RocPoint { fpr: 0.0, tpr: 0.0 });
        let last = points[points.len() - 1];
        assert!((last.fpr - 1.0).abs() < 1e-12);
        assert!((last.tpr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tied_scores_move_together() {
        // All four rows share one score: the only non-trivial point is (1, 1).
        let curve = RocCurve::from_scores(&[0.5, 0.5], &[0.5, 0.5]);
        assert_eq!(curve.points().len(), 2);
        assert!((curve.auc() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_resampled_grid_shape() {
        let curve = RocCurve::from_scores(&[0.9, 0.4], &[0.6, 0.1]);
        let grid = curve.resampled(ROC_GRID_POINTS);
        assert_eq!(grid.points().len(), ROC_GRID_POINTS);
        assert!((grid.points()[0].fpr).abs() < 1e-12);
        assert!((grid.points()[ROC_GRID_POINTS - 1].fpr - 1.0).abs() < 1e-12);
        // TPR stays monotonically non-decreasing after resampling.
        for w in grid.points().windows(2) {
            assert!(w[1].tpr >= w[0].tpr - 1e-12);
        }
    }

    #[test]
    fn test_average_of_identical_curves_is_the_curve() {
        let curve = RocCurve::from_scores(&[0.9, 0.7, 0.5], &[0.6, 0.3, 0.2]);
        let averaged = RocCurve::average(&[curve.clone(), curve.clone()]);
        let expected = curve.resampled(ROC_GRID_POINTS);
        for (a, e) in averaged.points().iter().zip(expected.points()) {
            assert!((a.tpr - e.tpr).abs() < 1e-12);
        }
    }

    #[test]
    fn test_artifact_round_trips_through_json() {
        let roc = RocCurve::from_scores(&[0.8], &[0.2]);
        let artifact = CrossValidationArtifact {
            app: "test".to_string(),
            created_at: Utc::now(),
            folds: 2,
            fold_results: vec![FoldResult {
                fold: 0,
                classifier: "BDT".to_string(),
                auc: roc.auc(),
                roc: roc.clone(),
            }],
            averaged: BTreeMap::from([("BDT".to_string(), roc)]),
        };
        let json = serde_json::to_string(&artifact).unwrap();
        let back: CrossValidationArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }
}
