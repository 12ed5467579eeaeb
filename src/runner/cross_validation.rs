//! K-fold cross-validation over the full bundle
//!
//! Each table is folded independently with the same fold count, so every
//! fold keeps approximately the global signal:background ratio. For fold
//! `k`, training runs on the union of all other folds and evaluation on fold
//! `k` alone; per-fold curves are then averaged per classifier. Per-fold
//! models are discarded after aggregation. Curve rendering belongs to an
//! interactive context; headless runs only persist the artifact.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{gather, stack_partitions, variable_columns, write_artifact};
use crate::config::ExperimentConfig;
use crate::eval::{CrossValidationArtifact, FoldResult, RocCurve};
use crate::models;
use crate::sample::DatasetBundle;
use crate::split::fold_assignments;
use crate::{Error, Result};

/// Repeats train/evaluate per fold per classifier and aggregates the
/// per-fold ROC curves into one averaged curve per classifier.
pub struct CrossValidationRunner {
    app: String,
}

impl CrossValidationRunner {
    /// Create a runner named after the driving application.
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// Run the full cross-validation stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on validation failure or `folds < 2`, and
    /// [`Error::Training`] (naming the classifier) if any fold's training
    /// fails. The whole run aborts on the first failure, matching the
    /// all-or-nothing batch style of the training runner.
    pub fn run<P: AsRef<Path>>(
        &self,
        bundle: &DatasetBundle,
        config: &ExperimentConfig,
        folds: usize,
        output: P,
    ) -> Result<BTreeMap<String, RocCurve>> {
        config.validate(bundle.variables())?;
        if folds < 2 {
            return Err(Error::Config(format!(
                "cross-validation needs at least 2 folds, got {folds}"
            )));
        }

        let columns = variable_columns(config, bundle);
        let mut rng = StdRng::seed_from_u64(config.split().seed());
        let signal_folds = fold_assignments(bundle.signal().len(), folds, &mut rng);
        let background_folds = fold_assignments(bundle.background().len(), folds, &mut rng);

        let mut fold_results = Vec::with_capacity(folds * config.classifiers().len());
        for k in 0..folds {
            let train_signal: Vec<usize> = held_in(&signal_folds, k);
            let train_background: Vec<usize> = held_in(&background_folds, k);
            tracing::info!(
                app = %self.app,
                fold = k,
                train_rows = train_signal.len() + train_background.len(),
                test_rows = signal_folds[k].len() + background_folds[k].len(),
                "running fold"
            );

            let (train_rows, train_labels, train_weights) =
                stack_partitions(bundle, &train_signal, &train_background, &columns);
            let signal_test = gather(bundle.signal(), &signal_folds[k], &columns);
            let background_test = gather(bundle.background(), &background_folds[k], &columns);

            for spec in config.classifiers() {
                let mut model = models::build(spec, columns.len())?;
                model.fit(&train_rows, &train_labels, &train_weights)?;

                let signal_scores = model.scores(&signal_test)?;
                let background_scores = model.scores(&background_test)?;
                let roc = RocCurve::from_scores(&signal_scores, &background_scores);
                let auc = roc.auc();
                tracing::info!(classifier = spec.name(), fold = k, auc, "evaluated fold");

                fold_results.push(FoldResult {
                    fold: k,
                    classifier: spec.name().to_string(),
                    auc,
                    roc,
                });
            }
        }

        let mut averaged = BTreeMap::new();
        for spec in config.classifiers() {
            let curves: Vec<RocCurve> = fold_results
                .iter()
                .filter(|r| r.classifier == spec.name())
                .map(|r| r.roc.clone())
                .collect();
            let curve = RocCurve::average(&curves);
            tracing::info!(classifier = spec.name(), auc = curve.auc(), "averaged ROC");
            averaged.insert(spec.name().to_string(), curve);
        }

        let artifact = CrossValidationArtifact {
            app: self.app.clone(),
            created_at: Utc::now(),
            folds,
            fold_results,
            averaged,
        };
        write_artifact(&artifact, output.as_ref())?;
        tracing::info!(path = %output.as_ref().display(), "wrote cross-validation artifact");

        Ok(artifact.averaged)
    }
}

/// Indices of every fold except `held_out`, i.e. the training side of a fold.
fn held_in(folds: &[Vec<usize>], held_out: usize) -> Vec<usize> {
    folds
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != held_out)
        .flat_map(|(_, fold)| fold.iter().copied())
        .collect()
}
