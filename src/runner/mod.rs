//! Run orchestration
//!
//! Thin, strictly sequential glue: validate the config, partition the
//! bundle, drive each booked classifier through the backend, persist the
//! result container. A single classifier failure aborts the whole run with
//! the offending spec's name — no best-effort continuation.

mod cross_validation;

pub use cross_validation::CrossValidationRunner;

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ExperimentConfig, SplitPolicy};
use crate::eval::{EvaluationResult, RocCurve, TrainingArtifact};
use crate::models;
use crate::sample::{DatasetBundle, LabeledDataset};
use crate::split::random_split;
use crate::{Error, Result};

/// Trains every booked classifier on one stratified train/test split and
/// writes the result container.
pub struct TrainingRunner {
    app: String,
}

impl TrainingRunner {
    /// Create a runner named after the driving application.
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    /// Run the full training stage.
    ///
    /// Splits the bundle per the config's random-split policy (stratified:
    /// each table is split independently with the same fraction), trains
    /// each classifier in booking order on the config's declared variables,
    /// evaluates on the held-out rows and overwrites the artifact at
    /// `output`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails or the config carries a
    /// K-fold policy (that belongs to [`CrossValidationRunner`]), and
    /// [`Error::Training`] naming the offending classifier if a backend
    /// rejects its inputs.
    pub fn run<P: AsRef<Path>>(
        &self,
        bundle: &DatasetBundle,
        config: &ExperimentConfig,
        output: P,
    ) -> Result<Vec<EvaluationResult>> {
        config.validate(bundle.variables())?;
        let SplitPolicy::Random { train_fraction, seed } = config.split() else {
            return Err(Error::Config(
                "training runner requires a random split policy".to_string(),
            ));
        };
        let columns = variable_columns(config, bundle);

        let mut rng = StdRng::seed_from_u64(seed);
        let signal_split = random_split(bundle.signal().len(), train_fraction, &mut rng);
        let background_split = random_split(bundle.background().len(), train_fraction, &mut rng);

        tracing::info!(
            app = %self.app,
            train_rows = signal_split.train.len() + background_split.train.len(),
            test_rows = signal_split.test.len() + background_split.test.len(),
            "prepared training and test partitions"
        );

        let (train_rows, train_labels, train_weights) = stack_partitions(
            bundle,
            &signal_split.train,
            &background_split.train,
            &columns,
        );
        let signal_test = gather(bundle.signal(), &signal_split.test, &columns);
        let background_test = gather(bundle.background(), &background_split.test, &columns);

        let mut results = Vec::with_capacity(config.classifiers().len());
        for spec in config.classifiers() {
            tracing::info!(classifier = spec.name(), kind = ?spec.kind(), "training");
            let mut model = models::build(spec, columns.len())?;
            model.fit(&train_rows, &train_labels, &train_weights)?;

            let signal_scores = model.scores(&signal_test)?;
            let background_scores = model.scores(&background_test)?;
            let roc = RocCurve::from_scores(&signal_scores, &background_scores);
            let auc = roc.auc();
            tracing::info!(classifier = spec.name(), auc, "evaluated on test partition");

            let mut test_labels = vec![bundle.signal().label(); signal_scores.len()];
            test_labels.extend(vec![bundle.background().label(); background_scores.len()]);
            let mut test_scores = signal_scores;
            test_scores.extend(background_scores);

            results.push(EvaluationResult {
                classifier: spec.name().to_string(),
                kind: spec.kind(),
                auc,
                test_labels,
                test_scores,
                roc,
                model: Some(model),
            });
        }

        let artifact = TrainingArtifact {
            app: self.app.clone(),
            created_at: Utc::now(),
            results,
        };
        write_artifact(&artifact, output.as_ref())?;
        tracing::info!(path = %output.as_ref().display(), "wrote training artifact");

        Ok(artifact.results)
    }
}

/// Bundle column index of each declared variable, in declaration order.
///
/// The declared list selects the classifier inputs: a config naming a subset
/// of the bundle schema trains on that subset only. Membership has already
/// been checked by `validate`, so every name resolves.
pub(crate) fn variable_columns(config: &ExperimentConfig, bundle: &DatasetBundle) -> Vec<usize> {
    config
        .variables()
        .iter()
        .filter_map(|v| bundle.variables().iter().position(|b| b == v))
        .collect()
}

/// Feature rows of a table at the given row indices, projected onto the
/// declared variable columns.
pub(crate) fn gather(
    dataset: &LabeledDataset,
    indices: &[usize],
    columns: &[usize],
) -> Vec<Vec<f32>> {
    indices
        .iter()
        .map(|&i| {
            let values = dataset.records()[i].values();
            columns.iter().map(|&c| values[c]).collect()
        })
        .collect()
}

/// Stack signal and background partitions into one training set with labels
/// and per-row weights.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn stack_partitions(
    bundle: &DatasetBundle,
    signal_indices: &[usize],
    background_indices: &[usize],
    columns: &[usize],
) -> (Vec<Vec<f32>>, Vec<f32>, Vec<f32>) {
    let mut rows = gather(bundle.signal(), signal_indices, columns);
    rows.extend(gather(bundle.background(), background_indices, columns));

    let mut labels = vec![bundle.signal().label() as f32; signal_indices.len()];
    labels.extend(vec![bundle.background().label() as f32; background_indices.len()]);

    let mut weights = vec![bundle.signal().weight(); signal_indices.len()];
    weights.extend(vec![bundle.background().weight(); background_indices.len()]);

    (rows, labels, weights)
}

/// Serialize an artifact, overwriting any prior content at `path`.
pub(crate) fn write_artifact<T: serde::Serialize>(artifact: &T, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, artifact)?;
    Ok(())
}
