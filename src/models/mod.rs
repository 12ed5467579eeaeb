//! Classifier backends
//!
//! The training collaborators live behind the [`ClassifierModel`] trait:
//! the runners hand them feature rows, labels and weights and read back one
//! score per row. Tree boosting belongs to the `gbdt` crate and network
//! training to `neuroflow`; nothing in this crate second-guesses either.

mod bdt;
mod mlp;

pub use bdt::GradientBdt;
pub use mlp::TanhNetwork;

use crate::config::{ClassifierKind, ClassifierSpec};
use crate::Result;

/// A trainable, scorable classifier.
///
/// `fit` consumes the training partition; `scores` returns one monotone
/// signal-likeness score per row (larger = more signal-like). Scoring takes
/// `&mut self` because some backends evaluate in place.
pub trait ClassifierModel {
    /// Train on feature rows with per-row labels (1 signal, 0 background)
    /// and weights.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Training`] if the collaborator rejects the
    /// data or hyperparameters.
    fn fit(&mut self, rows: &[Vec<f32>], labels: &[f32], weights: &[f32]) -> Result<()>;

    /// Score rows with the trained model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Training`] if the model has not been fitted.
    fn scores(&mut self, rows: &[Vec<f32>]) -> Result<Vec<f64>>;
}

/// Construct the backend for a booked classifier.
///
/// # Errors
///
/// Returns [`crate::Error::Config`] if the spec's hyperparameters do not
/// parse (the config validation catches this earlier on the normal path).
pub fn build(spec: &ClassifierSpec, n_features: usize) -> Result<Box<dyn ClassifierModel>> {
    match spec.kind() {
        ClassifierKind::BoostedTree => {
            Ok(Box::new(GradientBdt::from_spec(spec, n_features)?))
        }
        ClassifierKind::NeuralNet => {
            Ok(Box::new(TanhNetwork::from_spec(spec, n_features)?))
        }
    }
}
