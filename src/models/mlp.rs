//! Feed-forward network backend (`neuroflow` crate)
//!
//! Tanh neurons, inputs normalized to [-1, 1] from the training ranges,
//! targets at ±1.

use neuroflow::activators::Type;
use neuroflow::data::DataSet;
use neuroflow::FeedForward;

use super::ClassifierModel;
use crate::config::{ClassifierSpec, MlpParams};
use crate::{Error, Result};

/// Multi-layer perceptron with tanh activations.
pub struct TanhNetwork {
    name: String,
    params: MlpParams,
    n_features: usize,
    // Per-feature (min, max) from the training partition.
    ranges: Vec<(f32, f32)>,
    net: Option<FeedForward>,
}

impl TanhNetwork {
    /// Build an untrained backend from a booked spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the spec's options do not parse.
    pub fn from_spec(spec: &ClassifierSpec, n_features: usize) -> Result<Self> {
        Ok(Self {
            name: spec.name().to_string(),
            params: MlpParams::from_options(spec.name(), spec.options())?,
            n_features,
            ranges: Vec::new(),
            net: None,
        })
    }

    fn training_error(&self, message: impl Into<String>) -> Error {
        Error::Training {
            classifier: self.name.clone(),
            message: message.into(),
        }
    }

    fn normalized(&self, row: &[f32]) -> Vec<f64> {
        row.iter()
            .zip(&self.ranges)
            .map(|(&value, &(min, max))| {
                if max > min {
                    f64::from(2.0 * (value - min) / (max - min) - 1.0)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl ClassifierModel for TanhNetwork {
    fn fit(&mut self, rows: &[Vec<f32>], labels: &[f32], _weights: &[f32]) -> Result<()> {
        if rows.is_empty() {
            return Err(self.training_error("empty training partition"));
        }

        self.ranges = (0..self.n_features)
            .map(|i| {
                let mut min = f32::INFINITY;
                let mut max = f32::NEG_INFINITY;
                for row in rows {
                    min = min.min(row[i]);
                    max = max.max(row[i]);
                }
                (min, max)
            })
            .collect();

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let architecture: Vec<i32> = std::iter::once(self.n_features as i32)
            .chain(self.params.hidden_layers.iter().map(|&l| l as i32))
            .chain(std::iter::once(1))
            .collect();

        let mut net = FeedForward::new(&architecture);
        net.activation(Type::Tanh);
        net.learning_rate(self.params.learning_rate);

        let mut data = DataSet::new();
        for (row, &label) in rows.iter().zip(labels) {
            let target = if label > 0.5 { 1.0 } else { -1.0 };
            data.push(&self.normalized(row), &[target]);
        }

        // One cycle = one randomly drawn training row in neuroflow terms.
        #[allow(clippy::cast_possible_wrap)]
        let iterations = (self.params.n_cycles * rows.len()) as i64;
        net.train(&data, iterations);

        self.net = Some(net);
        Ok(())
    }

    fn scores(&mut self, rows: &[Vec<f32>]) -> Result<Vec<f64>> {
        let normalized: Vec<Vec<f64>> = rows.iter().map(|row| self.normalized(row)).collect();

        let net = self.net.as_mut().ok_or_else(|| Error::Training {
            classifier: self.name.clone(),
            message: "scored before fit".to_string(),
        })?;
        Ok(normalized.iter().map(|row| net.calc(row)[0]).collect())
    }
}
