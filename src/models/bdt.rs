//! Boosted decision tree backend (`gbdt` crate)

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

use super::ClassifierModel;
use crate::config::{BdtParams, ClassifierSpec};
use crate::{Error, Result};

/// Gradient boosted decision tree trained with log-likelihood loss.
pub struct GradientBdt {
    name: String,
    params: BdtParams,
    n_features: usize,
    model: Option<GBDT>,
}

impl GradientBdt {
    /// Build an untrained backend from a booked spec.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the spec's options do not parse.
    pub fn from_spec(spec: &ClassifierSpec, n_features: usize) -> Result<Self> {
        Ok(Self {
            name: spec.name().to_string(),
            params: BdtParams::from_options(spec.name(), spec.options())?,
            n_features,
            model: None,
        })
    }

    fn training_error(&self, message: impl Into<String>) -> Error {
        Error::Training {
            classifier: self.name.clone(),
            message: message.into(),
        }
    }
}

impl ClassifierModel for GradientBdt {
    fn fit(&mut self, rows: &[Vec<f32>], labels: &[f32], weights: &[f32]) -> Result<()> {
        if rows.is_empty() {
            return Err(self.training_error("empty training partition"));
        }

        let mut config = Config::new();
        config.set_feature_size(self.n_features);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.n_trees);
        #[allow(clippy::cast_possible_truncation)]
        config.set_shrinkage(self.params.shrinkage as f32);
        config.set_data_sample_ratio(self.params.bagged_sample_fraction);
        config.set_min_leaf_size(self.params.min_leaf_size);
        // Binary classification: log-likelihood loss over {-1, 1} labels.
        config.set_loss("LogLikelyhood");
        config.set_debug(false);

        let mut training: DataVec = rows
            .iter()
            .zip(labels.iter().zip(weights))
            .map(|(row, (&label, &weight))| {
                let target = if label > 0.5 { 1.0 } else { -1.0 };
                Data::new_training_data(row.clone(), weight, target, None)
            })
            .collect();

        let mut model = GBDT::new(&config);
        model.fit(&mut training);
        self.model = Some(model);
        Ok(())
    }

    fn scores(&mut self, rows: &[Vec<f32>]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| self.training_error("scored before fit"))?;

        let test: DataVec = rows
            .iter()
            .map(|row| Data::new_test_data(row.clone(), None))
            .collect();
        Ok(model.predict(&test).into_iter().map(f64::from).collect())
    }
}
