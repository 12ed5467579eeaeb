//! Experiment configuration
//!
//! Pure declarative data: the variable list, the split policy and the ordered
//! list of classifiers to book. The only behavior is validation, which runs
//! before any training and rejects duplicate classifier names, unknown
//! variable references and unknown hyperparameter keys. Hyperparameters are
//! parsed into typed structs up front rather than failing deep inside the
//! training backends.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::sample::default_variables;
use crate::{Error, Result};

/// Kind of classifier to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// Gradient boosted decision tree (the `gbdt` backend)
    BoostedTree,
    /// Feed-forward tanh network (the `neuroflow` backend)
    NeuralNet,
}

/// One booked classifier: kind, unique name and hyperparameter map.
///
/// Immutable at run time; hyperparameter keys are validated against the
/// kind's typed parameter set during [`ExperimentConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSpec {
    kind: ClassifierKind,
    name: String,
    options: BTreeMap<String, String>,
}

impl ClassifierSpec {
    /// Create a spec with an empty option map (kind defaults apply).
    #[must_use]
    pub fn new(kind: ClassifierKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            options: BTreeMap::new(),
        }
    }

    /// Set one hyperparameter (builder style).
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Classifier kind.
    #[must_use]
    pub const fn kind(&self) -> ClassifierKind {
        self.kind
    }

    /// Unique spec name (keys the output artifacts).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw hyperparameter map.
    #[must_use]
    pub const fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

/// How the bundle is partitioned before training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitPolicy {
    /// Stratified random split holding out `1 - train_fraction` for testing.
    Random {
        /// Fraction of each class assigned to the training partition
        train_fraction: f64,
        /// Seed for the shuffle, kept explicit for reproducibility
        seed: u64,
    },
    /// K-fold partitioning (used by the cross-validation runner).
    KFold {
        /// Number of folds
        folds: usize,
        /// Seed for the shuffle
        seed: u64,
    },
}

impl SplitPolicy {
    /// The policy's shuffle seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        match self {
            Self::Random { seed, .. } | Self::KFold { seed, .. } => *seed,
        }
    }
}

/// The full experiment declaration handed to the runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    variables: Vec<String>,
    split: SplitPolicy,
    classifiers: Vec<ClassifierSpec>,
}

impl ExperimentConfig {
    /// Create a config with no classifiers booked yet.
    #[must_use]
    pub const fn new(variables: Vec<String>, split: SplitPolicy) -> Self {
        Self {
            variables,
            split,
            classifiers: Vec::new(),
        }
    }

    /// Book a classifier (builder style, evaluated in booking order).
    #[must_use]
    pub fn book(mut self, spec: ClassifierSpec) -> Self {
        self.classifiers.push(spec);
        self
    }

    /// Declared input variables.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The train/test split policy.
    #[must_use]
    pub const fn split(&self) -> SplitPolicy {
        self.split
    }

    /// Booked classifiers in declaration order.
    #[must_use]
    pub fn classifiers(&self) -> &[ClassifierSpec] {
        &self.classifiers
    }

    /// The study's default booking: a BDT and an MLP over the three variables.
    #[must_use]
    pub fn default_classification() -> Self {
        Self::new(
            default_variables(),
            SplitPolicy::Random {
                train_fraction: 0.5,
                seed: 100,
            },
        )
        .book(default_bdt("BDT"))
        .book(default_mlp("MLP"))
    }

    /// Default booking for the cross-validation study, where the network is
    /// conventionally named `NN`.
    #[must_use]
    pub fn default_cross_validation() -> Self {
        Self::new(
            default_variables(),
            SplitPolicy::KFold { folds: 2, seed: 100 },
        )
        .book(default_bdt("BDT"))
        .book(default_mlp("NN"))
    }

    /// Check the config against a bundle's variable schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a classifier name is duplicated, a
    /// declared variable is absent from `schema`, a hyperparameter key is
    /// unknown or unparsable, or the split policy is degenerate (fraction
    /// outside (0, 1), fewer than two folds).
    pub fn validate(&self, schema: &[String]) -> Result<()> {
        if self.variables.is_empty() {
            return Err(Error::Config("no input variables declared".to_string()));
        }
        for variable in &self.variables {
            if !schema.contains(variable) {
                return Err(Error::Config(format!(
                    "variable '{variable}' is not in the dataset schema [{}]",
                    schema.join(":")
                )));
            }
        }

        if self.classifiers.is_empty() {
            return Err(Error::Config("no classifiers booked".to_string()));
        }
        let mut seen = HashSet::new();
        for spec in &self.classifiers {
            if !seen.insert(spec.name()) {
                return Err(Error::Config(format!(
                    "duplicate classifier name '{}'",
                    spec.name()
                )));
            }
            // Parse the typed parameter set to reject bad keys/values early.
            match spec.kind() {
                ClassifierKind::BoostedTree => {
                    BdtParams::from_options(spec.name(), spec.options()).map(|_| ())?;
                }
                ClassifierKind::NeuralNet => {
                    MlpParams::from_options(spec.name(), spec.options()).map(|_| ())?;
                }
            }
        }

        match self.split {
            SplitPolicy::Random { train_fraction, .. } => {
                if !(train_fraction > 0.0 && train_fraction < 1.0) {
                    return Err(Error::Config(format!(
                        "train fraction must lie in (0, 1), got {train_fraction}"
                    )));
                }
            }
            SplitPolicy::KFold { folds, .. } => {
                if folds < 2 {
                    return Err(Error::Config(format!(
                        "cross-validation needs at least 2 folds, got {folds}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// The study's standard BDT booking (850 trees, depth 3, shrinkage 0.5,
/// half-sample bagging).
fn default_bdt(name: &str) -> ClassifierSpec {
    ClassifierSpec::new(ClassifierKind::BoostedTree, name)
        .with_option("NTrees", "850")
        .with_option("MaxDepth", "3")
        .with_option("Shrinkage", "0.5")
        .with_option("BaggedSampleFraction", "0.5")
}

/// The study's standard MLP booking (tanh neurons, normalized inputs,
/// hidden layers N+1,N for N = 3 variables, 600 cycles).
fn default_mlp(name: &str) -> ClassifierSpec {
    ClassifierSpec::new(ClassifierKind::NeuralNet, name)
        .with_option("HiddenLayers", "4,3")
        .with_option("NCycles", "600")
        .with_option("LearningRate", "0.01")
}

/// Typed boosted-tree hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BdtParams {
    /// Number of boosting iterations
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: u32,
    /// Learning rate applied to each tree's contribution
    pub shrinkage: f64,
    /// Fraction of the training sample drawn per tree (bagging)
    pub bagged_sample_fraction: f64,
    /// Minimum number of events in a leaf
    pub min_leaf_size: usize,
}

impl Default for BdtParams {
    fn default() -> Self {
        Self {
            n_trees: 850,
            max_depth: 3,
            shrinkage: 0.5,
            bagged_sample_fraction: 0.5,
            min_leaf_size: 1,
        }
    }
}

impl BdtParams {
    /// Parse a spec's option map, rejecting unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an unknown key or an unparsable value.
    pub fn from_options(name: &str, options: &BTreeMap<String, String>) -> Result<Self> {
        let mut params = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "NTrees" => params.n_trees = parse_option(name, key, value)?,
                "MaxDepth" => params.max_depth = parse_option(name, key, value)?,
                "Shrinkage" => params.shrinkage = parse_option(name, key, value)?,
                "BaggedSampleFraction" => {
                    params.bagged_sample_fraction = parse_option(name, key, value)?;
                }
                "MinLeafSize" => params.min_leaf_size = parse_option(name, key, value)?,
                _ => return Err(unknown_key(name, key)),
            }
        }
        Ok(params)
    }
}

/// Typed neural-network hyperparameters.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParams {
    /// Hidden layer sizes, in order
    pub hidden_layers: Vec<usize>,
    /// Number of training cycles over the sample
    pub n_cycles: usize,
    /// Gradient-descent learning rate
    pub learning_rate: f64,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_layers: vec![4, 3],
            n_cycles: 600,
            learning_rate: 0.01,
        }
    }
}

impl MlpParams {
    /// Parse a spec's option map, rejecting unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an unknown key or an unparsable value.
    pub fn from_options(name: &str, options: &BTreeMap<String, String>) -> Result<Self> {
        let mut params = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "HiddenLayers" => {
                    params.hidden_layers = value
                        .split(',')
                        .map(|layer| parse_option(name, key, layer.trim()))
                        .collect::<Result<_>>()?;
                    if params.hidden_layers.is_empty() {
                        return Err(Error::Config(format!(
                            "classifier '{name}': HiddenLayers must name at least one layer"
                        )));
                    }
                }
                "NCycles" => params.n_cycles = parse_option(name, key, value)?,
                "LearningRate" => params.learning_rate = parse_option(name, key, value)?,
                _ => return Err(unknown_key(name, key)),
            }
        }
        Ok(params)
    }
}

fn parse_option<T: std::str::FromStr>(name: &str, key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        Error::Config(format!(
            "classifier '{name}': invalid value '{value}' for option '{key}'"
        ))
    })
}

fn unknown_key(name: &str, key: &str) -> Error {
    Error::Config(format!("classifier '{name}': unknown option '{key}'"))
}
