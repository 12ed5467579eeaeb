//! # ttbar-mva: ttbar signal vs WW+2b background classification
//!
//! Driver library for a classification study over three kinematic variables
//! (`mt2`, `mbl`, `mbbll`). The pipeline has two stages:
//!
//! 1. **Materialize**: parse whitespace-delimited sample files into a
//!    [`sample::DatasetBundle`] and persist it as a Parquet container
//!    ([`store::DatasetStore`]) so raw text is parsed once.
//! 2. **Train/evaluate**: hand the bundle and an [`config::ExperimentConfig`]
//!    to the [`runner::TrainingRunner`] (single stratified train/test split) or
//!    the [`runner::CrossValidationRunner`] (K stratified folds, averaged ROC
//!    curves), which drive the classifier backends in [`models`].
//!
//! Tree boosting and network training are delegated to external crates
//! (`gbdt`, `neuroflow`); this crate only prepares their inputs and persists
//! their outputs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ttbar_mva::config::ExperimentConfig;
//! use ttbar_mva::runner::TrainingRunner;
//! use ttbar_mva::sample;
//! use ttbar_mva::store::DatasetStore;
//!
//! let variables = sample::default_variables();
//! let bundle = DatasetStore::load("ttbar_analysis.parquet", &variables)?;
//! let config = ExperimentConfig::default_classification();
//! let results = TrainingRunner::new("ttbarClassification")
//!     .run(&bundle, &config, "ttbar_mva.json")?;
//! for result in &results {
//!     println!("{}: AUC = {:.3}", result.classifier, result.auc);
//! }
//! # Ok::<(), ttbar_mva::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod eval;
pub mod models;
pub mod runner;
pub mod sample;
pub mod split;
pub mod store;

pub use error::{Error, Result};
