//! Default cross-validation pipeline: two stratified folds over the dataset
//! container, fold-averaged ROC curve per classifier.
//!
//! Run with: `cargo run --bin ttbar-cross-validation`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use ttbar_mva::config::ExperimentConfig;
use ttbar_mva::runner::CrossValidationRunner;
use ttbar_mva::sample;
use ttbar_mva::store::DatasetStore;

const APP_NAME: &str = "ttbarCrossValidation";
const CONTAINER_FILE: &str = "ttbar_analysis.parquet";
const OUTPUT_FILE: &str = "ttbar_mva_cv.json";
const NUM_FOLDS: usize = 2;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(app = APP_NAME, input = CONTAINER_FILE, folds = NUM_FOLDS, "start");
    let variables = sample::default_variables();
    let bundle = DatasetStore::load(CONTAINER_FILE, &variables)?;

    let config = ExperimentConfig::default_cross_validation();
    let averaged =
        CrossValidationRunner::new(APP_NAME).run(&bundle, &config, NUM_FOLDS, OUTPUT_FILE)?;

    for (classifier, curve) in &averaged {
        println!("avg ROC for {classifier}: AUC = {:.4}", curve.auc());
    }
    tracing::info!(app = APP_NAME, output = OUTPUT_FILE, "done");
    Ok(())
}
