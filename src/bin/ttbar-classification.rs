//! Default classification pipeline: load the dataset container, train the
//! booked BDT and MLP on a stratified random split, write scores and ROC
//! curves to the result container.
//!
//! Run with: `cargo run --bin ttbar-classification`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use ttbar_mva::config::ExperimentConfig;
use ttbar_mva::runner::TrainingRunner;
use ttbar_mva::sample;
use ttbar_mva::store::DatasetStore;

const APP_NAME: &str = "ttbarClassification";
const CONTAINER_FILE: &str = "ttbar_analysis.parquet";
const OUTPUT_FILE: &str = "ttbar_mva.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(app = APP_NAME, input = CONTAINER_FILE, "start");
    let variables = sample::default_variables();
    let bundle = DatasetStore::load(CONTAINER_FILE, &variables)?;

    let config = ExperimentConfig::default_classification();
    let results = TrainingRunner::new(APP_NAME).run(&bundle, &config, OUTPUT_FILE)?;

    for result in &results {
        println!("{}: AUC = {:.4}", result.classifier, result.auc);
    }
    tracing::info!(app = APP_NAME, output = OUTPUT_FILE, "done");
    Ok(())
}
