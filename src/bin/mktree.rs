//! One-time materialization stage: parse `signal.dat` / `background.dat` and
//! recreate the dataset container.
//!
//! Run with: `cargo run --bin mktree`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use ttbar_mva::sample;
use ttbar_mva::store::DatasetStore;

const SIGNAL_FILE: &str = "signal.dat";
const BACKGROUND_FILE: &str = "background.dat";
const CONTAINER_FILE: &str = "ttbar_analysis.parquet";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("start mktree");
    let variables = sample::default_variables();
    let bundle = sample::load_bundle(SIGNAL_FILE, BACKGROUND_FILE, &variables)?;
    DatasetStore::save(&bundle, CONTAINER_FILE)?;
    tracing::info!(container = CONTAINER_FILE, "mktree is done");
    Ok(())
}
