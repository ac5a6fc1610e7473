use anyhow::{Result, bail};
use clap::Parser;
use contract_advisor::application::integration::DatasetIntegrator;
use contract_advisor::config::Config;
use contract_advisor::domain::player::Segment;
use contract_advisor::infrastructure::logging::init_tracing;
use contract_advisor::infrastructure::{DatasetStore, load_contracts, load_seasons};
use std::path::PathBuf;
use tracing::{error, info};

/// Joins season statistics with signed contracts into the training dataset.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Season CSV (defaults to <data dir>/seasons.csv)
    #[arg(long)]
    seasons: Option<PathBuf>,

    /// Contract CSV (defaults to <data dir>/contracts.csv)
    #[arg(long)]
    contracts: Option<PathBuf>,

    /// Minimum examples per segment before the dataset is accepted
    #[arg(long)]
    min_examples: Option<usize>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env()?;

    let seasons_path = args.seasons.unwrap_or_else(|| config.paths.seasons_csv());
    let contracts_path = args
        .contracts
        .unwrap_or_else(|| config.paths.contracts_csv());
    let min_examples = args.min_examples.unwrap_or(config.training.min_examples);

    info!(
        "Contract Advisor integration {} starting",
        env!("CARGO_PKG_VERSION")
    );
    let seasons = load_seasons(&seasons_path)?;
    let contracts = load_contracts(&contracts_path)?;

    let integrator = DatasetIntegrator::new(min_examples);
    let output = integrator.integrate(&seasons, &contracts);

    let store = DatasetStore::from_paths(&config.paths);
    store.save_examples(&output.examples)?;
    store.save_unmatched(&output.unmatched)?;

    let mut short = Vec::new();
    for segment in Segment::ALL {
        match integrator.segment_dataset(&output, segment) {
            Ok(examples) => info!("{} dataset ready: {} examples", segment, examples.len()),
            Err(e) => {
                error!("{}", e);
                short.push(segment);
            }
        }
    }
    if !short.is_empty() {
        bail!(
            "Dataset is too small for: {}",
            short
                .iter()
                .map(Segment::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}
