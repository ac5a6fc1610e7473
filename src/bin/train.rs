use anyhow::{Context, Result, bail};
use clap::Parser;
use contract_advisor::application::training::ModelTrainer;
use contract_advisor::config::Config;
use contract_advisor::domain::ml::ModelArtifact;
use contract_advisor::infrastructure::logging::init_tracing;
use contract_advisor::infrastructure::{ArtifactStore, DatasetStore};
use std::path::PathBuf;
use tracing::{error, info};

/// Trains the AAV and length models for batters and pitchers.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Integrated dataset (defaults to <data dir>/training_examples.json)
    #[arg(long)]
    examples: Option<PathBuf>,

    /// Output directory for model bundles
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// TOML file overriding boosting hyper-parameters
    #[arg(long)]
    params: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = &args.params {
        config
            .training
            .apply_overrides_file(path)
            .with_context(|| format!("Failed to apply training parameters from {:?}", path))?;
    }

    let dataset = match &args.examples {
        Some(path) => DatasetStore::new(path.clone(), config.paths.unmatched_report()),
        None => DatasetStore::from_paths(&config.paths),
    };
    let examples = dataset.load_examples()?;

    info!(
        "Training with {} estimators, learning rate {}, depth {}, seed {}",
        config.training.boosting.n_estimators,
        config.training.boosting.learning_rate,
        config.training.boosting.max_depth,
        config.training.boosting.seed
    );
    let report = ModelTrainer::new(config.training.clone()).train_all(&examples);

    let store = ArtifactStore::new(
        args.models_dir
            .unwrap_or_else(|| config.paths.models_dir.clone()),
    );
    for artifact in &report.artifacts {
        store.save(artifact)?;
        let top: Vec<String> = artifact
            .ranked_importances()
            .into_iter()
            .take(5)
            .map(|(name, weight)| format!("{} {:.3}", name, weight))
            .collect();
        info!(
            "{}: MAE {:.3}, R² {:.3}, top features [{}]",
            ModelArtifact::key(artifact.segment, artifact.target),
            artifact.metrics.mae,
            artifact.metrics.r2,
            top.join(", ")
        );
    }

    if !report.is_complete() {
        for (segment, target, e) in &report.failures {
            error!("{}: {}", ModelArtifact::key(*segment, *target), e);
        }
        bail!(
            "{} of 4 models failed to train",
            report.failures.len()
        );
    }
    info!("All models trained");
    Ok(())
}
