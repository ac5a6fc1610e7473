use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use contract_advisor::application::assessment::AssessmentNarrator;
use contract_advisor::application::inference::{ArtifactRegistry, InferenceEngine};
use contract_advisor::application::integration::normalize_name;
use contract_advisor::application::integration::query_assembler::{at_signing_query, seasons_for};
use contract_advisor::config::Config;
use contract_advisor::domain::valuation::{
    ActualContract, Assessment, PredictionQuery, Valuation,
};
use contract_advisor::infrastructure::logging::init_tracing;
use contract_advisor::infrastructure::{ArtifactStore, DatasetStore, load_contracts, load_seasons};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{error, info};

/// Values a player's contract and explains the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON prediction query file, or `-` for stdin
    #[arg(long, conflicts_with = "player")]
    query: Option<PathBuf>,

    /// Value a player from the dataset by name (uses their latest contract)
    #[arg(long)]
    player: Option<String>,

    /// With --player, pick the contract signed in this year
    #[arg(long, requires = "player")]
    year: Option<i32>,

    /// Signed AAV in millions to judge against the valuation
    #[arg(long)]
    actual_aav: Option<f64>,

    /// Signed length in years
    #[arg(long, requires = "actual_aav")]
    actual_length: Option<u32>,

    /// Date anchoring the recent-form timeframe (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Serialize)]
struct Report {
    valuation: Valuation,
    assessment: Assessment,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env()?;

    let artifacts = ArtifactStore::new(config.paths.models_dir.clone()).load_all()?;
    let pool = DatasetStore::from_paths(&config.paths).load_examples()?;
    let registry = ArtifactRegistry::new(artifacts, pool)
        .and_then(ArtifactRegistry::install)
        .context("Failed to load model registry")?;

    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let (query, mut actual) = build_query(&args, &config, today)?;
    if let Some(aav) = args.actual_aav {
        actual = Some(ActualContract {
            aav_millions: aav,
            length_years: args.actual_length,
        });
    }

    let engine = InferenceEngine::new(registry, config.serving.clone());
    let narrator = AssessmentNarrator::from_config(&config.serving);

    let valuation = engine.evaluate(&query).map_err(|e| {
        error!("Valuation failed");
        anyhow!(e.public_message())
    })?;
    let assessment = match &valuation {
        Valuation::Single(p) => narrator.assess(p, actual.as_ref()),
        Valuation::TwoWay(p) => narrator.assess_two_way(p, actual.as_ref()),
    };
    info!("Assessment: {}", assessment.label);

    let report = Report {
        valuation,
        assessment,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}

fn build_query(
    args: &Args,
    config: &Config,
    today: NaiveDate,
) -> Result<(PredictionQuery, Option<ActualContract>)> {
    if let Some(name) = &args.player {
        let seasons = load_seasons(&config.paths.seasons_csv())?;
        let contracts = load_contracts(&config.paths.contracts_csv())?;
        let target = normalize_name(name);
        let contract = contracts
            .iter()
            .filter(|c| normalize_name(&c.player_name) == target)
            .filter(|c| args.year.is_none_or(|y| c.year_signed == y))
            .max_by_key(|c| c.year_signed)
            .ok_or_else(|| anyhow!("No contract found for {}", name))?;

        info!(
            "Valuing {} ({} contract, {})",
            contract.player_name, contract.year_signed, contract.position
        );
        let query = at_signing_query(
            contract,
            seasons_for(&seasons, &contract.player_name),
            Some(today),
        );
        return Ok((query, ActualContract::from_record(contract)));
    }

    let content = match &args.query {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {:?}", path))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read query from stdin")?;
            buf
        }
    };
    let query: PredictionQuery =
        serde_json::from_str(&content).context("Failed to parse prediction query JSON")?;
    if query.signing_year.is_none() {
        info!(
            "No signing year given, assuming {}",
            config.serving.reference_year
        );
    }
    Ok((
        query.with_default_signing_year(config.serving.reference_year),
        None,
    ))
}
