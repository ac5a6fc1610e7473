//! Synthetic contract market shared by the integration tests.
//!
//! Contract value follows a noisy function of trailing WAR so trained
//! models have real signal. Every player also gets seasons on and after
//! the signing year with inflated numbers; none of those may leak into
//! a training example.

#![allow(dead_code)]

use contract_advisor::application::integration::DatasetIntegrator;
use contract_advisor::application::training::ModelTrainer;
use contract_advisor::config::TrainingEnvConfig;
use contract_advisor::domain::ml::{BoostingParams, ModelArtifact};
use contract_advisor::domain::records::{
    BattingMetrics, ContractRecord, PitchingMetrics, SeasonLine, SeasonRecord, millions_to_dollars,
};
use contract_advisor::domain::valuation::{PredictionQuery, TrainingExample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub const FIRST_SIGNING_YEAR: i32 = 2012;
pub const SIGNING_YEARS: i32 = 12;

const BATTER_POSITIONS: [&str; 9] = ["C", "1B", "2B", "3B", "SS", "LF", "CF", "RF", "DH"];
const PITCHER_POSITIONS: [&str; 4] = ["SP", "SP", "RP", "CL"];

pub struct SyntheticMarket {
    pub seasons: BTreeMap<String, Vec<SeasonRecord>>,
    pub contracts: Vec<ContractRecord>,
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

pub fn synthetic_market(batters: usize, pitchers: usize, seed: u64) -> SyntheticMarket {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut market = SyntheticMarket {
        seasons: BTreeMap::new(),
        contracts: Vec::new(),
    };

    for i in 0..batters {
        let name = format!("Hitter{:03} Synth", i);
        let skill: f64 = rng.random_range(0.0..8.0);
        let year_signed = FIRST_SIGNING_YEAR + (i as i32 % SIGNING_YEARS);
        let age = 24 + (i as u32 % 12);
        // Some players only have the two most recent seasons
        let first_season = if i % 5 == 0 { year_signed - 2 } else { year_signed - 3 };

        for season in first_season..=year_signed + 1 {
            let leaked = season >= year_signed;
            let s = if leaked { 20.0 } else { skill + rng.random_range(-0.5..0.5) };
            let metrics = BattingMetrics {
                war: Some(s),
                wrc_plus: Some(80.0 + s * 12.0),
                avg: Some(0.230 + s * 0.007),
                obp: Some(0.300 + s * 0.009),
                slg: Some(0.370 + s * 0.02),
                hr: Some(8.0 + s * 4.0),
                avg_exit_velo: (i % 3 != 0).then_some(87.0 + s * 0.5),
                barrel_rate: (i % 3 != 0).then_some(5.0 + s),
                max_exit_velo: None,
                hard_hit_pct: (i % 4 != 0).then_some(35.0 + s * 2.0),
                chase_rate: Some((35.0 - s * 2.0).clamp(0.0, 100.0)),
                whiff_rate: Some((30.0 - s * 1.5).clamp(0.0, 100.0)),
            };
            push_season(&mut market, &name, season, age, year_signed, SeasonLine::Batting(metrics));
        }

        let aav = (0.8 + 3.4 * skill + rng.random_range(-1.0..1.0)).max(0.6);
        let length = (1.0 + skill / 1.2).round().clamp(1.0, 10.0) as u32;
        push_contract(
            &mut market,
            &name,
            BATTER_POSITIONS[i % BATTER_POSITIONS.len()],
            year_signed,
            age,
            aav,
            length,
            source_extension_flag(i),
        );
    }

    for i in 0..pitchers {
        let name = format!("Thrower{:03} Synth", i);
        let skill: f64 = rng.random_range(0.0..6.0);
        let position = PITCHER_POSITIONS[i % PITCHER_POSITIONS.len()];
        let starter = position == "SP";
        let year_signed = FIRST_SIGNING_YEAR + (i as i32 % SIGNING_YEARS);
        let age = 25 + (i as u32 % 11);

        for season in year_signed - 3..=year_signed + 1 {
            let leaked = season >= year_signed;
            let s = if leaked { 15.0 } else { skill + rng.random_range(-0.4..0.4) };
            let metrics = PitchingMetrics {
                war: Some(s),
                era: Some((5.2 - s * 0.4).max(1.0)),
                fip: Some((5.0 - s * 0.35).max(1.5)),
                k_9: Some(7.0 + s * 0.6),
                bb_9: Some((4.0 - s * 0.25).max(1.0)),
                ip: Some(if starter { 150.0 + s * 8.0 } else { 55.0 + s * 3.0 }),
                fb_velocity: (i % 2 == 0).then_some((40.0 + s * 8.0).clamp(0.0, 100.0)),
                fb_spin: None,
                xera: Some((30.0 + s * 10.0).clamp(0.0, 100.0)),
                k_percent: Some((35.0 + s * 9.0).clamp(0.0, 100.0)),
                bb_percent: Some((50.0 + s * 5.0).clamp(0.0, 100.0)),
                whiff_percent: (i % 3 != 0).then_some((40.0 + s * 8.0).clamp(0.0, 100.0)),
                chase_percent: None,
            };
            push_season(&mut market, &name, season, age, year_signed, SeasonLine::Pitching(metrics));
        }

        let base = if starter { 1.0 } else { 0.6 };
        let aav = (base + 3.6 * skill + rng.random_range(-1.0..1.0)).max(0.6);
        let length = (1.0 + skill / (if starter { 1.0 } else { 2.0 })).round().clamp(1.0, 8.0) as u32;
        push_contract(
            &mut market,
            &name,
            position,
            year_signed,
            age,
            aav,
            length,
            source_extension_flag(i),
        );
    }

    market
}

fn push_season(
    market: &mut SyntheticMarket,
    name: &str,
    season: i32,
    age_at_signing: u32,
    year_signed: i32,
    line: SeasonLine,
) {
    let age = (age_at_signing as i32 - (year_signed - season)).max(18) as u32;
    market
        .seasons
        .entry(name.to_string())
        .or_default()
        .push(SeasonRecord {
            player_name: name.to_string(),
            season,
            age: Some(age),
            team: Some("SYN".to_string()),
            line,
        });
}

/// Explicit source flags on some contracts, left to the age/length
/// heuristic on the rest.
pub fn source_extension_flag(i: usize) -> Option<bool> {
    match i % 6 {
        1 => Some(true),
        2 => Some(false),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn push_contract(
    market: &mut SyntheticMarket,
    name: &str,
    position: &str,
    year_signed: i32,
    age: u32,
    aav_millions: f64,
    length: u32,
    is_extension: Option<bool>,
) {
    let aav = millions_to_dollars(aav_millions).expect("finite AAV");
    market.contracts.push(ContractRecord {
        player_name: name.to_string(),
        position: position.to_string(),
        year_signed,
        age_at_signing: age,
        aav,
        length,
        total_value: aav * rust_decimal::Decimal::from(length),
        is_extension,
    });
}

/// Fast hyper-parameters for tests.
pub fn test_training_config() -> TrainingEnvConfig {
    TrainingEnvConfig {
        boosting: BoostingParams {
            n_estimators: 80,
            learning_rate: 0.1,
            max_depth: 3,
            early_stopping_rounds: 15,
            ..BoostingParams::default()
        },
        ..TrainingEnvConfig::default()
    }
}

pub struct TrainedMarket {
    pub market: SyntheticMarket,
    pub examples: Vec<TrainingExample>,
    pub artifacts: Vec<ModelArtifact>,
}

/// Integrates and trains a full market with every pair succeeding.
pub fn trained_market(seed: u64) -> TrainedMarket {
    let market = synthetic_market(150, 100, seed);
    let output = DatasetIntegrator::new(20).integrate(&market.seasons, &market.contracts);
    let report = ModelTrainer::new(test_training_config()).train_all(&output.examples);
    assert!(report.is_complete(), "training failures: {:?}", report.failures);
    TrainedMarket {
        market,
        examples: output.examples,
        artifacts: report.artifacts,
    }
}

/// Corey Seager-type shortstop entering free agency.
pub fn seager_query() -> PredictionQuery {
    PredictionQuery {
        player_name: Some("Corey Seager".to_string()),
        position: "SS".to_string(),
        secondary_position: None,
        age: 27,
        signing_year: Some(2022),
        seasons_with_data: Some(3),
        batting: Some(BattingMetrics {
            war: Some(4.5),
            wrc_plus: Some(130.0),
            ..BattingMetrics::default()
        }),
        pitching: None,
        recent: None,
    }
}

pub fn two_way_query() -> PredictionQuery {
    PredictionQuery {
        player_name: Some("Two Way Synth".to_string()),
        position: "DH".to_string(),
        secondary_position: Some("SP".to_string()),
        age: 29,
        signing_year: Some(2023),
        seasons_with_data: Some(3),
        batting: Some(BattingMetrics {
            war: Some(5.0),
            wrc_plus: Some(150.0),
            avg: Some(0.270),
            hr: Some(40.0),
            ..BattingMetrics::default()
        }),
        pitching: Some(PitchingMetrics {
            war: Some(3.5),
            era: Some(3.0),
            fip: Some(3.2),
            k_9: Some(11.0),
            ip: Some(130.0),
            ..PitchingMetrics::default()
        }),
        recent: None,
    }
}
