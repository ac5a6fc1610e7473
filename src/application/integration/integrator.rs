//! Joins contract records with pre-signing season data into training examples.

use crate::application::integration::name_matching::{NameMatch, NameMatcher};
use crate::application::integration::windowing::{WindowAggregate, aggregate_window, trailing_window};
use crate::domain::errors::IntegrationError;
use crate::domain::ml::{BatterFeatures, PitcherFeatures, SegmentFeatures, ValuationContext};
use crate::domain::player::{Position, PositionGroup, Segment};
use crate::domain::records::{ContractRecord, SeasonRecord};
use crate::domain::valuation::{MatchKind, TrainingExample, UnmatchReason, UnmatchedContract};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Result of one integration pass. Nothing is dropped: every contract ends
/// up in exactly one of the two lists.
#[derive(Debug, Clone, Default)]
pub struct IntegrationOutput {
    pub examples: Vec<TrainingExample>,
    pub unmatched: Vec<UnmatchedContract>,
}

impl IntegrationOutput {
    pub fn match_counts(&self) -> BTreeMap<MatchKind, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.match_kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn unmatched_counts(&self) -> BTreeMap<UnmatchReason, usize> {
        let mut counts = BTreeMap::new();
        for u in &self.unmatched {
            *counts.entry(u.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn examples_for(&self, segment: Segment) -> Vec<&TrainingExample> {
        self.examples
            .iter()
            .filter(|e| e.segment() == segment)
            .collect()
    }
}

pub struct DatasetIntegrator {
    min_examples: usize,
}

impl DatasetIntegrator {
    pub fn new(min_examples: usize) -> Self {
        Self { min_examples }
    }

    pub fn integrate(
        &self,
        seasons_by_player: &BTreeMap<String, Vec<SeasonRecord>>,
        contracts: &[ContractRecord],
    ) -> IntegrationOutput {
        let matcher = NameMatcher::new(seasons_by_player.keys().map(String::as_str));

        // Order-preserving parallel map keeps the output deterministic.
        let results: Vec<Result<TrainingExample, UnmatchedContract>> = contracts
            .par_iter()
            .map(|c| integrate_contract(c, seasons_by_player, &matcher))
            .collect();

        let mut output = IntegrationOutput::default();
        for result in results {
            match result {
                Ok(example) => output.examples.push(example),
                Err(unmatched) => {
                    debug!(
                        "Unmatched contract {} ({}): {}",
                        unmatched.contract.player_name, unmatched.reason, unmatched.detail
                    );
                    output.unmatched.push(unmatched);
                }
            }
        }

        info!(
            "Integrated {} contracts: {} examples ({} batters, {} pitchers), {} unmatched",
            contracts.len(),
            output.examples.len(),
            output.examples_for(Segment::Batter).len(),
            output.examples_for(Segment::Pitcher).len(),
            output.unmatched.len()
        );
        for (kind, count) in output.match_counts() {
            info!("  match strategy {}: {}", kind, count);
        }
        for (reason, count) in output.unmatched_counts() {
            warn!("  unmatched {}: {}", reason, count);
        }

        output
    }

    /// Examples for one segment, refusing degenerate datasets.
    pub fn segment_dataset(
        &self,
        output: &IntegrationOutput,
        segment: Segment,
    ) -> Result<Vec<TrainingExample>, IntegrationError> {
        let examples: Vec<TrainingExample> = output
            .examples_for(segment)
            .into_iter()
            .cloned()
            .collect();
        if examples.len() < self.min_examples {
            return Err(IntegrationError::InsufficientData {
                segment,
                found: examples.len(),
                required: self.min_examples,
            });
        }
        Ok(examples)
    }
}

fn unmatched(contract: &ContractRecord, reason: UnmatchReason, detail: String) -> UnmatchedContract {
    UnmatchedContract {
        contract: contract.clone(),
        reason,
        detail,
    }
}

fn integrate_contract(
    contract: &ContractRecord,
    seasons_by_player: &BTreeMap<String, Vec<SeasonRecord>>,
    matcher: &NameMatcher,
) -> Result<TrainingExample, UnmatchedContract> {
    let position = Position::from_contract_code(&contract.position);

    let aav_millions = contract
        .aav_millions()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            unmatched(
                contract,
                UnmatchReason::InvalidTarget,
                format!("non-positive AAV {}", contract.aav),
            )
        })?;
    if contract.length == 0 {
        return Err(unmatched(
            contract,
            UnmatchReason::InvalidTarget,
            "zero-year length".to_string(),
        ));
    }

    let segment = position.segment();
    let years = trailing_window(contract.year_signed);
    let has_window_seasons = |name: &str| {
        seasons_by_player.get(name).is_some_and(|records| {
            records
                .iter()
                .any(|r| r.segment() == segment && years.contains(&r.season))
        })
    };

    let NameMatch { player, kind } = matcher
        .resolve(&contract.player_name, has_window_seasons)
        .ok_or_else(|| {
            if matcher.knows(&contract.player_name) {
                unmatched(
                    contract,
                    UnmatchReason::NoSeasonsInWindow,
                    format!(
                        "no {} seasons in {}..={}",
                        segment,
                        years.start(),
                        years.end()
                    ),
                )
            } else {
                unmatched(
                    contract,
                    UnmatchReason::NoNameMatch,
                    "no season-data player resolves to this name".to_string(),
                )
            }
        })?;

    let records = seasons_by_player
        .get(&player)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let no_seasons = || {
        unmatched(
            contract,
            UnmatchReason::NoSeasonsInWindow,
            format!("matched {} but the window is empty", player),
        )
    };

    let (features, seasons_used) = match segment {
        Segment::Batter => {
            let WindowAggregate { metrics, seasons } =
                aggregate_window(records, years.clone(), SeasonRecord::batting)
                    .ok_or_else(no_seasons)?;
            let context = context_for(contract, &seasons);
            let features = SegmentFeatures::Batter(BatterFeatures {
                context,
                group: position.group(),
                metrics,
            });
            (features, seasons)
        }
        Segment::Pitcher => {
            let WindowAggregate { metrics, seasons } =
                aggregate_window(records, years.clone(), SeasonRecord::pitching)
                    .ok_or_else(no_seasons)?;
            let context = context_for(contract, &seasons);
            let features = SegmentFeatures::Pitcher(PitcherFeatures {
                context,
                is_starter: position.group() == PositionGroup::StartingPitcher,
                metrics,
            });
            (features, seasons)
        }
    };

    let total_value_millions = contract
        .total_value_millions()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(aav_millions * f64::from(contract.length));

    Ok(TrainingExample {
        player_name: contract.player_name.clone(),
        matched_name: player,
        match_kind: kind,
        position,
        year_signed: contract.year_signed,
        age_at_signing: contract.age_at_signing,
        aav_millions,
        length_years: contract.length,
        total_value_millions,
        is_extension: contract.likely_extension(),
        seasons_used,
        features,
    })
}

fn context_for(contract: &ContractRecord, seasons: &[i32]) -> ValuationContext {
    ValuationContext {
        age: contract.age_at_signing,
        year_signed: Some(contract.year_signed),
        seasons_with_data: Some(seasons.len() as u32),
    }
}
