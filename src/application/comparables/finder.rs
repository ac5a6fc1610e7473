//! Weighted multi-factor similarity search over historical contracts.
//!
//! Score = 100 x (0.40 position + 0.35 performance + 0.15 age + 0.10 recency).
//! Performance distance is an RMS over the performance and advanced columns
//! both vectors have, measured in training-scaler units.

use crate::application::integration::normalize_name;
use crate::config::ServingEnvConfig;
use crate::domain::ml::feature_registry::find_spec;
use crate::domain::ml::{FeatureVector, ModelArtifact, SegmentFeatures};
use crate::domain::player::PositionGroup;
use crate::domain::valuation::{ComparableEntry, TrainingExample};
use std::cmp::Ordering;

const POSITION_WEIGHT: f64 = 0.40;
const PERFORMANCE_WEIGHT: f64 = 0.35;
const AGE_WEIGHT: f64 = 0.15;
const RECENCY_WEIGHT: f64 = 0.10;
const AGE_SCALE_YEARS: f64 = 10.0;
const RECENCY_SCALE_YEARS: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ComparableSearch {
    pub entries: Vec<ComparableEntry>,
    /// Floor that was finally applied (lower than the default when relaxed).
    pub applied_floor: f64,
}

#[derive(Debug, Clone)]
pub struct ComparableFinder {
    top_n: usize,
    default_floor: f64,
    floor_step: f64,
    min_entries: usize,
}

impl ComparableFinder {
    pub fn new(top_n: usize, default_floor: f64, floor_step: f64, min_entries: usize) -> Self {
        Self {
            top_n,
            default_floor,
            floor_step: if floor_step > 0.0 { floor_step } else { 10.0 },
            min_entries,
        }
    }

    pub fn from_config(config: &ServingEnvConfig) -> Self {
        Self::new(
            config.top_comparables,
            config.similarity_floor,
            config.floor_step,
            config.min_comparables,
        )
    }

    /// Ranks `pool` against `query`. The queried player's own contracts are
    /// left out when `exclude_player` names them.
    pub fn find(
        &self,
        query: &SegmentFeatures,
        pool: &[TrainingExample],
        artifact: &ModelArtifact,
        reference_year: i32,
        exclude_player: Option<&str>,
    ) -> ComparableSearch {
        let excluded = exclude_player.map(normalize_name);
        let perf_columns: Vec<usize> = artifact
            .feature_names
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                find_spec(artifact.segment, name).is_some_and(|s| s.kind.is_performance())
            })
            .map(|(i, _)| i)
            .collect();

        let query_scaled = artifact.scaler.transform(&query.to_vector(&artifact.feature_names));
        let query_group = query_group(query);
        let query_age = f64::from(query.context().age);
        let query_year = query.context().year_signed.unwrap_or(reference_year);

        let mut scored: Vec<(f64, &TrainingExample)> = pool
            .iter()
            .filter(|e| e.segment() == query.segment())
            .filter(|e| {
                excluded
                    .as_ref()
                    .is_none_or(|name| normalize_name(&e.player_name) != *name)
            })
            .map(|e| {
                let candidate = artifact
                    .scaler
                    .transform(&e.features.to_vector(&artifact.feature_names));
                let score = similarity_score(
                    query_group == e.position.group(),
                    performance_distance(&query_scaled, &candidate, &perf_columns),
                    (query_age - f64::from(e.age_at_signing)).abs(),
                    f64::from((query_year - e.year_signed).abs()),
                );
                (score, e)
            })
            .collect();

        scored.sort_by(|a, b| compare_ranked(a, b));

        let mut floor = self.default_floor;
        loop {
            let qualifying = scored.iter().filter(|(s, _)| *s >= floor).count();
            if qualifying >= self.min_entries || floor <= 0.0 {
                break;
            }
            floor = (floor - self.floor_step).max(0.0);
        }

        let take = self.top_n.max(self.min_entries);
        let entries = scored
            .iter()
            .filter(|(s, _)| *s >= floor)
            .take(take)
            .map(|(score, e)| ComparableEntry {
                player_name: e.player_name.clone(),
                position: e.position,
                year_signed: e.year_signed,
                age_at_signing: e.age_at_signing,
                aav_millions: e.aav_millions,
                length_years: e.length_years,
                war: e.war(),
                similarity_score: *score,
                is_extension: e.is_extension,
                below_default_floor: *score < self.default_floor,
            })
            .collect();

        ComparableSearch {
            entries,
            applied_floor: floor,
        }
    }
}

fn query_group(query: &SegmentFeatures) -> PositionGroup {
    match query {
        SegmentFeatures::Batter(b) => b.group,
        SegmentFeatures::Pitcher(p) if p.is_starter => PositionGroup::StartingPitcher,
        SegmentFeatures::Pitcher(_) => PositionGroup::ReliefPitcher,
    }
}

/// RMS difference over columns present in both vectors, or `None` when
/// they share no performance column.
pub fn performance_distance(a: &FeatureVector, b: &FeatureVector, columns: &[usize]) -> Option<f64> {
    let diffs: Vec<f64> = columns
        .iter()
        .filter_map(|&c| Some(a.get(c)? - b.get(c)?))
        .filter(|d| d.is_finite())
        .collect();
    if diffs.is_empty() {
        return None;
    }
    Some((diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt())
}

/// Combines the four sub-scores into a 0..=100 similarity.
pub fn similarity_score(
    same_group: bool,
    distance: Option<f64>,
    age_gap: f64,
    year_gap: f64,
) -> f64 {
    let position = if same_group { 1.0 } else { 0.0 };
    let performance = distance.map(|d| 1.0 / (1.0 + d)).unwrap_or(0.0);
    let age = (1.0 - age_gap / AGE_SCALE_YEARS).max(0.0);
    let recency = (1.0 - year_gap / RECENCY_SCALE_YEARS).max(0.0);

    let raw = 100.0
        * (POSITION_WEIGHT * position
            + PERFORMANCE_WEIGHT * performance
            + AGE_WEIGHT * age
            + RECENCY_WEIGHT * recency);
    (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// Score descending, then more recent signing, then name.
fn compare_ranked(a: &(f64, &TrainingExample), b: &(f64, &TrainingExample)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| b.1.year_signed.cmp(&a.1.year_signed))
        .then_with(|| a.1.player_name.cmp(&b.1.player_name))
}
