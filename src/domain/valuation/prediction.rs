use crate::domain::player::{Position, Segment};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub low: f64,
    pub point: f64,
    pub high: f64,
}

/// One forward pass: AAV (millions) and length (years) with confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub aav: ValueRange,
    pub length: ValueRange,
    pub length_years: u32,
    /// 0 to 100.
    pub confidence: f64,
    pub missing_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableEntry {
    pub player_name: String,
    pub position: Position,
    pub year_signed: i32,
    pub age_at_signing: u32,
    pub aav_millions: f64,
    pub length_years: u32,
    pub war: Option<f64>,
    pub similarity_score: f64,
    pub is_extension: bool,
    /// Admitted only after the similarity floor was relaxed.
    pub below_default_floor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    pub feature: String,
    pub label: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracy {
    pub aav_mae: f64,
    pub aav_r2: f64,
    pub aav_within_5m: f64,
    pub length_mae: f64,
    pub length_r2: f64,
    pub length_within_mae: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub player_name: Option<String>,
    pub segment: Segment,
    pub position: Position,
    pub at_signing: Estimate,
    pub recent: Option<Estimate>,
    pub comparables: Vec<ComparableEntry>,
    pub recent_comparables: Vec<ComparableEntry>,
    /// Similarity floor that produced `comparables`.
    pub comparable_floor: f64,
    pub attributions: Vec<FeatureAttribution>,
    pub accuracy: ModelAccuracy,
    pub model_version: Uuid,
}

impl PredictionResult {
    pub fn extension_comparables(&self) -> usize {
        self.comparables.iter().filter(|c| c.is_extension).count()
    }
}

/// Per-role results for a player valued as both batter and pitcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoWayPrediction {
    pub batting: PredictionResult,
    pub pitching: PredictionResult,
    /// Sum of the two role AAV point estimates.
    pub combined_aav: f64,
    pub combined_recent_aav: Option<f64>,
}

impl TwoWayPrediction {
    pub fn new(batting: PredictionResult, pitching: PredictionResult) -> Self {
        let combined_aav = batting.at_signing.aav.point + pitching.at_signing.aav.point;
        let combined_recent_aav = match (&batting.recent, &pitching.recent) {
            (Some(b), Some(p)) => Some(b.aav.point + p.aav.point),
            _ => None,
        };
        Self {
            batting,
            pitching,
            combined_aav,
            combined_recent_aav,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Valuation {
    Single(PredictionResult),
    TwoWay(TwoWayPrediction),
}
