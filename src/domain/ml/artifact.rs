use crate::domain::ml::feature_registry::{FeatureVector, feature_names};
use crate::domain::ml::gbdt::GradientBoostedRegressor;
use crate::domain::ml::scaler::StandardScaler;
use crate::domain::player::Segment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Bumped whenever the bundle layout or a feature list changes.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Average annual value, in millions of dollars.
    Aav,
    /// Contract length, in years.
    Length,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Aav, Target::Length];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Aav => "aav",
            Target::Length => "length",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aav" => Ok(Target::Aav),
            "length" => Ok(Target::Length),
            _ => anyhow::bail!("Invalid target: {}. Must be 'aav' or 'length'", s),
        }
    }
}

/// Held-out accuracy of one (segment, target) model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    /// Fraction of test predictions within `tolerance` of the truth.
    pub within_tolerance: f64,
    pub tolerance: f64,
    pub train_size: usize,
    pub validation_size: usize,
    pub test_size: usize,
    pub train_years: Vec<i32>,
    pub validation_year: i32,
    pub test_years: Vec<i32>,
    pub boosting_rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub version: Uuid,
    pub trained_at: DateTime<Utc>,
    pub segment: Segment,
    pub target: Target,
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub regressor: GradientBoostedRegressor,
    pub metrics: EvaluationMetrics,
}

impl ModelArtifact {
    /// File stem used by the artifact store, e.g. `batter_aav`.
    pub fn key(segment: Segment, target: Target) -> String {
        format!("{}_{}", segment, target)
    }

    /// Checks that the bundle was produced for the current feature layout.
    pub fn check_schema(&self) -> Result<(), String> {
        if self.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(format!(
                "{} has schema version {}, expected {}",
                Self::key(self.segment, self.target),
                self.schema_version,
                ARTIFACT_SCHEMA_VERSION
            ));
        }
        if self.feature_names != feature_names(self.segment) {
            return Err(format!(
                "{} feature list does not match the {} schema",
                Self::key(self.segment, self.target),
                self.segment
            ));
        }
        let width = self.feature_names.len();
        if self.scaler.width() != width || self.regressor.n_features != width {
            return Err(format!(
                "{} scaler or regressor width differs from {} features",
                Self::key(self.segment, self.target),
                width
            ));
        }
        Ok(())
    }

    /// Raw (unscaled) vector in, model output out.
    pub fn predict(&self, raw: &FeatureVector) -> f64 {
        self.regressor.predict(&self.scaler.transform(raw))
    }

    /// Features ranked by normalized global importance, highest first.
    pub fn ranked_importances(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(self.regressor.feature_importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
