//! Serving-side tunables: comparable search, confidence and narration.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::env;

#[derive(Debug, Clone)]
pub struct ServingEnvConfig {
    // Comparable search
    pub top_comparables: usize,
    pub similarity_floor: f64,
    pub floor_step: f64,
    pub min_comparables: usize,

    // Attribution
    pub top_features: usize,

    // Confidence
    pub confidence_cap: f64,
    pub missing_feature_penalty: f64,
    pub min_confidence: f64,

    // Estimates
    pub min_aav_millions: f64,
    /// Signing year assumed for queries that omit one. Also the comparable
    /// recency anchor when a query reaches the finder without a year.
    pub reference_year: i32,

    // Narration
    pub fairness_band_pct: f64,
    pub low_confidence_threshold: f64,
}

impl Default for ServingEnvConfig {
    fn default() -> Self {
        Self {
            top_comparables: 5,
            similarity_floor: 40.0,
            floor_step: 10.0,
            min_comparables: 3,
            top_features: 5,
            confidence_cap: 95.0,
            missing_feature_penalty: 2.0,
            min_confidence: 10.0,
            min_aav_millions: 0.5,
            reference_year: Utc::now().year(),
            fairness_band_pct: 10.0,
            low_confidence_threshold: 70.0,
        }
    }
}

impl ServingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let config = Self {
            top_comparables: Self::parse("ADVISOR_TOP_COMPARABLES", d.top_comparables)?,
            similarity_floor: Self::parse("ADVISOR_SIMILARITY_FLOOR", d.similarity_floor)?,
            floor_step: Self::parse("ADVISOR_FLOOR_STEP", d.floor_step)?,
            min_comparables: Self::parse("ADVISOR_MIN_COMPARABLES", d.min_comparables)?,
            top_features: Self::parse("ADVISOR_TOP_FEATURES", d.top_features)?,
            confidence_cap: Self::parse("ADVISOR_CONFIDENCE_CAP", d.confidence_cap)?,
            missing_feature_penalty: Self::parse(
                "ADVISOR_MISSING_FEATURE_PENALTY",
                d.missing_feature_penalty,
            )?,
            min_confidence: Self::parse("ADVISOR_MIN_CONFIDENCE", d.min_confidence)?,
            min_aav_millions: Self::parse("ADVISOR_MIN_AAV_MILLIONS", d.min_aav_millions)?,
            reference_year: Self::parse("ADVISOR_REFERENCE_YEAR", d.reference_year)?,
            fairness_band_pct: Self::parse("ADVISOR_FAIRNESS_BAND_PCT", d.fairness_band_pct)?,
            low_confidence_threshold: Self::parse(
                "ADVISOR_LOW_CONFIDENCE_THRESHOLD",
                d.low_confidence_threshold,
            )?,
        };

        if config.floor_step <= 0.0 {
            anyhow::bail!("ADVISOR_FLOOR_STEP must be positive, got {}", config.floor_step);
        }
        if config.fairness_band_pct < 0.0 {
            anyhow::bail!(
                "ADVISOR_FAIRNESS_BAND_PCT must not be negative, got {}",
                config.fairness_band_pct
            );
        }
        Ok(config)
    }

    fn parse<T>(key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<T>()
            .context(format!("Failed to parse {}", key))
    }
}
