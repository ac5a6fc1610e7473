use crate::application::comparables::ComparableFinder;
use crate::application::inference::registry::ArtifactRegistry;
use crate::config::ServingEnvConfig;
use crate::domain::errors::ServingError;
use crate::domain::ml::feature_registry::find_spec;
use crate::domain::ml::{ModelArtifact, SegmentFeatures, Target};
use crate::domain::player::Segment;
use crate::domain::valuation::{
    Estimate, FeatureAttribution, ModelAccuracy, PredictionQuery, PredictionResult, Role,
    TwoWayPrediction, Valuation, ValueRange,
};
use tracing::warn;

/// Stateless valuation over a loaded registry.
pub struct InferenceEngine<'r> {
    registry: &'r ArtifactRegistry,
    config: ServingEnvConfig,
    finder: ComparableFinder,
}

impl<'r> InferenceEngine<'r> {
    pub fn new(registry: &'r ArtifactRegistry, config: ServingEnvConfig) -> Self {
        let finder = ComparableFinder::from_config(&config);
        Self {
            registry,
            config,
            finder,
        }
    }

    /// Values the query's primary role.
    pub fn predict(&self, query: &PredictionQuery) -> Result<PredictionResult, ServingError> {
        self.checked(query, || {
            query.validate()?;
            self.predict_role(query, query.primary_role()?)
        })
    }

    /// Values both roles of a two-way player; the combined AAV is the sum
    /// of the role estimates, not a separate prediction.
    pub fn predict_two_way(&self, query: &PredictionQuery) -> Result<TwoWayPrediction, ServingError> {
        self.checked(query, || {
            query.validate()?;
            let roles = query.roles()?;
            let find = |segment: Segment| roles.iter().copied().find(|r| r.segment == segment);
            let (Some(batting), Some(pitching)) = (find(Segment::Batter), find(Segment::Pitcher))
            else {
                return Err(ServingError::validation(
                    "secondary_position",
                    "two-way valuation needs one batting and one pitching position",
                ));
            };
            Ok(TwoWayPrediction::new(
                self.predict_role(query, batting)?,
                self.predict_role(query, pitching)?,
            ))
        })
    }

    /// Dispatches to the single or two-way path.
    pub fn evaluate(&self, query: &PredictionQuery) -> Result<Valuation, ServingError> {
        if query.is_two_way()? {
            self.predict_two_way(query).map(Valuation::TwoWay)
        } else {
            self.predict(query).map(Valuation::Single)
        }
    }

    fn checked<T>(
        &self,
        query: &PredictionQuery,
        run: impl FnOnce() -> Result<T, ServingError>,
    ) -> Result<T, ServingError> {
        run().inspect_err(|e| {
            warn!(
                "Rejected valuation for {}: {}",
                query.player_name.as_deref().unwrap_or("<anonymous>"),
                e
            )
        })
    }

    fn predict_role(&self, query: &PredictionQuery, role: Role) -> Result<PredictionResult, ServingError> {
        let aav = self.registry.artifact(role.segment, Target::Aav)?;
        let length = self.registry.artifact(role.segment, Target::Length)?;
        let pool = self.registry.pool(role.segment);
        let exclude = query.player_name.as_deref();

        let features = query.features_for(role)?;
        let at_signing = self.estimate(&features, aav, length);
        let search = self
            .finder
            .find(&features, pool, aav, self.config.reference_year, exclude);

        let recent_features = query.recent_features_for(role);
        let recent = recent_features
            .as_ref()
            .map(|f| self.estimate(f, aav, length));
        let recent_comparables = recent_features
            .as_ref()
            .map(|f| {
                self.finder
                    .find(f, pool, aav, self.config.reference_year, exclude)
                    .entries
            })
            .unwrap_or_default();

        Ok(PredictionResult {
            player_name: query.player_name.clone(),
            segment: role.segment,
            position: role.position,
            at_signing,
            recent,
            comparables: search.entries,
            recent_comparables,
            comparable_floor: search.applied_floor,
            attributions: self.attributions(aav),
            accuracy: ModelAccuracy {
                aav_mae: aav.metrics.mae,
                aav_r2: aav.metrics.r2,
                aav_within_5m: aav.metrics.within_tolerance,
                length_mae: length.metrics.mae,
                length_r2: length.metrics.r2,
                length_within_mae: length.metrics.within_tolerance,
            },
            model_version: aav.version,
        })
    }

    fn estimate(
        &self,
        features: &SegmentFeatures,
        aav: &ModelArtifact,
        length: &ModelArtifact,
    ) -> Estimate {
        let aav_vector = features.to_vector(&aav.feature_names);
        let missing = aav_vector.missing_count();

        let floor = self.config.min_aav_millions;
        let aav_range = bounded_range(aav.predict(&aav_vector), aav.metrics.mae, floor);

        let length_vector = features.to_vector(&length.feature_names);
        let length_range = bounded_range(length.predict(&length_vector), length.metrics.mae, 1.0);

        Estimate {
            aav: aav_range,
            length_years: length_range.point.round().max(1.0) as u32,
            length: length_range,
            confidence: self.confidence(aav.metrics.within_tolerance, missing),
            missing_features: missing,
        }
    }

    /// `min(cap, within x 100) - missing x penalty`, floored. Never rises
    /// with more missing features.
    pub fn confidence(&self, within_tolerance: f64, missing: usize) -> f64 {
        let base = (within_tolerance * 100.0).min(self.config.confidence_cap);
        let base = if base.is_finite() { base } else { 0.0 };
        let discounted = base - missing as f64 * self.config.missing_feature_penalty;
        (discounted.max(self.config.min_confidence) * 10.0).round() / 10.0
    }

    fn attributions(&self, aav: &ModelArtifact) -> Vec<FeatureAttribution> {
        aav.ranked_importances()
            .into_iter()
            .take(self.config.top_features)
            .map(|(name, weight)| FeatureAttribution {
                feature: name.to_string(),
                label: find_spec(aav.segment, name)
                    .map(|s| s.label.to_string())
                    .unwrap_or_else(|| name.to_string()),
                weight,
            })
            .collect()
    }
}

/// Point estimate floored at `floor`, with `point ± mae` bounds that never
/// drop below the floor.
fn bounded_range(raw: f64, mae: f64, floor: f64) -> ValueRange {
    let point = if raw.is_finite() { raw.max(floor) } else { floor };
    let mae = if mae.is_finite() { mae.abs() } else { 0.0 };
    ValueRange {
        low: (point - mae).max(floor),
        point,
        high: point + mae,
    }
}
