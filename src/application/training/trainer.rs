use crate::application::training::metrics::{regression_scores, within_tolerance};
use crate::application::training::split::temporal_split;
use crate::config::TrainingEnvConfig;
use crate::domain::errors::TrainingError;
use crate::domain::ml::feature_registry::{feature_names, feature_specs};
use crate::domain::ml::{
    ARTIFACT_SCHEMA_VERSION, EvaluationMetrics, FeatureVector, GradientBoostedRegressor,
    ModelArtifact, StandardScaler, Target,
};
use crate::domain::player::Segment;
use crate::domain::valuation::TrainingExample;
use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome of training every (segment, target) pair.
#[derive(Debug, Default)]
pub struct TrainingReport {
    pub artifacts: Vec<ModelArtifact>,
    pub failures: Vec<(Segment, Target, TrainingError)>,
}

impl TrainingReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.artifacts.len() == Segment::ALL.len() * Target::ALL.len()
    }
}

pub struct ModelTrainer {
    config: TrainingEnvConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingEnvConfig) -> Self {
        Self { config }
    }

    /// Trains the four pairs independently. A failing pair is reported and
    /// does not affect the others.
    pub fn train_all(&self, examples: &[TrainingExample]) -> TrainingReport {
        let pairs: Vec<(Segment, Target)> = Segment::ALL
            .iter()
            .flat_map(|s| Target::ALL.iter().map(move |t| (*s, *t)))
            .collect();

        let results: Vec<(Segment, Target, Result<ModelArtifact, TrainingError>)> = pairs
            .par_iter()
            .map(|&(segment, target)| (segment, target, self.train(segment, target, examples)))
            .collect();

        let mut report = TrainingReport::default();
        for (segment, target, result) in results {
            match result {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(e) => {
                    warn!("Training {}_{} failed: {}", segment, target, e);
                    report.failures.push((segment, target, e));
                }
            }
        }
        report
    }

    pub fn train(
        &self,
        segment: Segment,
        target: Target,
        examples: &[TrainingExample],
    ) -> Result<ModelArtifact, TrainingError> {
        let examples: Vec<&TrainingExample> = examples
            .iter()
            .filter(|e| e.segment() == segment && e.target(target).is_finite())
            .collect();

        if examples.len() < self.config.min_examples {
            return Err(TrainingError::InsufficientData {
                segment,
                target,
                found: examples.len(),
                required: self.config.min_examples,
            });
        }

        let names = feature_names(segment);
        let width = names.len();
        for (col, spec) in feature_specs(segment).iter().enumerate() {
            if spec.required
                && examples
                    .iter()
                    .all(|e| e.features.value(spec.name).is_none())
            {
                return Err(TrainingError::MissingFeatureColumn {
                    segment,
                    feature: names[col].clone(),
                });
            }
        }

        let split = temporal_split(segment, &examples, self.config.test_fraction)?;

        let raw = |slice: &[&TrainingExample]| -> Vec<FeatureVector> {
            slice.iter().map(|e| e.features.to_vector(&names)).collect()
        };
        let targets = |slice: &[&TrainingExample]| -> Vec<f64> {
            slice.iter().map(|e| e.target(target)).collect()
        };

        let train_raw = raw(&split.train);
        let scaler = StandardScaler::fit(&train_raw, width);
        let scale = |rows: Vec<FeatureVector>| -> Vec<FeatureVector> {
            rows.iter().map(|r| scaler.transform(r)).collect()
        };

        let train_x = scale(train_raw);
        let valid_x = scale(raw(&split.validation));
        let test_x = scale(raw(&split.test));
        let train_y = targets(&split.train);
        let valid_y = targets(&split.validation);
        let test_y = targets(&split.test);

        let regressor = GradientBoostedRegressor::fit(
            &train_x,
            &train_y,
            Some((&valid_x, &valid_y)),
            width,
            &self.config.boosting,
        );

        let predictions: Vec<f64> = test_x.iter().map(|r| regressor.predict(r)).collect();
        let scores = regression_scores(&predictions, &test_y);
        let tolerance = match target {
            Target::Aav => self.config.aav_tolerance_millions,
            Target::Length => scores.mae,
        };
        let within = within_tolerance(&predictions, &test_y, tolerance);

        info!(
            "Trained {}_{}: {} rounds, test MAE {:.3}, RMSE {:.3}, R² {:.3}, within {:.2} = {:.1}%",
            segment,
            target,
            regressor.rounds(),
            scores.mae,
            scores.rmse,
            scores.r2,
            tolerance,
            within * 100.0
        );

        let metrics = EvaluationMetrics {
            mae: scores.mae,
            rmse: scores.rmse,
            r2: scores.r2,
            within_tolerance: within,
            tolerance,
            train_size: split.train.len(),
            validation_size: split.validation.len(),
            test_size: split.test.len(),
            train_years: split.train_years.clone(),
            validation_year: split.validation_year,
            test_years: split.test_years.clone(),
            boosting_rounds: regressor.rounds(),
        };

        Ok(ModelArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            version: Uuid::new_v4(),
            trained_at: Utc::now(),
            segment,
            target,
            feature_names: names,
            scaler,
            regressor,
            metrics,
        })
    }
}
