//! On-disk model bundles, one JSON file per (segment, target).

use crate::domain::ml::{ModelArtifact, Target};
use crate::domain::player::Segment;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, segment: Segment, target: Target) -> PathBuf {
        self.dir
            .join(format!("{}.json", ModelArtifact::key(segment, target)))
    }

    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create models directory {:?}", self.dir))?;
        let path = self.path_for(artifact.segment, artifact.target);
        let content =
            serde_json::to_string_pretty(artifact).context("Failed to serialize model artifact")?;
        write_atomic(&path, &content)?;

        info!(
            "Saved {} artifact {} to {:?}",
            ModelArtifact::key(artifact.segment, artifact.target),
            artifact.version,
            path
        );
        Ok(path)
    }

    /// Loads one bundle and refuses it unless it matches the current
    /// schema version and feature list.
    pub fn load(&self, segment: Segment, target: Target) -> Result<ModelArtifact> {
        let path = self.path_for(segment, target);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read model artifact {:?}", path))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model artifact {:?}", path))?;

        if artifact.segment != segment || artifact.target != target {
            return Err(anyhow!(
                "{:?} holds a {} model, expected {}",
                path,
                ModelArtifact::key(artifact.segment, artifact.target),
                ModelArtifact::key(segment, target)
            ));
        }
        artifact.check_schema().map_err(|reason| anyhow!(reason))?;

        debug!("Loaded {:?} (version {})", path, artifact.version);
        Ok(artifact)
    }

    pub fn load_all(&self) -> Result<Vec<ModelArtifact>> {
        let mut artifacts = Vec::with_capacity(Segment::ALL.len() * Target::ALL.len());
        for segment in Segment::ALL {
            for target in Target::ALL {
                artifacts.push(self.load(segment, target)?);
            }
        }
        Ok(artifacts)
    }
}

/// Write to a sibling temp file, then rename over the target.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to rename temp file to {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::feature_registry::feature_names;
    use crate::domain::ml::{
        ARTIFACT_SCHEMA_VERSION, BoostingParams, EvaluationMetrics, FeatureVector,
        GradientBoostedRegressor, StandardScaler,
    };
    use chrono::Utc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_store() -> (ArtifactStore, PathBuf) {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "contract_advisor_test_{}_{}_{}_artifacts",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            unique_id
        ));
        fs::create_dir_all(&temp_dir).expect("Failed to create test temp dir");
        (ArtifactStore::new(temp_dir.join("models")), temp_dir)
    }

    fn cleanup_test_dir(temp_dir: PathBuf) {
        fs::remove_dir_all(temp_dir).ok();
    }

    fn artifact(segment: Segment, target: Target) -> ModelArtifact {
        let names = feature_names(segment);
        let width = names.len();
        let rows: Vec<FeatureVector> = (0..10)
            .map(|i| FeatureVector(vec![Some(i as f64); width]))
            .collect();
        let targets: Vec<f64> = (0..10).map(|i| i as f64 * 2.0).collect();
        let params = BoostingParams {
            n_estimators: 5,
            ..BoostingParams::default()
        };
        ModelArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            version: Uuid::new_v4(),
            trained_at: Utc::now(),
            segment,
            target,
            feature_names: names,
            scaler: StandardScaler::fit(&rows, width),
            regressor: GradientBoostedRegressor::fit(&rows, &targets, None, width, &params),
            metrics: EvaluationMetrics::default(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (store, temp_dir) = create_test_store();
        let saved = artifact(Segment::Batter, Target::Aav);
        let path = store.save(&saved).unwrap();
        assert!(path.ends_with("batter_aav.json"));
        assert!(!path.with_extension("tmp").exists());

        let loaded = store.load(Segment::Batter, Target::Aav).unwrap();
        assert_eq!(loaded.version, saved.version);
        let probe = FeatureVector(vec![Some(4.0); loaded.feature_names.len()]);
        assert!((loaded.predict(&probe) - saved.predict(&probe)).abs() < 1e-9);
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_load_refuses_other_schema_version() {
        let (store, temp_dir) = create_test_store();
        let mut stale = artifact(Segment::Pitcher, Target::Length);
        stale.schema_version = ARTIFACT_SCHEMA_VERSION + 1;
        store.save(&stale).unwrap();

        let err = store.load(Segment::Pitcher, Target::Length).unwrap_err();
        assert!(err.to_string().contains("schema version"));
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_load_refuses_changed_feature_list() {
        let (store, temp_dir) = create_test_store();
        let mut drifted = artifact(Segment::Batter, Target::Length);
        drifted.feature_names.swap(0, 1);
        store.save(&drifted).unwrap();

        assert!(store.load(Segment::Batter, Target::Length).is_err());
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_load_all_requires_every_bundle() {
        let (store, temp_dir) = create_test_store();
        store.save(&artifact(Segment::Batter, Target::Aav)).unwrap();
        assert!(store.load_all().is_err());
        cleanup_test_dir(temp_dir);
    }
}
