//! Process-wide, read-only model registry.
//!
//! Built and validated once at startup, then installed into a `OnceLock`.
//! Request handlers only ever see `&'static ArtifactRegistry`, so concurrent
//! readers need no locking.

use crate::domain::errors::ServingError;
use crate::domain::ml::{ModelArtifact, Target};
use crate::domain::player::Segment;
use crate::domain::valuation::TrainingExample;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::info;

static REGISTRY: OnceLock<ArtifactRegistry> = OnceLock::new();

#[derive(Debug)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<(Segment, Target), ModelArtifact>,
    pools: BTreeMap<Segment, Vec<TrainingExample>>,
}

impl ArtifactRegistry {
    /// Requires all four (segment, target) artifacts, each matching the
    /// current schema.
    pub fn new(
        artifacts: Vec<ModelArtifact>,
        examples: Vec<TrainingExample>,
    ) -> Result<Self, ServingError> {
        let mut by_key = BTreeMap::new();
        for artifact in artifacts {
            artifact.check_schema().map_err(ServingError::model_not_loaded)?;
            let key = (artifact.segment, artifact.target);
            if by_key.insert(key, artifact).is_some() {
                return Err(ServingError::model_not_loaded(format!(
                    "duplicate artifact for {}",
                    ModelArtifact::key(key.0, key.1)
                )));
            }
        }
        for segment in Segment::ALL {
            for target in Target::ALL {
                if !by_key.contains_key(&(segment, target)) {
                    return Err(ServingError::model_not_loaded(format!(
                        "missing artifact {}",
                        ModelArtifact::key(segment, target)
                    )));
                }
            }
        }

        let mut pools: BTreeMap<Segment, Vec<TrainingExample>> = BTreeMap::new();
        for example in examples {
            pools.entry(example.segment()).or_default().push(example);
        }

        Ok(Self {
            artifacts: by_key,
            pools,
        })
    }

    pub fn artifact(&self, segment: Segment, target: Target) -> Result<&ModelArtifact, ServingError> {
        self.artifacts.get(&(segment, target)).ok_or_else(|| {
            ServingError::model_not_loaded(format!(
                "missing artifact {}",
                ModelArtifact::key(segment, target)
            ))
        })
    }

    pub fn pool(&self, segment: Segment) -> &[TrainingExample] {
        self.pools.get(&segment).map(Vec::as_slice).unwrap_or_default()
    }

    /// Installs the registry for the life of the process. Fails if one is
    /// already installed.
    pub fn install(self) -> Result<&'static Self, ServingError> {
        let summary = self.summary();
        REGISTRY
            .set(self)
            .map_err(|_| ServingError::RegistryAlreadyInstalled)?;
        info!("Installed artifact registry: {}", summary);
        Self::global()
    }

    pub fn global() -> Result<&'static Self, ServingError> {
        REGISTRY
            .get()
            .ok_or_else(|| ServingError::model_not_loaded("registry has not been installed"))
    }

    fn summary(&self) -> String {
        let versions: Vec<String> = self
            .artifacts
            .values()
            .map(|a| format!("{}={}", ModelArtifact::key(a.segment, a.target), a.version))
            .collect();
        format!(
            "{} (pools: {} batters, {} pitchers)",
            versions.join(", "),
            self.pool(Segment::Batter).len(),
            self.pool(Segment::Pitcher).len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_requires_every_artifact() {
        let err = ArtifactRegistry::new(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, ServingError::ModelNotLoaded { .. }));
        assert!(err.to_string().contains("batter_aav"));
    }
}
