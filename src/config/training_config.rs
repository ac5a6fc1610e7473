//! Training configuration parsing from environment variables.
//!
//! Boosting hyper-parameters come from `ADVISOR_*` variables, and an optional
//! TOML file named by `ADVISOR_TRAINING_PARAMS_FILE` overrides them.

use crate::domain::ml::BoostingParams;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TrainingEnvConfig {
    pub boosting: BoostingParams,

    // Dataset thresholds
    pub min_examples: usize,
    pub test_fraction: f64,
    /// AAV tolerance for the within-tolerance accuracy (millions).
    pub aav_tolerance_millions: f64,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            boosting: BoostingParams::default(),
            min_examples: 20,
            test_fraction: 0.2,
            aav_tolerance_millions: 5.0,
        }
    }
}

/// Shape of the optional TOML override file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct TrainingOverrides {
    boosting: Option<BoostingOverrides>,
    min_examples: Option<usize>,
    test_fraction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct BoostingOverrides {
    n_estimators: Option<usize>,
    learning_rate: Option<f64>,
    max_depth: Option<usize>,
    min_samples_leaf: Option<usize>,
    subsample: Option<f64>,
    seed: Option<u64>,
    early_stopping_rounds: Option<usize>,
}

impl TrainingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = BoostingParams::default();
        let boosting = BoostingParams {
            n_estimators: Self::parse("ADVISOR_N_ESTIMATORS", defaults.n_estimators)?,
            learning_rate: Self::parse("ADVISOR_LEARNING_RATE", defaults.learning_rate)?,
            max_depth: Self::parse("ADVISOR_MAX_DEPTH", defaults.max_depth)?,
            min_samples_leaf: Self::parse("ADVISOR_MIN_SAMPLES_LEAF", defaults.min_samples_leaf)?,
            subsample: Self::parse("ADVISOR_SUBSAMPLE", defaults.subsample)?,
            seed: Self::parse("ADVISOR_SEED", defaults.seed)?,
            early_stopping_rounds: Self::parse(
                "ADVISOR_EARLY_STOPPING_ROUNDS",
                defaults.early_stopping_rounds,
            )?,
        };

        let mut config = Self {
            boosting,
            min_examples: Self::parse("ADVISOR_MIN_EXAMPLES", 20)?,
            test_fraction: Self::parse("ADVISOR_TEST_FRACTION", 0.2)?,
            aav_tolerance_millions: Self::parse("ADVISOR_AAV_TOLERANCE_MILLIONS", 5.0)?,
        };

        if let Ok(path) = env::var("ADVISOR_TRAINING_PARAMS_FILE") {
            config
                .apply_overrides_file(Path::new(&path))
                .with_context(|| format!("Failed to apply training overrides from {}", path))?;
        }

        if !(0.0 < config.test_fraction && config.test_fraction < 1.0) {
            anyhow::bail!(
                "ADVISOR_TEST_FRACTION must be between 0 and 1, got {}",
                config.test_fraction
            );
        }
        if !(0.0 < config.boosting.subsample && config.boosting.subsample <= 1.0) {
            anyhow::bail!(
                "ADVISOR_SUBSAMPLE must be in (0, 1], got {}",
                config.boosting.subsample
            );
        }

        Ok(config)
    }

    pub fn apply_overrides_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).context("Failed to read overrides file")?;
        self.apply_overrides_str(&content)
    }

    pub fn apply_overrides_str(&mut self, content: &str) -> Result<()> {
        let overrides: TrainingOverrides =
            toml::from_str(content).context("Failed to parse training overrides TOML")?;

        if let Some(b) = overrides.boosting {
            let p = &mut self.boosting;
            p.n_estimators = b.n_estimators.unwrap_or(p.n_estimators);
            p.learning_rate = b.learning_rate.unwrap_or(p.learning_rate);
            p.max_depth = b.max_depth.unwrap_or(p.max_depth);
            p.min_samples_leaf = b.min_samples_leaf.unwrap_or(p.min_samples_leaf);
            p.subsample = b.subsample.unwrap_or(p.subsample);
            p.seed = b.seed.unwrap_or(p.seed);
            p.early_stopping_rounds = b.early_stopping_rounds.unwrap_or(p.early_stopping_rounds);
        }
        self.min_examples = overrides.min_examples.unwrap_or(self.min_examples);
        self.test_fraction = overrides.test_fraction.unwrap_or(self.test_fraction);
        Ok(())
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
