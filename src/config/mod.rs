//! Configuration module for the contract advisor.
//!
//! Structured configuration loaded from `ADVISOR_*` environment variables,
//! organized by concern: Paths, Training and Serving.

mod paths_config;
mod serving_config;
mod training_config;

pub use paths_config::PathsEnvConfig;
pub use serving_config::ServingEnvConfig;
pub use training_config::TrainingEnvConfig;

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub paths: PathsEnvConfig,
    pub training: TrainingEnvConfig,
    pub serving: ServingEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let paths = PathsEnvConfig::from_env();
        let training = TrainingEnvConfig::from_env().context("Failed to load training config")?;
        let serving = ServingEnvConfig::from_env().context("Failed to load serving config")?;

        Ok(Self {
            paths,
            training,
            serving,
        })
    }
}
