//! Filesystem locations for datasets and model artifacts.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PathsEnvConfig {
    /// Root folder holding input CSVs and the integrated dataset.
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
}

impl Default for PathsEnvConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("data/models"),
        }
    }
}

impl PathsEnvConfig {
    pub fn from_env() -> Self {
        let data_dir =
            PathBuf::from(env::var("ADVISOR_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let models_dir = env::var("ADVISOR_MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("models"));
        Self {
            data_dir,
            models_dir,
        }
    }

    pub fn seasons_csv(&self) -> PathBuf {
        self.data_dir.join("seasons.csv")
    }

    pub fn contracts_csv(&self) -> PathBuf {
        self.data_dir.join("contracts.csv")
    }

    pub fn training_examples(&self) -> PathBuf {
        self.data_dir.join("training_examples.json")
    }

    pub fn unmatched_report(&self) -> PathBuf {
        self.data_dir.join("unmatched_contracts.csv")
    }
}
