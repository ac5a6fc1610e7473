//! Integrated dataset files: the comparable pool as JSON and the
//! unmatched-contract report as CSV.

use crate::config::PathsEnvConfig;
use crate::domain::valuation::{TrainingExample, UnmatchedContract};
use crate::infrastructure::persistence::artifact_store::write_atomic;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DatasetStore {
    examples_path: PathBuf,
    unmatched_path: PathBuf,
}

#[derive(Serialize)]
struct UnmatchedRow<'a> {
    player_name: &'a str,
    position: &'a str,
    year_signed: i32,
    age_at_signing: u32,
    reason: String,
    detail: &'a str,
}

impl DatasetStore {
    pub fn new(examples_path: impl Into<PathBuf>, unmatched_path: impl Into<PathBuf>) -> Self {
        Self {
            examples_path: examples_path.into(),
            unmatched_path: unmatched_path.into(),
        }
    }

    pub fn from_paths(paths: &PathsEnvConfig) -> Self {
        Self::new(paths.training_examples(), paths.unmatched_report())
    }

    pub fn save_examples(&self, examples: &[TrainingExample]) -> Result<()> {
        ensure_parent(&self.examples_path)?;
        let content =
            serde_json::to_string_pretty(examples).context("Failed to serialize training examples")?;
        write_atomic(&self.examples_path, &content)?;
        info!(
            "Saved {} training examples to {:?}",
            examples.len(),
            self.examples_path
        );
        Ok(())
    }

    pub fn load_examples(&self) -> Result<Vec<TrainingExample>> {
        let content = fs::read_to_string(&self.examples_path).with_context(|| {
            format!("Failed to read training examples {:?}", self.examples_path)
        })?;
        let examples: Vec<TrainingExample> = serde_json::from_str(&content)
            .context("Failed to parse training examples JSON")?;
        info!(
            "Loaded {} training examples from {:?}",
            examples.len(),
            self.examples_path
        );
        Ok(examples)
    }

    /// One row per unmatched contract, sorted by reason then player.
    pub fn save_unmatched(&self, unmatched: &[UnmatchedContract]) -> Result<()> {
        ensure_parent(&self.unmatched_path)?;
        let mut sorted: Vec<&UnmatchedContract> = unmatched.iter().collect();
        sorted.sort_by(|a, b| {
            a.reason
                .cmp(&b.reason)
                .then_with(|| a.contract.player_name.cmp(&b.contract.player_name))
                .then_with(|| a.contract.year_signed.cmp(&b.contract.year_signed))
        });

        let temp_path = self.unmatched_path.with_extension("tmp");
        {
            let mut writer = csv::Writer::from_path(&temp_path)
                .with_context(|| format!("Failed to create {:?}", temp_path))?;
            for u in sorted {
                writer
                    .serialize(UnmatchedRow {
                        player_name: &u.contract.player_name,
                        position: &u.contract.position,
                        year_signed: u.contract.year_signed,
                        age_at_signing: u.contract.age_at_signing,
                        reason: u.reason.to_string(),
                        detail: &u.detail,
                    })
                    .context("Failed to write unmatched row")?;
            }
            writer.flush().context("Failed to flush unmatched report")?;
        }
        fs::rename(&temp_path, &self.unmatched_path)
            .with_context(|| format!("Failed to rename temp file to {:?}", self.unmatched_path))?;

        info!(
            "Wrote {} unmatched contracts to {:?}",
            unmatched.len(),
            self.unmatched_path
        );
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{BatterFeatures, SegmentFeatures, ValuationContext};
    use crate::domain::player::{Position, PositionGroup};
    use crate::domain::records::{BattingMetrics, ContractRecord};
    use crate::domain::valuation::{MatchKind, UnmatchReason};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_store() -> (DatasetStore, PathBuf) {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "contract_advisor_test_{}_{}_{}_dataset",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            unique_id
        ));
        let store = DatasetStore::new(
            temp_dir.join("training_examples.json"),
            temp_dir.join("unmatched_contracts.csv"),
        );
        (store, temp_dir)
    }

    fn cleanup_test_dir(temp_dir: PathBuf) {
        fs::remove_dir_all(temp_dir).ok();
    }

    fn contract(name: &str) -> ContractRecord {
        ContractRecord {
            player_name: name.to_string(),
            position: "XX".to_string(),
            year_signed: 2021,
            age_at_signing: 29,
            aav: dec!(10000000),
            length: 3,
            total_value: dec!(30000000),
            is_extension: None,
        }
    }

    #[test]
    fn test_examples_roundtrip_keeps_missing_values() {
        let (store, temp_dir) = create_test_store();
        let example = TrainingExample {
            player_name: "Marcus Semien".to_string(),
            matched_name: "Marcus Semien".to_string(),
            match_kind: MatchKind::ExactNormalized,
            position: Position::SecondBase,
            year_signed: 2022,
            age_at_signing: 31,
            aav_millions: 25.0,
            length_years: 7,
            total_value_millions: 175.0,
            is_extension: false,
            seasons_used: vec![2019, 2021],
            features: SegmentFeatures::Batter(BatterFeatures {
                context: ValuationContext {
                    age: 31,
                    year_signed: Some(2022),
                    seasons_with_data: Some(2),
                },
                group: PositionGroup::SecondBase,
                metrics: BattingMetrics {
                    war: Some(6.5),
                    wrc_plus: Some(131.0),
                    ..BattingMetrics::default()
                },
            }),
        };
        store.save_examples(std::slice::from_ref(&example)).unwrap();

        let loaded = store.load_examples().unwrap();
        assert_eq!(loaded, vec![example]);
        assert_eq!(loaded[0].features.value("barrel_rate_3yr"), None);
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_unmatched_report_is_sorted_by_reason() {
        let (store, temp_dir) = create_test_store();
        let unmatched = vec![
            UnmatchedContract {
                contract: contract("Zed Unknown"),
                reason: UnmatchReason::InvalidTarget,
                detail: "zero-year length".to_string(),
            },
            UnmatchedContract {
                contract: contract("Abe Nobody"),
                reason: UnmatchReason::NoNameMatch,
                detail: "no candidate".to_string(),
            },
        ];
        store.save_unmatched(&unmatched).unwrap();

        let content = fs::read_to_string(temp_dir.join("unmatched_contracts.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("player_name,position"));
        assert!(lines[1].starts_with("Abe Nobody"));
        cleanup_test_dir(temp_dir);
    }
}
