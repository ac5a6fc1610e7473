use crate::domain::records::ContractRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FairnessLabel {
    FairValue,
    Overpaid,
    Underpaid,
    /// No signed contract to compare against.
    Projected,
}

impl fmt::Display for FairnessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FairnessLabel::FairValue => "fair value",
            FairnessLabel::Overpaid => "overpaid",
            FairnessLabel::Underpaid => "underpaid",
            FairnessLabel::Projected => "projected",
        };
        f.write_str(s)
    }
}

/// The contract a player actually signed, in model units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActualContract {
    pub aav_millions: f64,
    pub length_years: Option<u32>,
}

impl ActualContract {
    pub fn from_record(record: &ContractRecord) -> Option<Self> {
        Some(Self {
            aav_millions: record.aav_millions()?,
            length_years: Some(record.length),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub label: FairnessLabel,
    /// `(actual - predicted) / predicted * 100`, when an actual exists.
    pub deviation_pct: Option<f64>,
    pub sentences: Vec<String>,
}
