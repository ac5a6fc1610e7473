use crate::domain::ml::{SegmentFeatures, Target};
use crate::domain::player::{Position, Segment};
use crate::domain::records::ContractRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which identity strategy linked a contract to season data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactNormalized,
    LastNameFirstInitial,
    UniqueLastName,
    ContainsBothNames,
    PartialLastName,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchKind::ExactNormalized => "exact_normalized",
            MatchKind::LastNameFirstInitial => "last_name_first_initial",
            MatchKind::UniqueLastName => "unique_last_name",
            MatchKind::ContainsBothNames => "contains_both_names",
            MatchKind::PartialLastName => "partial_last_name",
        };
        f.write_str(s)
    }
}

/// A contract joined with its pre-signing trailing window.
///
/// Every season in `seasons_used` is strictly earlier than `year_signed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub player_name: String,
    /// Name as spelled in the season source.
    pub matched_name: String,
    pub match_kind: MatchKind,
    pub position: Position,
    pub year_signed: i32,
    pub age_at_signing: u32,
    pub aav_millions: f64,
    pub length_years: u32,
    pub total_value_millions: f64,
    pub is_extension: bool,
    pub seasons_used: Vec<i32>,
    pub features: SegmentFeatures,
}

impl TrainingExample {
    pub fn segment(&self) -> Segment {
        self.features.segment()
    }

    /// Number of seasons in the trailing window (1 to 3).
    pub fn coverage(&self) -> usize {
        self.seasons_used.len()
    }

    pub fn is_partial_window(&self) -> bool {
        self.coverage() < 3
    }

    pub fn target(&self, target: Target) -> f64 {
        match target {
            Target::Aav => self.aav_millions,
            Target::Length => f64::from(self.length_years),
        }
    }

    pub fn war(&self) -> Option<f64> {
        self.features.war()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnmatchReason {
    /// No season-data player resolves to the contract's name.
    NoNameMatch,
    /// The player exists but has no segment seasons in the window.
    NoSeasonsInWindow,
    /// Non-positive AAV or zero length.
    InvalidTarget,
}

impl fmt::Display for UnmatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnmatchReason::NoNameMatch => "NoNameMatch",
            UnmatchReason::NoSeasonsInWindow => "NoSeasonsInWindow",
            UnmatchReason::InvalidTarget => "InvalidTarget",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedContract {
    pub contract: ContractRecord,
    pub reason: UnmatchReason,
    pub detail: String,
}
