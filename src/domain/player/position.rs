use crate::domain::errors::UnknownPositionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player population a model is trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Batter,
    Pitcher,
}

impl Segment {
    pub const ALL: [Segment; 2] = [Segment::Batter, Segment::Pitcher];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Batter => "batter",
            Segment::Pitcher => "pitcher",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batter" | "batting" | "hitter" => Ok(Segment::Batter),
            "pitcher" | "pitching" => Ok(Segment::Pitcher),
            _ => anyhow::bail!("Invalid segment: {}. Must be 'batter' or 'pitcher'", s),
        }
    }
}

/// Roster position as reported by contract sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "SP")]
    StartingPitcher,
    #[serde(rename = "RP")]
    ReliefPitcher,
    #[serde(rename = "P")]
    Pitcher,
    #[serde(rename = "CL")]
    Closer,
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "LF")]
    LeftField,
    #[serde(rename = "CF")]
    CenterField,
    #[serde(rename = "RF")]
    RightField,
    #[serde(rename = "OF")]
    Outfield,
    #[serde(rename = "DH")]
    DesignatedHitter,
}

impl Position {
    pub fn code(&self) -> &'static str {
        match self {
            Position::StartingPitcher => "SP",
            Position::ReliefPitcher => "RP",
            Position::Pitcher => "P",
            Position::Closer => "CL",
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::Shortstop => "SS",
            Position::LeftField => "LF",
            Position::CenterField => "CF",
            Position::RightField => "RF",
            Position::Outfield => "OF",
            Position::DesignatedHitter => "DH",
        }
    }

    pub fn segment(&self) -> Segment {
        match self {
            Position::StartingPitcher
            | Position::ReliefPitcher
            | Position::Pitcher
            | Position::Closer => Segment::Pitcher,
            _ => Segment::Batter,
        }
    }

    /// Lenient parse for contract sources. Codes outside the roster set
    /// (`UT`, `INF`, blanks) are never pitchers and land in the outfield group.
    pub fn from_contract_code(code: &str) -> Position {
        code.parse().unwrap_or(Position::Outfield)
    }

    pub fn group(&self) -> PositionGroup {
        match self {
            Position::StartingPitcher | Position::Pitcher => PositionGroup::StartingPitcher,
            Position::ReliefPitcher | Position::Closer => PositionGroup::ReliefPitcher,
            Position::Catcher => PositionGroup::Catcher,
            Position::FirstBase => PositionGroup::FirstBase,
            Position::SecondBase => PositionGroup::SecondBase,
            Position::ThirdBase => PositionGroup::ThirdBase,
            Position::Shortstop => PositionGroup::Shortstop,
            Position::LeftField
            | Position::CenterField
            | Position::RightField
            | Position::Outfield => PositionGroup::Outfield,
            Position::DesignatedHitter => PositionGroup::DesignatedHitter,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = UnknownPositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SP" => Ok(Position::StartingPitcher),
            "RP" => Ok(Position::ReliefPitcher),
            "P" => Ok(Position::Pitcher),
            "CL" => Ok(Position::Closer),
            "C" => Ok(Position::Catcher),
            "1B" => Ok(Position::FirstBase),
            "2B" => Ok(Position::SecondBase),
            "3B" => Ok(Position::ThirdBase),
            "SS" => Ok(Position::Shortstop),
            "LF" => Ok(Position::LeftField),
            "CF" => Ok(Position::CenterField),
            "RF" => Ok(Position::RightField),
            "OF" => Ok(Position::Outfield),
            "DH" => Ok(Position::DesignatedHitter),
            _ => Err(UnknownPositionError(s.to_string())),
        }
    }
}

/// Coarser grouping used for one-hot encoding and position similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PositionGroup {
    #[serde(rename = "SP")]
    StartingPitcher,
    #[serde(rename = "RP")]
    ReliefPitcher,
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "OF")]
    Outfield,
    #[serde(rename = "DH")]
    DesignatedHitter,
}

impl PositionGroup {
    /// Batter groups in one-hot column order.
    pub const BATTER_GROUPS: [PositionGroup; 7] = [
        PositionGroup::Catcher,
        PositionGroup::FirstBase,
        PositionGroup::SecondBase,
        PositionGroup::ThirdBase,
        PositionGroup::Shortstop,
        PositionGroup::Outfield,
        PositionGroup::DesignatedHitter,
    ];
}
