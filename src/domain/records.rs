//! Raw historical facts delivered by the collection layer.
//!
//! Season lines and contract records are immutable once collected. Every
//! metric is optional: an absent value is carried as `None` and never
//! replaced with zero.

use crate::domain::player::Segment;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// A fixed, ordered set of optional numeric metrics.
///
/// Implementors expose their fields positionally so the windowing code can
/// average any metric family without knowing its field names.
pub trait MetricSet: Default + Clone {
    const FIELDS: &'static [&'static str];

    fn values(&self) -> Vec<Option<f64>>;

    fn from_values(values: &[Option<f64>]) -> Self;

    fn get(&self, field: &str) -> Option<f64> {
        let idx = Self::FIELDS.iter().position(|f| *f == field)?;
        self.values().get(idx).copied().flatten()
    }
}

macro_rules! metric_set {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<f64>,
            )+
        }

        impl MetricSet for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn values(&self) -> Vec<Option<f64>> {
                vec![$(self.$field),+]
            }

            fn from_values(values: &[Option<f64>]) -> Self {
                let mut iter = values.iter().copied();
                Self {
                    $($field: iter.next().flatten(),)+
                }
            }
        }
    };
}

metric_set!(BattingMetrics {
    war,
    wrc_plus,
    avg,
    obp,
    slg,
    hr,
    avg_exit_velo,
    barrel_rate,
    max_exit_velo,
    hard_hit_pct,
    chase_rate,
    whiff_rate,
});

metric_set!(PitchingMetrics {
    war,
    era,
    fip,
    k_9,
    bb_9,
    ip,
    fb_velocity,
    fb_spin,
    xera,
    k_percent,
    bb_percent,
    whiff_percent,
    chase_percent,
});

impl BattingMetrics {
    /// Percentile-scaled fields, which must stay within 0..=100.
    pub const PERCENTILE_FIELDS: &'static [&'static str] = &["chase_rate", "whiff_rate"];
}

impl PitchingMetrics {
    pub const PERCENTILE_FIELDS: &'static [&'static str] = &[
        "fb_velocity",
        "fb_spin",
        "xera",
        "k_percent",
        "bb_percent",
        "whiff_percent",
        "chase_percent",
    ];
}

/// One season of one role for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segment", content = "metrics")]
pub enum SeasonLine {
    #[serde(rename = "batter")]
    Batting(BattingMetrics),
    #[serde(rename = "pitcher")]
    Pitching(PitchingMetrics),
}

impl SeasonLine {
    pub fn segment(&self) -> Segment {
        match self {
            SeasonLine::Batting(_) => Segment::Batter,
            SeasonLine::Pitching(_) => Segment::Pitcher,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub player_name: String,
    pub season: i32,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub team: Option<String>,
    pub line: SeasonLine,
}

impl SeasonRecord {
    pub fn segment(&self) -> Segment {
        self.line.segment()
    }

    pub fn batting(&self) -> Option<&BattingMetrics> {
        match &self.line {
            SeasonLine::Batting(m) => Some(m),
            SeasonLine::Pitching(_) => None,
        }
    }

    pub fn pitching(&self) -> Option<&PitchingMetrics> {
        match &self.line {
            SeasonLine::Pitching(m) => Some(m),
            SeasonLine::Batting(_) => None,
        }
    }
}

/// A signed contract. Money is kept in exact dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub player_name: String,
    /// Raw position string; parsed during integration so unknown codes
    /// can be reported instead of rejected at load time.
    pub position: String,
    pub year_signed: i32,
    pub age_at_signing: u32,
    #[serde(deserialize_with = "deserialize_currency")]
    pub aav: Decimal,
    pub length: u32,
    #[serde(deserialize_with = "deserialize_currency")]
    pub total_value: Decimal,
    #[serde(default)]
    pub is_extension: Option<bool>,
}

const DOLLARS_PER_MILLION: i64 = 1_000_000;

impl ContractRecord {
    /// Extension flag, falling back to the pre-free-agency heuristic
    /// (age at most 25 and at least six years) when the source left it blank.
    pub fn likely_extension(&self) -> bool {
        self.is_extension
            .unwrap_or(self.age_at_signing <= 25 && self.length >= 6)
    }

    pub fn aav_millions(&self) -> Option<f64> {
        (self.aav / Decimal::from(DOLLARS_PER_MILLION)).to_f64()
    }

    pub fn total_value_millions(&self) -> Option<f64> {
        (self.total_value / Decimal::from(DOLLARS_PER_MILLION)).to_f64()
    }
}

/// Converts millions of dollars back to exact dollars for display.
pub fn millions_to_dollars(millions: f64) -> Option<Decimal> {
    Decimal::from_f64(millions)?
        .checked_mul(Decimal::from(DOLLARS_PER_MILLION))
        .map(|d| d.round_dp(0))
}

/// Parses `30000000`, `30000000.0` or `"$30,000,000"` style amounts.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn deserialize_currency<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawAmount::deserialize(deserializer)?;
    let parsed = match raw {
        RawAmount::Integer(v) => Some(Decimal::from(v)),
        RawAmount::Float(v) => Decimal::from_f64(v),
        RawAmount::Text(s) => parse_currency(&s),
    };
    parsed.ok_or_else(|| serde::de::Error::custom("invalid currency amount"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn contract(age: u32, length: u32, flag: Option<bool>) -> ContractRecord {
        ContractRecord {
            player_name: "Test Player".to_string(),
            position: "SS".to_string(),
            year_signed: 2022,
            age_at_signing: age,
            aav: dec!(32500000),
            length,
            total_value: dec!(325000000),
            is_extension: flag,
        }
    }

    #[test]
    fn test_parse_currency_strings() {
        assert_eq!(parse_currency("$30,000,000"), Some(dec!(30000000)));
        assert_eq!(parse_currency(" 1,234.50 "), Some(dec!(1234.50)));
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("n/a"), None);
    }

    #[test]
    fn test_extension_heuristic_only_when_flag_absent() {
        assert!(contract(24, 8, None).likely_extension());
        assert!(!contract(27, 10, None).likely_extension());
        assert!(!contract(24, 5, None).likely_extension());
        assert!(!contract(24, 8, Some(false)).likely_extension());
        assert!(contract(30, 2, Some(true)).likely_extension());
    }

    #[test]
    fn test_aav_in_millions() {
        let c = contract(27, 10, None);
        assert_eq!(c.aav_millions(), Some(32.5));
        assert_eq!(millions_to_dollars(32.5), Some(dec!(32500000)));
    }

    #[test]
    fn test_contract_json_accepts_currency_strings() {
        let json = r#"{
            "player_name": "Corey Seager",
            "position": "SS",
            "year_signed": 2022,
            "age_at_signing": 27,
            "aav": "$32,500,000",
            "length": 10,
            "total_value": 325000000
        }"#;
        let c: ContractRecord = serde_json::from_str(json).unwrap();
        assert_eq!(c.aav, dec!(32500000));
        assert_eq!(c.total_value, dec!(325000000));
        assert_eq!(c.is_extension, None);
    }

    #[test]
    fn test_metric_set_positional_access() {
        let m = BattingMetrics {
            war: Some(4.5),
            wrc_plus: Some(130.0),
            ..Default::default()
        };
        assert_eq!(m.get("wrc_plus"), Some(130.0));
        assert_eq!(m.get("avg"), None);

        let rebuilt = BattingMetrics::from_values(&m.values());
        assert_eq!(rebuilt, m);
        assert_eq!(BattingMetrics::FIELDS.len(), m.values().len());
    }

    #[test]
    fn test_season_line_tagging() {
        let record = SeasonRecord {
            player_name: "Shohei Ohtani".to_string(),
            season: 2023,
            age: Some(28),
            team: Some("LAA".to_string()),
            line: SeasonLine::Pitching(PitchingMetrics {
                era: Some(3.14),
                ..Default::default()
            }),
        };
        assert_eq!(record.segment(), Segment::Pitcher);
        assert!(record.batting().is_none());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"segment\":\"pitcher\""));
    }
}
