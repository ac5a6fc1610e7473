use crate::domain::player::{PositionGroup, Segment};
use crate::domain::records::{BattingMetrics, MetricSet, PitchingMetrics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Age, signing year and coverage.
    Context,
    Performance,
    Advanced,
    PositionFlag,
}

impl FeatureKind {
    /// Whether the column takes part in comparable performance distance.
    pub fn is_performance(&self) -> bool {
        matches!(self, FeatureKind::Performance | FeatureKind::Advanced)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FeatureKind,
    /// Training fails when a required column is absent from every example.
    pub required: bool,
}

const fn spec(
    name: &'static str,
    label: &'static str,
    kind: FeatureKind,
    required: bool,
) -> FeatureSpec {
    FeatureSpec {
        name,
        label,
        kind,
        required,
    }
}

use FeatureKind::{Advanced, Context, Performance, PositionFlag};

/// Ordered batter feature columns.
/// This order is persisted in every batter artifact; changing it
/// invalidates previously trained models.
pub const BATTER_FEATURES: &[FeatureSpec] = &[
    spec("age_at_signing", "age at signing", Context, true),
    spec("year_signed", "signing year", Context, true),
    spec("seasons_with_data", "seasons of data", Context, true),
    spec("war_3yr", "3-year WAR", Performance, true),
    spec("wrc_plus_3yr", "3-year wRC+", Performance, true),
    spec("avg_3yr", "3-year batting average", Performance, false),
    spec("obp_3yr", "3-year OBP", Performance, false),
    spec("slg_3yr", "3-year slugging", Performance, false),
    spec("hr_3yr", "3-year home runs", Performance, false),
    spec("avg_exit_velo", "average exit velocity", Advanced, false),
    spec("barrel_rate", "barrel rate", Advanced, false),
    spec("max_exit_velo", "max exit velocity", Advanced, false),
    spec("hard_hit_pct", "hard-hit rate", Advanced, false),
    spec("chase_rate", "chase rate percentile", Advanced, false),
    spec("whiff_rate", "whiff rate percentile", Advanced, false),
    spec("pos_C", "catcher", PositionFlag, true),
    spec("pos_1B", "first base", PositionFlag, true),
    spec("pos_2B", "second base", PositionFlag, true),
    spec("pos_3B", "third base", PositionFlag, true),
    spec("pos_SS", "shortstop", PositionFlag, true),
    spec("pos_OF", "outfield", PositionFlag, true),
    spec("pos_DH", "designated hitter", PositionFlag, true),
];

/// Ordered pitcher feature columns.
pub const PITCHER_FEATURES: &[FeatureSpec] = &[
    spec("age_at_signing", "age at signing", Context, true),
    spec("year_signed", "signing year", Context, true),
    spec("seasons_with_data", "seasons of data", Context, true),
    spec("war_3yr", "3-year WAR", Performance, true),
    spec("era_3yr", "3-year ERA", Performance, true),
    spec("fip_3yr", "3-year FIP", Performance, false),
    spec("k_9_3yr", "3-year K/9", Performance, false),
    spec("bb_9_3yr", "3-year BB/9", Performance, false),
    spec("ip_3yr", "3-year innings", Performance, false),
    spec("fb_velocity", "fastball velocity percentile", Advanced, false),
    spec("fb_spin", "fastball spin percentile", Advanced, false),
    spec("xera", "xERA percentile", Advanced, false),
    spec("k_percent", "strikeout rate percentile", Advanced, false),
    spec("bb_percent", "walk rate percentile", Advanced, false),
    spec("whiff_percent", "whiff rate percentile", Advanced, false),
    spec("chase_percent", "chase rate percentile", Advanced, false),
    spec("is_starter", "starter role", PositionFlag, true),
];

pub fn feature_specs(segment: Segment) -> &'static [FeatureSpec] {
    match segment {
        Segment::Batter => BATTER_FEATURES,
        Segment::Pitcher => PITCHER_FEATURES,
    }
}

pub fn feature_names(segment: Segment) -> Vec<String> {
    feature_specs(segment)
        .iter()
        .map(|s| s.name.to_string())
        .collect()
}

pub fn find_spec(segment: Segment, name: &str) -> Option<&'static FeatureSpec> {
    feature_specs(segment).iter().find(|s| s.name == name)
}

/// Signing context shared by both segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationContext {
    pub age: u32,
    pub year_signed: Option<i32>,
    pub seasons_with_data: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterFeatures {
    pub context: ValuationContext,
    pub group: PositionGroup,
    pub metrics: BattingMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitcherFeatures {
    pub context: ValuationContext,
    pub is_starter: bool,
    pub metrics: PitchingMetrics,
}

/// Segment-tagged model input. Each variant only knows its own columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segment", rename_all = "lowercase")]
pub enum SegmentFeatures {
    Batter(BatterFeatures),
    Pitcher(PitcherFeatures),
}

impl SegmentFeatures {
    pub fn segment(&self) -> Segment {
        match self {
            SegmentFeatures::Batter(_) => Segment::Batter,
            SegmentFeatures::Pitcher(_) => Segment::Pitcher,
        }
    }

    pub fn context(&self) -> &ValuationContext {
        match self {
            SegmentFeatures::Batter(b) => &b.context,
            SegmentFeatures::Pitcher(p) => &p.context,
        }
    }

    pub fn war(&self) -> Option<f64> {
        match self {
            SegmentFeatures::Batter(b) => b.metrics.war,
            SegmentFeatures::Pitcher(p) => p.metrics.war,
        }
    }

    /// Value of a named column, or `None` when it is missing or foreign
    /// to this segment.
    pub fn value(&self, name: &str) -> Option<f64> {
        let ctx = self.context();
        match name {
            "age_at_signing" => return Some(f64::from(ctx.age)),
            "year_signed" => return ctx.year_signed.map(f64::from),
            "seasons_with_data" => return ctx.seasons_with_data.map(f64::from),
            _ => {}
        }

        match self {
            SegmentFeatures::Batter(b) => {
                if let Some(code) = name.strip_prefix("pos_") {
                    let group = PositionGroup::BATTER_GROUPS
                        .iter()
                        .find(|g| group_code(**g) == code)?;
                    return Some(if *group == b.group { 1.0 } else { 0.0 });
                }
                b.metrics.get(name.strip_suffix("_3yr").unwrap_or(name))
            }
            SegmentFeatures::Pitcher(p) => {
                if name == "is_starter" {
                    return Some(if p.is_starter { 1.0 } else { 0.0 });
                }
                p.metrics.get(name.strip_suffix("_3yr").unwrap_or(name))
            }
        }
    }

    /// Builds a vector aligned to `names`. Unknown columns come out missing.
    pub fn to_vector(&self, names: &[String]) -> FeatureVector {
        FeatureVector(names.iter().map(|n| self.value(n)).collect())
    }
}

fn group_code(group: PositionGroup) -> &'static str {
    match group {
        PositionGroup::StartingPitcher => "SP",
        PositionGroup::ReliefPitcher => "RP",
        PositionGroup::Catcher => "C",
        PositionGroup::FirstBase => "1B",
        PositionGroup::SecondBase => "2B",
        PositionGroup::ThirdBase => "3B",
        PositionGroup::Shortstop => "SS",
        PositionGroup::Outfield => "OF",
        PositionGroup::DesignatedHitter => "DH",
    }
}

/// Ordered feature values; `None` is the missing state, distinct from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<Option<f64>>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.0.get(idx).copied().flatten()
    }

    pub fn missing_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortstop() -> SegmentFeatures {
        SegmentFeatures::Batter(BatterFeatures {
            context: ValuationContext {
                age: 27,
                year_signed: Some(2022),
                seasons_with_data: Some(3),
            },
            group: PositionGroup::Shortstop,
            metrics: BattingMetrics {
                war: Some(4.5),
                wrc_plus: Some(130.0),
                barrel_rate: Some(11.2),
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_feature_lists_have_unique_names() {
        for segment in Segment::ALL {
            let names = feature_names(segment);
            let mut sorted = names.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), names.len(), "{}", segment);
        }
    }

    #[test]
    fn test_every_metric_column_maps_to_a_field() {
        for spec in BATTER_FEATURES.iter().filter(|s| s.kind.is_performance()) {
            let field = spec.name.strip_suffix("_3yr").unwrap_or(spec.name);
            assert!(BattingMetrics::FIELDS.contains(&field), "{}", spec.name);
        }
        for spec in PITCHER_FEATURES.iter().filter(|s| s.kind.is_performance()) {
            let field = spec.name.strip_suffix("_3yr").unwrap_or(spec.name);
            assert!(PitchingMetrics::FIELDS.contains(&field), "{}", spec.name);
        }
    }

    #[test]
    fn test_vector_keeps_missing_distinct_from_zero() {
        let names = feature_names(Segment::Batter);
        let vector = shortstop().to_vector(&names);

        assert_eq!(vector.len(), names.len());
        let idx = |n: &str| names.iter().position(|x| x == n).unwrap();
        assert_eq!(vector.get(idx("war_3yr")), Some(4.5));
        assert_eq!(vector.get(idx("barrel_rate")), Some(11.2));
        assert_eq!(vector.0[idx("avg_3yr")], None);
        assert_eq!(vector.get(idx("pos_SS")), Some(1.0));
        assert_eq!(vector.get(idx("pos_C")), Some(0.0));
    }

    #[test]
    fn test_foreign_columns_are_missing() {
        let vector = shortstop().to_vector(&["era_3yr".to_string(), "is_starter".to_string()]);
        assert_eq!(vector.missing_count(), 2);
    }
}
