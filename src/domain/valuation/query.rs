use crate::domain::errors::ServingError;
use crate::domain::ml::{BatterFeatures, PitcherFeatures, SegmentFeatures, ValuationContext};
use crate::domain::player::{Position, PositionGroup, Segment};
use crate::domain::records::{BattingMetrics, MetricSet, PitchingMetrics};
use serde::{Deserialize, Serialize};

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 50;

/// Trailing stats over the most recent completed seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentForm {
    pub age: u32,
    /// Year the valuation applies to (the season after the window).
    pub year: i32,
    #[serde(default)]
    pub seasons_with_data: Option<u32>,
    #[serde(default)]
    pub batting: Option<BattingMetrics>,
    #[serde(default)]
    pub pitching: Option<PitchingMetrics>,
}

/// A valuation request. Absent optional metrics are passed through as
/// missing; nothing here fills defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    #[serde(default)]
    pub player_name: Option<String>,
    pub position: String,
    #[serde(default)]
    pub secondary_position: Option<String>,
    pub age: u32,
    #[serde(default)]
    pub signing_year: Option<i32>,
    #[serde(default)]
    pub seasons_with_data: Option<u32>,
    #[serde(default)]
    pub batting: Option<BattingMetrics>,
    #[serde(default)]
    pub pitching: Option<PitchingMetrics>,
    #[serde(default)]
    pub recent: Option<RecentForm>,
}

/// One role a query is valued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub segment: Segment,
    pub position: Position,
}

impl PredictionQuery {
    /// Fills a missing signing year. Trained models never see `year_signed`
    /// missing, so callers should anchor open queries before predicting.
    pub fn with_default_signing_year(mut self, year: i32) -> Self {
        self.signing_year.get_or_insert(year);
        self
    }

    pub fn primary_role(&self) -> Result<Role, ServingError> {
        let position: Position = self.position.parse()?;
        Ok(Role {
            segment: position.segment(),
            position,
        })
    }

    /// Roles to value. Two roles only when the secondary position belongs
    /// to the other segment.
    pub fn roles(&self) -> Result<Vec<Role>, ServingError> {
        let primary = self.primary_role()?;
        let mut roles = vec![primary];
        if let Some(raw) = &self.secondary_position {
            let secondary: Position = raw.parse()?;
            if secondary.segment() != primary.segment {
                roles.push(Role {
                    segment: secondary.segment(),
                    position: secondary,
                });
            }
        }
        Ok(roles)
    }

    pub fn is_two_way(&self) -> Result<bool, ServingError> {
        Ok(self.roles()?.len() == 2)
    }

    /// Validates the whole query, including every role it implies.
    pub fn validate(&self) -> Result<(), ServingError> {
        validate_age("age", self.age)?;
        for role in self.roles()? {
            match role.segment {
                Segment::Batter => {
                    let metrics = self
                        .batting
                        .as_ref()
                        .ok_or_else(|| ServingError::validation("batting", "required for a batting role"))?;
                    validate_batting("batting", metrics)?;
                }
                Segment::Pitcher => {
                    let metrics = self
                        .pitching
                        .as_ref()
                        .ok_or_else(|| ServingError::validation("pitching", "required for a pitching role"))?;
                    validate_pitching("pitching", metrics)?;
                }
            }
        }
        if let Some(recent) = &self.recent {
            validate_age("recent.age", recent.age)?;
            if let Some(m) = &recent.batting {
                validate_batting("recent.batting", m)?;
            }
            if let Some(m) = &recent.pitching {
                validate_pitching("recent.pitching", m)?;
            }
        }
        Ok(())
    }

    /// At-signing features for one role.
    pub fn features_for(&self, role: Role) -> Result<SegmentFeatures, ServingError> {
        let context = ValuationContext {
            age: self.age,
            year_signed: self.signing_year,
            seasons_with_data: self.seasons_with_data,
        };
        match role.segment {
            Segment::Batter => {
                let metrics = self
                    .batting
                    .clone()
                    .ok_or_else(|| ServingError::validation("batting", "required for a batting role"))?;
                Ok(batter_features(context, role.position, metrics))
            }
            Segment::Pitcher => {
                let metrics = self
                    .pitching
                    .clone()
                    .ok_or_else(|| ServingError::validation("pitching", "required for a pitching role"))?;
                Ok(pitcher_features(context, role.position, metrics))
            }
        }
    }

    /// Recent-form features for one role, when a recent block covers it.
    pub fn recent_features_for(&self, role: Role) -> Option<SegmentFeatures> {
        let recent = self.recent.as_ref()?;
        let context = ValuationContext {
            age: recent.age,
            year_signed: Some(recent.year),
            seasons_with_data: recent.seasons_with_data,
        };
        match role.segment {
            Segment::Batter => recent
                .batting
                .clone()
                .map(|m| batter_features(context, role.position, m)),
            Segment::Pitcher => recent
                .pitching
                .clone()
                .map(|m| pitcher_features(context, role.position, m)),
        }
    }
}

fn batter_features(
    context: ValuationContext,
    position: Position,
    metrics: BattingMetrics,
) -> SegmentFeatures {
    // A pitcher's batting role is valued as a designated hitter.
    let group = match position.segment() {
        Segment::Batter => position.group(),
        Segment::Pitcher => PositionGroup::DesignatedHitter,
    };
    SegmentFeatures::Batter(BatterFeatures {
        context,
        group,
        metrics,
    })
}

fn pitcher_features(
    context: ValuationContext,
    position: Position,
    metrics: PitchingMetrics,
) -> SegmentFeatures {
    let is_starter = match position.segment() {
        Segment::Pitcher => position.group() == PositionGroup::StartingPitcher,
        Segment::Batter => true,
    };
    SegmentFeatures::Pitcher(PitcherFeatures {
        context,
        is_starter,
        metrics,
    })
}

fn validate_age(field: &str, age: u32) -> Result<(), ServingError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ServingError::validation(
            field,
            format!("age {} outside {}..={}", age, MIN_AGE, MAX_AGE),
        ));
    }
    Ok(())
}

fn validate_values<M: MetricSet>(
    prefix: &str,
    metrics: &M,
    percentile_fields: &[&str],
) -> Result<(), ServingError> {
    for (name, value) in M::FIELDS.iter().zip(metrics.values()) {
        let Some(v) = value else { continue };
        if !v.is_finite() {
            return Err(ServingError::validation(
                format!("{}.{}", prefix, name),
                "value is not a finite number",
            ));
        }
        if percentile_fields.contains(name) && !(0.0..=100.0).contains(&v) {
            return Err(ServingError::validation(
                format!("{}.{}", prefix, name),
                format!("percentile {} outside 0..=100", v),
            ));
        }
    }
    Ok(())
}

fn validate_batting(prefix: &str, metrics: &BattingMetrics) -> Result<(), ServingError> {
    validate_values(prefix, metrics, BattingMetrics::PERCENTILE_FIELDS)?;
    if metrics.war.is_none() {
        return Err(ServingError::validation(format!("{}.war", prefix), "WAR is required"));
    }
    if metrics.wrc_plus.is_none() && metrics.avg.is_none() {
        return Err(ServingError::validation(
            prefix,
            "batters need wrc_plus or avg",
        ));
    }
    Ok(())
}

fn validate_pitching(prefix: &str, metrics: &PitchingMetrics) -> Result<(), ServingError> {
    validate_values(prefix, metrics, PitchingMetrics::PERCENTILE_FIELDS)?;
    if metrics.war.is_none() {
        return Err(ServingError::validation(format!("{}.war", prefix), "WAR is required"));
    }
    if metrics.era.is_none() && metrics.fip.is_none() {
        return Err(ServingError::validation(prefix, "pitchers need era or fip"));
    }
    Ok(())
}
