//! Builds prediction queries for players already present in the dataset.

use crate::application::integration::name_matching::normalize_name;
use crate::application::integration::windowing::{aggregate_window, trailing_window};
use crate::domain::player::{Position, Segment};
use crate::domain::records::{ContractRecord, SeasonRecord};
use crate::domain::valuation::{PredictionQuery, RecentForm};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Month from which the current year's regular season counts as complete.
const SEASON_COMPLETE_MONTH: u32 = 10;

/// The last `n` completed season years, ascending.
pub fn completed_seasons(today: NaiveDate, n: usize) -> Vec<i32> {
    let latest = if today.month() >= SEASON_COMPLETE_MONTH {
        today.year()
    } else {
        today.year() - 1
    };
    let n = n as i32;
    ((latest - n + 1)..=latest).collect()
}

/// Query describing `contract` as of its signing, optionally with a
/// recent-form block anchored at `today`.
pub fn at_signing_query(
    contract: &ContractRecord,
    seasons: &[SeasonRecord],
    today: Option<NaiveDate>,
) -> PredictionQuery {
    let years = trailing_window(contract.year_signed);
    let batting = aggregate_window(seasons, years.clone(), SeasonRecord::batting);
    let pitching = aggregate_window(seasons, years, SeasonRecord::pitching);

    let primary_segment = contract
        .position
        .parse::<Position>()
        .map(|p| p.segment())
        .ok();
    let seasons_with_data = match primary_segment {
        Some(Segment::Batter) => batting.as_ref().map(|w| w.seasons.len() as u32),
        Some(Segment::Pitcher) => pitching.as_ref().map(|w| w.seasons.len() as u32),
        None => None,
    };
    let secondary_position = match (primary_segment, &batting, &pitching) {
        (Some(Segment::Batter), Some(_), Some(_)) => Some(Position::StartingPitcher.to_string()),
        (Some(Segment::Pitcher), Some(_), Some(_)) => {
            Some(Position::DesignatedHitter.to_string())
        }
        _ => None,
    };

    PredictionQuery {
        player_name: Some(contract.player_name.clone()),
        position: contract.position.clone(),
        secondary_position,
        age: contract.age_at_signing,
        signing_year: Some(contract.year_signed),
        seasons_with_data,
        batting: batting.map(|w| w.metrics),
        pitching: pitching.map(|w| w.metrics),
        recent: today.and_then(|t| recent_form(seasons, t)),
    }
}

/// Trailing aggregate over the last three completed seasons.
///
/// Age is projected from the latest season that reports one; without any
/// age the block cannot be built.
pub fn recent_form(seasons: &[SeasonRecord], today: NaiveDate) -> Option<RecentForm> {
    let years = completed_seasons(today, 3);
    let (first, last) = (*years.first()?, *years.last()?);
    let range = first..=last;

    let batting = aggregate_window(seasons, range.clone(), SeasonRecord::batting);
    let pitching = aggregate_window(seasons, range.clone(), SeasonRecord::pitching);
    if batting.is_none() && pitching.is_none() {
        return None;
    }

    let valuation_year = last + 1;
    let age = seasons
        .iter()
        .filter(|r| range.contains(&r.season))
        .filter_map(|r| r.age.map(|a| (r.season, a)))
        .max_by_key(|(season, _)| *season)
        .map(|(season, age)| age + (valuation_year - season) as u32)?;

    let seasons_with_data = batting
        .iter()
        .map(|w| w.seasons.len())
        .chain(pitching.iter().map(|w| w.seasons.len()))
        .max()
        .map(|n| n as u32);

    Some(RecentForm {
        age,
        year: valuation_year,
        seasons_with_data,
        batting: batting.map(|w| w.metrics),
        pitching: pitching.map(|w| w.metrics),
    })
}

/// Finds the season records for a contract's player in the season source.
pub fn seasons_for<'a>(
    seasons_by_player: &'a BTreeMap<String, Vec<SeasonRecord>>,
    player_name: &str,
) -> &'a [SeasonRecord] {
    let target = normalize_name(player_name);
    seasons_by_player
        .iter()
        .find(|(name, _)| normalize_name(name) == target)
        .map(|(_, records)| records.as_slice())
        .unwrap_or_default()
}
