//! Flat CSV inputs produced by the collection layer.
//!
//! Seasons: `player_name, season, segment, age, team, <metric columns>`.
//! Only the metric columns of the row's segment are read; blank cells and
//! `NA` stay missing. Contracts map straight onto `ContractRecord`.

use crate::domain::player::Segment;
use crate::domain::records::{
    BattingMetrics, ContractRecord, MetricSet, PitchingMetrics, SeasonLine, SeasonRecord,
};
use anyhow::{Context, Result, anyhow};
use csv::StringRecord;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Seasons grouped by the player name as written in the source.
pub type SeasonsByPlayer = BTreeMap<String, Vec<SeasonRecord>>;

pub fn load_seasons(path: &Path) -> Result<SeasonsByPlayer> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open seasons file {:?}", path))?;
    let seasons = read_seasons(reader).with_context(|| format!("Failed to read {:?}", path))?;
    info!(
        "Loaded {} season lines for {} players from {:?}",
        seasons.values().map(Vec::len).sum::<usize>(),
        seasons.len(),
        path
    );
    Ok(seasons)
}

pub fn read_seasons<R: Read>(mut reader: csv::Reader<R>) -> Result<SeasonsByPlayer> {
    let headers = reader.headers().context("Missing header row")?.clone();
    let columns: Columns<'_> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();

    let mut by_player = SeasonsByPlayer::new();
    for (row, record) in reader.records().enumerate() {
        // Header is line 1
        let line = row + 2;
        let record = record.with_context(|| format!("Malformed CSV at line {}", line))?;
        let season = parse_season_row(&record, &columns)
            .with_context(|| format!("Invalid season row at line {}", line))?;
        by_player
            .entry(season.player_name.clone())
            .or_default()
            .push(season);
    }
    for seasons in by_player.values_mut() {
        seasons.sort_by_key(|s| (s.season, s.segment()));
    }
    Ok(by_player)
}

type Columns<'h> = HashMap<&'h str, usize>;

/// Trimmed cell value, `None` for absent columns, blanks and `NA`.
fn cell<'r>(record: &'r StringRecord, columns: &Columns<'_>, name: &str) -> Option<&'r str> {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("na"))
}

fn parse_season_row(record: &StringRecord, columns: &Columns<'_>) -> Result<SeasonRecord> {
    let get = |name: &str| cell(record, columns, name);

    let player_name = get("player_name")
        .ok_or_else(|| anyhow!("player_name is empty"))?
        .to_string();
    let season: i32 = get("season")
        .ok_or_else(|| anyhow!("season is empty"))?
        .parse()
        .context("Failed to parse season")?;
    let segment: Segment = get("segment")
        .ok_or_else(|| anyhow!("segment is empty"))?
        .parse()?;
    let age = get("age")
        .map(|v| v.parse::<f64>().map(|a| a.round() as u32))
        .transpose()
        .context("Failed to parse age")?;
    let team = get("team").map(str::to_string);

    let line = match segment {
        Segment::Batter => SeasonLine::Batting(metrics_from_row::<BattingMetrics>(record, columns)?),
        Segment::Pitcher => {
            SeasonLine::Pitching(metrics_from_row::<PitchingMetrics>(record, columns)?)
        }
    };

    Ok(SeasonRecord {
        player_name,
        season,
        age,
        team,
        line,
    })
}

fn metrics_from_row<M: MetricSet>(record: &StringRecord, columns: &Columns<'_>) -> Result<M> {
    let values = M::FIELDS
        .iter()
        .map(|field| {
            cell(record, columns, field)
                .map(|v| v.trim_end_matches('%').parse::<f64>())
                .transpose()
                .with_context(|| format!("Failed to parse {}", field))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(M::from_values(&values))
}

pub fn load_contracts(path: &Path) -> Result<Vec<ContractRecord>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open contracts file {:?}", path))?;
    let contracts = read_contracts(reader).with_context(|| format!("Failed to read {:?}", path))?;
    info!("Loaded {} contracts from {:?}", contracts.len(), path);
    Ok(contracts)
}

pub fn read_contracts<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<ContractRecord>> {
    reader
        .deserialize::<ContractRecord>()
        .enumerate()
        .map(|(row, record)| record.with_context(|| format!("Invalid contract row at line {}", row + 2)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn test_reads_segment_specific_metrics() {
        let data = "\
player_name,season,segment,age,team,war,wrc_plus,avg,era,fip,whiff_percent
Corey Seager,2021,batter,27,LAD,3.8,147,.306,,,
Shohei Ohtani,2021,batter,26,LAA,4.9,152,.257,,,
Shohei Ohtani,2021,pitcher,26,LAA,3.1,,,3.18,3.55,NA
";
        let seasons = read_seasons(reader(data)).unwrap();
        assert_eq!(seasons.len(), 2);

        let seager = &seasons["Corey Seager"][0];
        let batting = seager.batting().unwrap();
        assert_eq!(batting.wrc_plus, Some(147.0));
        assert_eq!(batting.obp, None);
        assert_eq!(seager.team.as_deref(), Some("LAD"));

        let ohtani = &seasons["Shohei Ohtani"];
        assert_eq!(ohtani.len(), 2);
        let pitching = ohtani[1].pitching().unwrap();
        assert_eq!(pitching.era, Some(3.18));
        assert_eq!(pitching.whiff_percent, None);
    }

    #[test]
    fn test_rejects_unknown_segment() {
        let data = "player_name,season,segment\nSomeone,2020,catcher\n";
        assert!(read_seasons(reader(data)).is_err());
    }

    #[test]
    fn test_reads_currency_strings() {
        let data = "\
player_name,position,year_signed,age_at_signing,aav,length,total_value,is_extension
Corey Seager,SS,2022,27,\"$32,500,000\",10,\"$325,000,000\",false
Wander Franco,SS,2022,20,16500000,11,182000000,
";
        let contracts = read_contracts(reader(data)).unwrap();
        assert_eq!(contracts.len(), 2);
        assert_eq!(contracts[0].aav, dec!(32500000));
        assert_eq!(contracts[0].is_extension, Some(false));
        assert_eq!(contracts[1].is_extension, None);
        assert!(contracts[1].likely_extension());
    }
}
