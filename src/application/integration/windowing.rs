use crate::domain::records::{MetricSet, SeasonRecord};
use std::ops::RangeInclusive;

pub const WINDOW_SEASONS: i32 = 3;

/// Seasons that may describe a contract signed in `year_signed`.
/// The signing season itself is never included.
pub fn trailing_window(year_signed: i32) -> RangeInclusive<i32> {
    (year_signed - WINDOW_SEASONS)..=(year_signed - 1)
}

/// Per-metric average over a window, plus the seasons that fed it.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAggregate<M> {
    pub metrics: M,
    /// Ascending, distinct.
    pub seasons: Vec<i32>,
}

/// Averages every metric over the window seasons where it is present.
/// A metric absent from all of them stays missing. Returns `None` when no
/// record of the requested kind falls inside `years`.
pub fn aggregate_window<'a, M, F>(
    records: &'a [SeasonRecord],
    years: RangeInclusive<i32>,
    extract: F,
) -> Option<WindowAggregate<M>>
where
    M: MetricSet + 'a,
    F: Fn(&'a SeasonRecord) -> Option<&'a M>,
{
    let mut seasons = Vec::new();
    let mut lines: Vec<&M> = Vec::new();
    for record in records.iter().filter(|r| years.contains(&r.season)) {
        if let Some(metrics) = extract(record) {
            lines.push(metrics);
            seasons.push(record.season);
        }
    }
    if lines.is_empty() {
        return None;
    }
    seasons.sort_unstable();
    seasons.dedup();

    Some(WindowAggregate {
        metrics: average(&lines),
        seasons,
    })
}

fn average<M: MetricSet>(lines: &[&M]) -> M {
    let width = M::FIELDS.len();
    let mut sums = vec![0.0; width];
    let mut counts = vec![0usize; width];
    for line in lines {
        for (i, value) in line.values().into_iter().enumerate() {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                sums[i] += v;
                counts[i] += 1;
            }
        }
    }
    let averaged: Vec<Option<f64>> = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
        .collect();
    M::from_values(&averaged)
}
