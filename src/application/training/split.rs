use crate::domain::errors::TrainingError;
use crate::domain::player::Segment;
use crate::domain::valuation::TrainingExample;

/// Train / validation / test partition by signing year.
///
/// Every train year precedes the validation year, which precedes every
/// test year.
#[derive(Debug, Clone)]
pub struct TemporalSplit<'a> {
    pub train: Vec<&'a TrainingExample>,
    pub validation: Vec<&'a TrainingExample>,
    pub test: Vec<&'a TrainingExample>,
    pub train_years: Vec<i32>,
    pub validation_year: i32,
    pub test_years: Vec<i32>,
}

pub fn temporal_split<'a>(
    segment: Segment,
    examples: &[&'a TrainingExample],
    test_fraction: f64,
) -> Result<TemporalSplit<'a>, TrainingError> {
    let mut years: Vec<i32> = examples.iter().map(|e| e.year_signed).collect();
    years.sort_unstable();
    years.dedup();
    if years.len() < 3 {
        return Err(TrainingError::InsufficientSeasons {
            segment,
            distinct_years: years.len(),
        });
    }

    let count_in = |year: i32| examples.iter().filter(|e| e.year_signed == year).count();
    let target = (examples.len() as f64 * test_fraction).ceil() as usize;

    // Claim the most recent years for test, leaving at least two earlier years.
    let mut test_years = Vec::new();
    let mut test_count = 0;
    for &year in years.iter().rev() {
        if years.len() - test_years.len() <= 2 {
            break;
        }
        if !test_years.is_empty() && test_count >= target {
            break;
        }
        test_years.push(year);
        test_count += count_in(year);
    }
    test_years.reverse();

    let remaining = years.len() - test_years.len();
    let validation_year = years[remaining - 1];
    let train_years = years[..remaining - 1].to_vec();

    let split = TemporalSplit {
        train: examples
            .iter()
            .copied()
            .filter(|e| e.year_signed < validation_year)
            .collect(),
        validation: examples
            .iter()
            .copied()
            .filter(|e| e.year_signed == validation_year)
            .collect(),
        test: examples
            .iter()
            .copied()
            .filter(|e| e.year_signed > validation_year)
            .collect(),
        train_years,
        validation_year,
        test_years,
    };

    for (name, slice) in [
        ("train", &split.train),
        ("validation", &split.validation),
        ("test", &split.test),
    ] {
        if slice.is_empty() {
            return Err(TrainingError::EmptySplit {
                segment,
                split: name,
            });
        }
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::{BatterFeatures, SegmentFeatures, ValuationContext};
    use crate::domain::player::{Position, PositionGroup};
    use crate::domain::records::BattingMetrics;
    use crate::domain::valuation::MatchKind;

    fn example(year: i32) -> TrainingExample {
        TrainingExample {
            player_name: format!("P{}", year),
            matched_name: format!("P{}", year),
            match_kind: MatchKind::ExactNormalized,
            position: Position::Shortstop,
            year_signed: year,
            age_at_signing: 28,
            aav_millions: 10.0,
            length_years: 3,
            total_value_millions: 30.0,
            is_extension: false,
            seasons_used: vec![year - 1],
            features: SegmentFeatures::Batter(BatterFeatures {
                context: ValuationContext {
                    age: 28,
                    year_signed: Some(year),
                    seasons_with_data: Some(1),
                },
                group: PositionGroup::Shortstop,
                metrics: BattingMetrics::default(),
            }),
        }
    }

    #[test]
    fn test_split_is_strictly_ordered_in_time() {
        let examples: Vec<TrainingExample> = (2010..2020)
            .flat_map(|y| (0..5).map(move |_| example(y)))
            .collect();
        let refs: Vec<&TrainingExample> = examples.iter().collect();
        let split = temporal_split(Segment::Batter, &refs, 0.2).unwrap();

        assert_eq!(split.test_years, vec![2018, 2019]);
        assert_eq!(split.validation_year, 2017);
        assert_eq!(split.train_years.last(), Some(&2016));
        let max_train = split.train.iter().map(|e| e.year_signed).max().unwrap();
        let min_test = split.test.iter().map(|e| e.year_signed).min().unwrap();
        assert!(max_train < split.validation_year);
        assert!(split.validation_year < min_test);
        assert_eq!(
            split.train.len() + split.validation.len() + split.test.len(),
            examples.len()
        );
    }

    #[test]
    fn test_three_years_is_minimum() {
        let examples = vec![example(2020), example(2021)];
        let refs: Vec<&TrainingExample> = examples.iter().collect();
        let err = temporal_split(Segment::Batter, &refs, 0.2).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InsufficientSeasons {
                distinct_years: 2,
                ..
            }
        ));

        let examples = vec![example(2019), example(2020), example(2021)];
        let refs: Vec<&TrainingExample> = examples.iter().collect();
        let split = temporal_split(Segment::Batter, &refs, 0.9).unwrap();
        assert_eq!(split.train_years, vec![2019]);
        assert_eq!(split.validation_year, 2020);
        assert_eq!(split.test_years, vec![2021]);
    }
}
