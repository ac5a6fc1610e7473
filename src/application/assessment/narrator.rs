use crate::config::ServingEnvConfig;
use crate::domain::valuation::{
    ActualContract, Assessment, FairnessLabel, PredictionResult, TwoWayPrediction,
};

/// Turns a prediction into a fairness label and a short plain-language
/// summary. Holds only thresholds.
#[derive(Debug, Clone)]
pub struct AssessmentNarrator {
    band_pct: f64,
    low_confidence_threshold: f64,
}

impl AssessmentNarrator {
    pub fn new(band_pct: f64, low_confidence_threshold: f64) -> Self {
        Self {
            band_pct: band_pct.abs(),
            low_confidence_threshold,
        }
    }

    pub fn from_config(config: &ServingEnvConfig) -> Self {
        Self::new(config.fairness_band_pct, config.low_confidence_threshold)
    }

    pub fn assess(
        &self,
        prediction: &PredictionResult,
        actual: Option<&ActualContract>,
    ) -> Assessment {
        let predicted = prediction.at_signing.aav.point;
        let (label, deviation_pct) = classify(predicted, actual.map(|a| a.aav_millions), self.band_pct);

        let mut sentences = vec![self.summary(prediction, actual, label, deviation_pct)];
        sentences.push(drivers_sentence(prediction));
        sentences.push(extension_sentence(prediction));
        if let Some(note) = self.closing_note(prediction) {
            sentences.push(note);
        }

        Assessment {
            label,
            deviation_pct,
            sentences,
        }
    }

    /// Judges the signed contract against the summed role valuations.
    pub fn assess_two_way(
        &self,
        prediction: &TwoWayPrediction,
        actual: Option<&ActualContract>,
    ) -> Assessment {
        let (label, deviation_pct) = classify(
            prediction.combined_aav,
            actual.map(|a| a.aav_millions),
            self.band_pct,
        );

        let batting = prediction.batting.at_signing.aav.point;
        let pitching = prediction.pitching.at_signing.aav.point;
        let mut summary = format!(
            "Valued as a two-way player at ${:.1}M per year (${:.1}M batting plus ${:.1}M pitching).",
            prediction.combined_aav, batting, pitching
        );
        if let (Some(actual), Some(dev)) = (actual, deviation_pct) {
            summary.push_str(&format!(
                " The signed ${:.1}M AAV is {} ({:+.1}%).",
                actual.aav_millions, label, dev
            ));
        }

        let mut sentences = vec![summary, two_way_drivers_sentence(prediction)];
        let extensions =
            prediction.batting.extension_comparables() + prediction.pitching.extension_comparables();
        sentences.push(format!(
            "{} of the comparable contracts across both roles were pre-free-agency extensions.",
            extensions
        ));
        let confidence = prediction
            .batting
            .at_signing
            .confidence
            .min(prediction.pitching.at_signing.confidence);
        if confidence < self.low_confidence_threshold {
            sentences.push(low_confidence_sentence(confidence));
        } else if let Some(recent) = prediction.combined_recent_aav {
            sentences.push(format!(
                "On recent form the combined value would be ${:.1}M per year.",
                recent
            ));
        }

        Assessment {
            label,
            deviation_pct,
            sentences,
        }
    }

    fn summary(
        &self,
        prediction: &PredictionResult,
        actual: Option<&ActualContract>,
        label: FairnessLabel,
        deviation_pct: Option<f64>,
    ) -> String {
        let est = &prediction.at_signing;
        let mut s = format!(
            "Projected AAV of ${:.1}M (range ${:.1}M to ${:.1}M) over about {} years.",
            est.aav.point, est.aav.low, est.aav.high, est.length_years
        );
        if let (Some(actual), Some(dev)) = (actual, deviation_pct) {
            s.push_str(&format!(
                " The signed ${:.1}M AAV is {} ({:+.1}%).",
                actual.aav_millions, label, dev
            ));
        }
        s
    }

    fn closing_note(&self, prediction: &PredictionResult) -> Option<String> {
        let confidence = prediction.at_signing.confidence;
        if confidence < self.low_confidence_threshold {
            return Some(low_confidence_sentence(confidence));
        }
        let recent = prediction.recent.as_ref()?;
        let delta = recent.aav.point - prediction.at_signing.aav.point;
        Some(format!(
            "On recent form the value moves to ${:.1}M per year ({:+.1}M).",
            recent.aav.point, delta
        ))
    }
}

/// Labels `actual` against `predicted`: within `band_pct` percent either
/// way is fair value. Without an actual the label is `Projected`.
pub fn classify(
    predicted: f64,
    actual: Option<f64>,
    band_pct: f64,
) -> (FairnessLabel, Option<f64>) {
    let Some(actual) = actual else {
        return (FairnessLabel::Projected, None);
    };
    if !(predicted.is_finite() && predicted > 0.0 && actual.is_finite()) {
        return (FairnessLabel::Projected, None);
    }
    let deviation = (actual - predicted) / predicted * 100.0;
    let label = if deviation.abs() <= band_pct {
        FairnessLabel::FairValue
    } else if deviation > 0.0 {
        FairnessLabel::Overpaid
    } else {
        FairnessLabel::Underpaid
    };
    (label, Some(deviation))
}

const NO_DRIVERS: &str = "The model did not single out any feature as a main value driver.";

/// Top three attribution labels as prose, `None` when there are none.
fn driver_list(prediction: &PredictionResult) -> Option<String> {
    let labels: Vec<&str> = prediction
        .attributions
        .iter()
        .take(3)
        .map(|a| a.label.as_str())
        .collect();
    match labels.as_slice() {
        [] => None,
        [only] => Some((*only).to_string()),
        [init @ .., last] => Some(format!("{} and {}", init.join(", "), last)),
    }
}

fn drivers_sentence(prediction: &PredictionResult) -> String {
    match driver_list(prediction) {
        Some(list) => format!("The valuation is driven mainly by {}.", list),
        None => NO_DRIVERS.to_string(),
    }
}

fn two_way_drivers_sentence(prediction: &TwoWayPrediction) -> String {
    match (driver_list(&prediction.batting), driver_list(&prediction.pitching)) {
        (Some(bat), Some(pitch)) => format!(
            "Batting value is driven mainly by {}; pitching value by {}.",
            bat, pitch
        ),
        (Some(bat), None) => format!("Batting value is driven mainly by {}.", bat),
        (None, Some(pitch)) => format!("The pitching value is driven mainly by {}.", pitch),
        (None, None) => NO_DRIVERS.to_string(),
    }
}

fn extension_sentence(prediction: &PredictionResult) -> String {
    let total = prediction.comparables.len();
    match prediction.extension_comparables() {
        0 => format!("None of the {} comparable contracts were pre-free-agency extensions.", total),
        n => format!(
            "{} of the {} comparable contracts were pre-free-agency extensions, which tend to sign below market.",
            n, total
        ),
    }
}

fn low_confidence_sentence(confidence: f64) -> String {
    format!(
        "Confidence is low ({:.0}%), so treat the range as a rough guide.",
        confidence
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_band_edges() {
        assert_eq!(classify(10.0, None, 10.0), (FairnessLabel::Projected, None));
        let (label, dev) = classify(10.0, Some(11.0), 10.0);
        assert_eq!(label, FairnessLabel::FairValue);
        assert!((dev.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(classify(10.0, Some(12.0), 10.0).0, FairnessLabel::Overpaid);
        assert_eq!(classify(10.0, Some(8.0), 10.0).0, FairnessLabel::Underpaid);
    }

    #[test]
    fn test_classify_rejects_degenerate_prediction() {
        assert_eq!(classify(0.0, Some(5.0), 10.0), (FairnessLabel::Projected, None));
    }
}
