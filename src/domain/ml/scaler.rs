use crate::domain::ml::feature_registry::FeatureVector;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Per-column standardization fitted on present values only.
///
/// Missing entries are skipped while fitting and pass through `transform`
/// untouched, so the regressor still sees them as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[FeatureVector], width: usize) -> Self {
        let mut means = Vec::with_capacity(width);
        let mut std_devs = Vec::with_capacity(width);

        for col in 0..width {
            let present: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get(col))
                .filter(|v| v.is_finite())
                .collect();

            let (mean, std_dev) = if present.is_empty() {
                (0.0, 1.0)
            } else {
                let data = Data::new(present);
                let mean = data.mean().filter(|m| m.is_finite()).unwrap_or(0.0);
                // Constant or single-valued columns keep unit scale.
                let std_dev = data
                    .std_dev()
                    .filter(|s| s.is_finite() && *s > f64::EPSILON)
                    .unwrap_or(1.0);
                (mean, std_dev)
            };
            means.push(mean);
            std_devs.push(std_dev);
        }

        Self { means, std_devs }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn scale_value(&self, col: usize, value: f64) -> f64 {
        let mean = self.means.get(col).copied().unwrap_or(0.0);
        let std_dev = self.std_devs.get(col).copied().unwrap_or(1.0);
        (value - mean) / std_dev
    }

    pub fn transform(&self, vector: &FeatureVector) -> FeatureVector {
        FeatureVector(
            vector
                .0
                .iter()
                .enumerate()
                .map(|(col, v)| v.map(|x| self.scale_value(col, x)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_ignores_missing_values() {
        let rows = vec![
            FeatureVector(vec![Some(1.0), None]),
            FeatureVector(vec![Some(3.0), None]),
            FeatureVector(vec![None, None]),
        ];
        let scaler = StandardScaler::fit(&rows, 2);

        assert!((scaler.means[0] - 2.0).abs() < 1e-12);
        assert!(scaler.std_devs[0] > 0.0);
        // Entirely missing column
        assert_eq!(scaler.means[1], 0.0);
        assert_eq!(scaler.std_devs[1], 1.0);
    }

    #[test]
    fn test_transform_preserves_missing() {
        let rows = vec![
            FeatureVector(vec![Some(10.0)]),
            FeatureVector(vec![Some(10.0)]),
        ];
        let scaler = StandardScaler::fit(&rows, 1);
        assert_eq!(scaler.std_devs[0], 1.0);

        let scaled = scaler.transform(&FeatureVector(vec![None]));
        assert_eq!(scaled.0[0], None);
        let scaled = scaler.transform(&FeatureVector(vec![Some(12.0)]));
        assert_eq!(scaled.0[0], Some(2.0));
    }
}
