//! Gradient-boosted regression trees with native missing-value routing.
//!
//! Trees are fitted to squared-loss residuals. Every split also learns a
//! default direction, and rows whose split feature is missing follow it.
//! Nothing is imputed. Row subsampling draws from a seeded `StdRng`, so a
//! fit is a pure function of its inputs and parameters.

use crate::domain::ml::feature_registry::FeatureVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of training rows drawn (without replacement) per round.
    pub subsample: f64,
    pub seed: u64,
    /// Stop after this many rounds without validation MAE improvement.
    pub early_stopping_rounds: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            learning_rate: 0.05,
            max_depth: 4,
            min_samples_leaf: 3,
            subsample: 0.8,
            seed: 42,
            early_stopping_rounds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        default_left: bool,
        gain: f64,
        left: usize,
        right: usize,
    },
}

/// Arena-allocated tree; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<Node>,
}

impl RegressionTree {
    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                    ..
                }) => {
                    let go_left = match row.get(*feature).filter(|v| v.is_finite()) {
                        Some(v) => v <= *threshold,
                        None => *default_left,
                    };
                    idx = if go_left { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    pub n_features: usize,
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
    /// Total split gain per feature, normalized to sum to 1.
    pub feature_importances: Vec<f64>,
}

impl GradientBoostedRegressor {
    /// Fits the ensemble. When a validation slice is given, the ensemble
    /// is truncated to the round with the lowest validation MAE.
    pub fn fit(
        rows: &[FeatureVector],
        targets: &[f64],
        validation: Option<(&[FeatureVector], &[f64])>,
        n_features: usize,
        params: &BoostingParams,
    ) -> Self {
        let n = rows.len().min(targets.len());
        let base_score = if n == 0 {
            0.0
        } else {
            targets[..n].iter().sum::<f64>() / n as f64
        };

        let mut model = Self {
            n_features,
            base_score,
            trees: Vec::new(),
            feature_importances: vec![0.0; n_features],
        };
        if n == 0 {
            return model;
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut train_pred = vec![base_score; n];
        let mut valid_pred: Vec<f64> = validation
            .map(|(v, _)| vec![base_score; v.len()])
            .unwrap_or_default();

        let mut best_mae = validation
            .map(|(_, y)| mean_absolute_error(&valid_pred, y))
            .unwrap_or(f64::INFINITY);
        let mut best_rounds = 0;
        let sample_size = ((n as f64 * params.subsample.clamp(0.0, 1.0)).ceil() as usize).clamp(1, n);
        let mut indices: Vec<usize> = (0..n).collect();

        for round in 0..params.n_estimators {
            let residuals: Vec<f64> = (0..n).map(|i| targets[i] - train_pred[i]).collect();

            let sample: Vec<usize> = if sample_size < n {
                indices.shuffle(&mut rng);
                let mut s = indices[..sample_size].to_vec();
                s.sort_unstable();
                s
            } else {
                (0..n).collect()
            };

            let tree = TreeBuilder::new(rows, &residuals, n_features, params).build(&sample);
            for (i, pred) in train_pred.iter_mut().enumerate() {
                *pred += tree.predict(&rows[i]);
            }
            model.trees.push(tree);

            if let Some((valid_rows, valid_targets)) = validation {
                if let Some(tree) = model.trees.last() {
                    for (i, pred) in valid_pred.iter_mut().enumerate() {
                        *pred += tree.predict(&valid_rows[i]);
                    }
                }
                let mae = mean_absolute_error(&valid_pred, valid_targets);
                if mae < best_mae - 1e-12 {
                    best_mae = mae;
                    best_rounds = round + 1;
                } else if round + 1 - best_rounds >= params.early_stopping_rounds.max(1) {
                    debug!(
                        "Early stopping at round {} (best {} with MAE {:.4})",
                        round + 1,
                        best_rounds,
                        best_mae
                    );
                    break;
                }
            } else {
                best_rounds = round + 1;
            }
        }

        model.trees.truncate(best_rounds);
        model.feature_importances = model.compute_importances();
        model
    }

    pub fn predict(&self, row: &FeatureVector) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn rounds(&self) -> usize {
        self.trees.len()
    }

    fn compute_importances(&self) -> Vec<f64> {
        let mut gains = vec![0.0; self.n_features];
        for tree in &self.trees {
            for node in &tree.nodes {
                if let Node::Split { feature, gain, .. } = node {
                    if let Some(slot) = gains.get_mut(*feature) {
                        *slot += gain.max(0.0);
                    }
                }
            }
        }
        let total: f64 = gains.iter().sum();
        if total > 0.0 {
            gains.iter_mut().for_each(|g| *g /= total);
        }
        gains
    }
}

pub fn mean_absolute_error(predictions: &[f64], targets: &[f64]) -> f64 {
    let n = predictions.len().min(targets.len());
    if n == 0 {
        return f64::INFINITY;
    }
    predictions
        .iter()
        .zip(targets)
        .map(|(p, y)| (p - y).abs())
        .sum::<f64>()
        / n as f64
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    default_left: bool,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [FeatureVector],
    residuals: &'a [f64],
    n_features: usize,
    max_depth: usize,
    min_leaf: usize,
    learning_rate: f64,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(
        rows: &'a [FeatureVector],
        residuals: &'a [f64],
        n_features: usize,
        params: &BoostingParams,
    ) -> Self {
        Self {
            rows,
            residuals,
            n_features,
            max_depth: params.max_depth,
            min_leaf: params.min_samples_leaf.max(1),
            learning_rate: params.learning_rate,
            nodes: Vec::new(),
        }
    }

    fn build(mut self, samples: &[usize]) -> RegressionTree {
        self.grow(samples, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn grow(&mut self, samples: &[usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let mean = if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(|&i| self.residuals[i]).sum::<f64>() / samples.len() as f64
        };
        self.nodes.push(Node::Leaf {
            value: self.learning_rate * mean,
        });

        if depth >= self.max_depth || samples.len() < 2 * self.min_leaf {
            return id;
        }
        let Some(split) = self.best_split(samples) else {
            return id;
        };

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) =
            samples.iter().copied().partition(|&i| {
                match self.rows[i].get(split.feature).filter(|v| v.is_finite()) {
                    Some(v) => v <= split.threshold,
                    None => split.default_left,
                }
            });

        let left = self.grow(&left_samples, depth + 1);
        let right = self.grow(&right_samples, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            default_left: split.default_left,
            gain: split.gain,
            left,
            right,
        };
        id
    }

    fn best_split(&self, samples: &[usize]) -> Option<SplitCandidate> {
        let total_n = samples.len() as f64;
        let total_sum: f64 = samples.iter().map(|&i| self.residuals[i]).sum();
        let parent_score = total_sum * total_sum / total_n;
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.n_features {
            let mut present: Vec<(f64, f64)> = Vec::with_capacity(samples.len());
            let mut missing_sum = 0.0;
            let mut missing_n = 0usize;
            for &i in samples {
                match self.rows[i].get(feature).filter(|v| v.is_finite()) {
                    Some(v) => present.push((v, self.residuals[i])),
                    None => {
                        missing_sum += self.residuals[i];
                        missing_n += 1;
                    }
                }
            }
            if present.len() < 2 {
                continue;
            }
            present.sort_by(|a, b| a.0.total_cmp(&b.0));

            let present_sum: f64 = present.iter().map(|p| p.1).sum();
            let mut left_sum = 0.0;
            let mut left_n = 0usize;

            for i in 1..present.len() {
                left_sum += present[i - 1].1;
                left_n += 1;
                if present[i].0 <= present[i - 1].0 {
                    continue;
                }
                let right_sum = present_sum - left_sum;
                let right_n = present.len() - left_n;
                let threshold = (present[i - 1].0 + present[i].0) / 2.0;

                let directions: &[bool] = if missing_n > 0 {
                    &[true, false]
                } else if left_n >= right_n {
                    &[true]
                } else {
                    &[false]
                };

                for &default_left in directions {
                    let (ls, ln, rs, rn) = if default_left {
                        (left_sum + missing_sum, left_n + missing_n, right_sum, right_n)
                    } else {
                        (left_sum, left_n, right_sum + missing_sum, right_n + missing_n)
                    };
                    if ln < self.min_leaf || rn < self.min_leaf {
                        continue;
                    }
                    let gain = ls * ls / ln as f64 + rs * rs / rn as f64 - parent_score;
                    let improves = match &best {
                        Some(b) => gain > b.gain + 1e-12,
                        None => gain > 1e-12,
                    };
                    if improves {
                        best = Some(SplitCandidate {
                            feature,
                            threshold,
                            default_left,
                            gain,
                        });
                    }
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<FeatureVector>, Vec<f64>) {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let x = i as f64;
            rows.push(FeatureVector(vec![Some(x), Some((i % 3) as f64)]));
            targets.push(if x < 20.0 { 5.0 } else { 25.0 });
        }
        (rows, targets)
    }

    fn params() -> BoostingParams {
        BoostingParams {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 2,
            subsample: 0.8,
            seed: 7,
            early_stopping_rounds: 20,
        }
    }

    #[test]
    fn test_fits_step_function() {
        let (rows, targets) = step_data();
        let model = GradientBoostedRegressor::fit(&rows, &targets, None, 2, &params());

        let low = model.predict(&FeatureVector(vec![Some(3.0), Some(0.0)]));
        let high = model.predict(&FeatureVector(vec![Some(35.0), Some(0.0)]));
        assert!((low - 5.0).abs() < 1.0, "low = {}", low);
        assert!((high - 25.0).abs() < 1.0, "high = {}", high);
        // Only the first column explains the target.
        assert!(model.feature_importances[0] > model.feature_importances[1]);
        let total: f64 = model.feature_importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_follow_learned_direction() {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..30 {
            rows.push(FeatureVector(vec![Some(i as f64)]));
            targets.push(if i < 15 { 1.0 } else { 10.0 });
        }
        // Missing rows behave like the high group.
        for _ in 0..10 {
            rows.push(FeatureVector(vec![None]));
            targets.push(10.0);
        }
        let model = GradientBoostedRegressor::fit(&rows, &targets, None, 1, &params());
        let missing = model.predict(&FeatureVector(vec![None]));
        assert!((missing - 10.0).abs() < 1.5, "missing = {}", missing);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, targets) = step_data();
        let a = GradientBoostedRegressor::fit(&rows, &targets, None, 2, &params());
        let b = GradientBoostedRegressor::fit(&rows, &targets, None, 2, &params());
        assert_eq!(a, b);
    }

    #[test]
    fn test_early_stopping_truncates_rounds() {
        let (rows, targets) = step_data();
        let valid_rows = vec![
            FeatureVector(vec![Some(2.0), Some(1.0)]),
            FeatureVector(vec![Some(30.0), Some(2.0)]),
        ];
        let valid_targets = vec![5.0, 25.0];
        let mut p = params();
        p.n_estimators = 1000;
        p.early_stopping_rounds = 5;

        let model = GradientBoostedRegressor::fit(
            &rows,
            &targets,
            Some((&valid_rows, &valid_targets)),
            2,
            &p,
        );
        assert!(model.rounds() < 1000);
        assert!(model.rounds() > 0);
    }

    #[test]
    fn test_empty_training_set_predicts_zero() {
        let model = GradientBoostedRegressor::fit(&[], &[], None, 3, &params());
        assert_eq!(model.predict(&FeatureVector(vec![None, None, None])), 0.0);
        assert_eq!(model.feature_importances, vec![0.0; 3]);
    }
}
