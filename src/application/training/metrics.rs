/// Regression accuracy over one held-out slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionScores {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

pub fn regression_scores(predictions: &[f64], actuals: &[f64]) -> RegressionScores {
    let n = predictions.len().min(actuals.len());
    if n == 0 {
        return RegressionScores {
            mae: 0.0,
            rmse: 0.0,
            r2: 0.0,
        };
    }
    let nf = n as f64;
    let pairs = || predictions.iter().zip(actuals.iter()).take(n);

    let mae = pairs().map(|(p, a)| (p - a).abs()).sum::<f64>() / nf;
    let ss_res: f64 = pairs().map(|(p, a)| (p - a).powi(2)).sum();
    let mean = actuals[..n].iter().sum::<f64>() / nf;
    let ss_tot: f64 = actuals[..n].iter().map(|a| (a - mean).powi(2)).sum();

    let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    RegressionScores {
        mae,
        rmse: (ss_res / nf).sqrt(),
        r2,
    }
}

/// Fraction of predictions within `tolerance` (inclusive) of the truth.
pub fn within_tolerance(predictions: &[f64], actuals: &[f64], tolerance: f64) -> f64 {
    let n = predictions.len().min(actuals.len());
    if n == 0 {
        return 0.0;
    }
    let hits = predictions
        .iter()
        .zip(actuals)
        .filter(|(p, a)| (*p - *a).abs() <= tolerance)
        .count();
    hits as f64 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = [1.0, 2.0, 3.0];
        let s = regression_scores(&y, &y);
        assert_eq!(s.mae, 0.0);
        assert_eq!(s.rmse, 0.0);
        assert_eq!(s.r2, 1.0);
        assert_eq!(within_tolerance(&y, &y, 0.0), 1.0);
    }

    #[test]
    fn test_known_errors() {
        let p = [2.0, 2.0, 2.0, 2.0];
        let a = [1.0, 3.0, 1.0, 9.0];
        let s = regression_scores(&p, &a);
        assert!((s.mae - 2.5).abs() < 1e-12);
        assert!((s.rmse - (52.0f64 / 4.0).sqrt()).abs() < 1e-12);
        assert!(s.r2 < 0.0);
        assert_eq!(within_tolerance(&p, &a, 1.0), 0.75);
    }
}
