// ============================================================
// Layer 3: Scoring
// ============================================================
// The one metric every model is judged by.
//
// Reference: Rust Book §13 (Iterators)

use anyhow::{bail, Result};
use ndarray::Array1;

/// Root mean squared error: `sqrt(mean((truth - pred)^2))`.
pub fn rmse(truth: &Array1<f64>, pred: &Array1<f64>) -> Result<f64> {
    if truth.len() != pred.len() {
        bail!(
            "cannot score {} predictions against {} targets",
            pred.len(),
            truth.len()
        );
    }
    if truth.is_empty() {
        bail!("cannot score an empty prediction set");
    }

    let sse: f64 = truth
        .iter()
        .zip(pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    Ok((sse / truth.len() as f64).sqrt())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rmse_known_values() {
        // errors 1, -1, 3 → mse = 11/3
        let truth = array![1.0, 2.0, 3.0];
        let pred  = array![0.0, 3.0, 0.0];
        let got   = rmse(&truth, &pred).unwrap();
        assert!((got - (11.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_perfect_is_zero() {
        let v = array![4.0, 5.0];
        assert_eq!(rmse(&v, &v).unwrap(), 0.0);
    }

    #[test]
    fn test_rmse_rejects_mismatch_and_empty() {
        assert!(rmse(&array![1.0], &array![1.0, 2.0]).is_err());
        assert!(rmse(&Array1::zeros(0), &Array1::zeros(0)).is_err());
    }
}
