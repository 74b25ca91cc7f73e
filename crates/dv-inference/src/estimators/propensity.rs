//! Logistic propensity model fitted by iteratively reweighted least squares.

use dv_core::{Error, Result};
use dv_prob::math::{mean, sigmoid};
use nalgebra::DMatrix;

use crate::linalg::{apply, cross, validate_columns};

const MAX_ITER: usize = 100;
const TOL: f64 = 1e-8;
/// Added to the Hessian diagonal so separated data still yields a finite fit.
const RIDGE: f64 = 1e-8;

/// Fit `P(t = 1 | X) = sigmoid(b0 + X b)`; returns `[b0, b...]`.
pub fn fit_logistic(features: &[Vec<f64>], t: &[f64]) -> Result<Vec<f64>> {
    if t.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(Error::Validation("treatment must contain only 0/1 values".into()));
    }
    let n = t.len();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(features.len() + 1);
    columns.push(vec![1.0; n]);
    columns.extend(features.iter().cloned());
    validate_columns(&columns, t)?;
    let p = columns.len();

    let mut beta = nalgebra::DVector::<f64>::zeros(p);
    let mut converged = false;
    for iter in 0..MAX_ITER {
        let eta = apply(&columns, &beta);
        let mu: Vec<f64> = eta.iter().map(|&e| sigmoid(e)).collect();
        let w: Vec<f64> = mu.iter().map(|&m| (m * (1.0 - m)).max(1e-12)).collect();
        let resid: Vec<f64> = t.iter().zip(&mu).map(|(ti, mi)| ti - mi).collect();
        let grad = cross(&columns, &resid);

        let mut h = DMatrix::<f64>::zeros(p, p);
        for a in 0..p {
            for b in a..p {
                let v: f64 = (0..n).map(|i| columns[a][i] * w[i] * columns[b][i]).sum();
                h[(a, b)] = v;
                h[(b, a)] = v;
            }
            h[(a, a)] += RIDGE;
        }
        let step = h.lu().solve(&grad).ok_or_else(|| {
            Error::Computation("logistic propensity fit failed (singular Hessian)".into())
        })?;
        beta += &step;
        let max_step = step.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        if !max_step.is_finite() {
            return Err(Error::Computation("logistic propensity fit diverged".into()));
        }
        if max_step < TOL {
            tracing::trace!(iter, "propensity IRLS converged");
            converged = true;
            break;
        }
    }
    if !converged {
        tracing::debug!(max_iter = MAX_ITER, "propensity IRLS hit the iteration cap");
    }
    Ok(beta.iter().copied().collect())
}

/// Fitted propensity scores. Without features the score is the treated share.
pub fn propensity_scores(features: &[Vec<f64>], t: &[f64]) -> Result<Vec<f64>> {
    if t.is_empty() {
        return Err(Error::Validation("treatment must be non-empty".into()));
    }
    if features.is_empty() {
        if t.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(Error::Validation("treatment must contain only 0/1 values".into()));
        }
        return Ok(vec![mean(t); t.len()]);
    }
    let beta = fit_logistic(features, t)?;
    let n = t.len();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(features.len() + 1);
    columns.push(vec![1.0; n]);
    columns.extend(features.iter().cloned());
    let eta = apply(&columns, &nalgebra::DVector::from_vec(beta));
    Ok(eta.into_iter().map(sigmoid).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_recovers_logit_coefficients() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let x: Vec<f64> = (0..n).map(|_| rng.random_range(-2.0..2.0)).collect();
        let t: Vec<f64> = x
            .iter()
            .map(|&xi| if rng.random_bool(sigmoid(0.5 + 1.5 * xi)) { 1.0 } else { 0.0 })
            .collect();
        let b = fit_logistic(&[x], &t).unwrap();
        assert!((b[0] - 0.5).abs() < 0.1, "b0={}", b[0]);
        assert!((b[1] - 1.5).abs() < 0.1, "b1={}", b[1]);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let t: Vec<f64> = (0..50).map(|i| if (i * 3) % 5 < 2 { 1.0 } else { 0.0 }).collect();
        let ps = propensity_scores(&[x], &t).unwrap();
        assert!(ps.iter().all(|&p| p > 0.0 && p < 1.0));
    }

    #[test]
    fn test_no_features_uses_share() {
        let ps = propensity_scores(&[], &[1.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(ps, vec![0.5; 4]);
    }

    #[test]
    fn test_rejects_non_binary() {
        assert!(fit_logistic(&[vec![1.0, 2.0]], &[0.0, 0.5]).is_err());
        assert!(propensity_scores(&[], &[2.0]).is_err());
    }
}
