//! Instrumental variables: Wald ratio and Two-Stage Least Squares (2SLS).
//!
//! One instrument and one treatment use the Wald ratio `cov(Z, Y) / cov(Z, T)`.
//! Anything else goes through 2SLS with an intercept; the ATE is the sum of
//! the second-stage treatment coefficients.
//!
//! # References
//!
//! - Wooldridge, *Econometric Analysis of Cross Section and Panel Data*, Ch. 5.
//! - Stock & Yogo (2005), "Testing for weak instruments in linear IV regression."

use dv_core::{Error, Result};
use dv_prob::math::covariance;
use nalgebra::DVector;

use super::EstimationData;
use crate::linalg::{apply, cross, gram, validate_columns};

/// First-stage regression diagnostics.
#[derive(Debug, Clone)]
pub struct FirstStageResult {
    /// First-stage F-statistic (joint significance of excluded instruments).
    pub f_stat: f64,
    /// First-stage R².
    pub r_squared: f64,
    /// Whether F exceeds the Stock–Yogo 10% maximal IV size critical value.
    pub passes_stock_yogo_10: bool,
}

/// Result of a 2SLS regression.
#[derive(Debug, Clone)]
pub struct IvResult {
    /// Second-stage coefficients: intercept, then one per endogenous regressor.
    pub coefficients: Vec<f64>,
    /// First-stage diagnostics (one per endogenous regressor).
    pub first_stage: Vec<FirstStageResult>,
    /// Number of observations.
    pub n_obs: usize,
    /// Number of excluded instruments.
    pub n_instruments: usize,
}

/// Stock–Yogo 10% critical value for one endogenous regressor.
fn stock_yogo_cv(k_endog: usize, m: usize) -> f64 {
    match (k_endog, m) {
        (1, 1) => 16.38,
        (1, 2) => 19.93,
        _ => 10.0,
    }
}

/// Wald ratio estimate.
pub fn wald(y: &[f64], t: &[f64], z: &[f64]) -> Result<f64> {
    if y.len() != t.len() || y.len() != z.len() || y.len() < 2 {
        return Err(Error::Validation("Wald estimator needs >= 2 aligned rows".into()));
    }
    let czt = covariance(z, t);
    if !czt.is_finite() || czt.abs() < 1e-12 {
        return Err(Error::Computation(
            "instrument is uncorrelated with treatment (cov(Z, T) = 0)".into(),
        ));
    }
    Ok(covariance(z, y) / czt)
}

/// Two-Stage Least Squares with an intercept.
///
/// `x_endog` and `z` are column-major; `z.len() >= x_endog.len()` is required.
pub fn iv_2sls(y: &[f64], x_endog: &[Vec<f64>], z: &[Vec<f64>]) -> Result<IvResult> {
    let k_endog = x_endog.len();
    let m = z.len();
    if k_endog == 0 {
        return Err(Error::Validation("Must have at least 1 endogenous regressor".into()));
    }
    if m < k_endog {
        return Err(Error::Validation(format!(
            "Under-identified: {} instruments < {} endogenous regressors",
            m, k_endog
        )));
    }
    let n = validate_columns(x_endog, y)?;

    // Full instrument matrix: [1 | Z]
    let mut z_full: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
    z_full.push(vec![1.0; n]);
    z_full.extend(z.iter().cloned());
    validate_columns(&z_full, y)?;
    let k_full_z = z_full.len();
    let ztz_inv = gram(&z_full)
        .try_inverse()
        .ok_or_else(|| Error::Computation("Z'Z singular in 2SLS".into()))?;

    // ---- First stage: regress each endogenous var on [1 | Z] ----
    let mut first_stage = Vec::with_capacity(k_endog);
    let mut x_hat: Vec<Vec<f64>> = Vec::with_capacity(k_endog + 1);
    x_hat.push(vec![1.0; n]);
    for endog in x_endog {
        let gamma: DVector<f64> = &ztz_inv * cross(&z_full, endog);
        let fitted = apply(&z_full, &gamma);
        let rss: f64 = endog.iter().zip(&fitted).map(|(e, f)| (e - f).powi(2)).sum();
        let mean = endog.iter().sum::<f64>() / n as f64;
        // Restricted model is intercept-only, so its RSS is the TSS.
        let tss: f64 = endog.iter().map(|&v| (v - mean).powi(2)).sum();
        let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
        let f_stat = if rss > 0.0 && n > k_full_z {
            ((tss - rss) / m as f64) / (rss / (n - k_full_z) as f64)
        } else {
            f64::NAN
        };
        first_stage.push(FirstStageResult {
            f_stat,
            r_squared,
            passes_stock_yogo_10: f_stat > stock_yogo_cv(k_endog, m),
        });
        x_hat.push(fitted);
    }

    // ---- Second stage: regress y on [1 | X̂_endog] ----
    let xtx2_inv = gram(&x_hat)
        .try_inverse()
        .ok_or_else(|| Error::Computation("X'X singular in 2SLS second stage".into()))?;
    let beta2 = &xtx2_inv * cross(&x_hat, y);

    Ok(IvResult {
        coefficients: beta2.iter().copied().collect(),
        first_stage,
        n_obs: n,
        n_instruments: m,
    })
}

/// IV ATE over the instruments in `data`.
pub fn estimate_ate(data: &EstimationData) -> Result<f64> {
    if data.instruments.is_empty() {
        return Err(Error::Identification("no instrumental variables available".into()));
    }
    if data.treatments.is_empty() {
        return Err(Error::Validation("IV estimation needs at least one treatment".into()));
    }
    if data.treatments.len() == 1 && data.instruments.len() == 1 {
        return wald(&data.y, &data.treatments[0], &data.instruments[0]);
    }
    let res = iv_2sls(&data.y, &data.treatments, &data.instruments)?;
    for (j, fs) in res.first_stage.iter().enumerate() {
        if !fs.passes_stock_yogo_10 {
            tracing::warn!(treatment = j, f_stat = fs.f_stat, "weak instruments in first stage");
        }
    }
    Ok(res.coefficients[1..].iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::StandardNormal;

    #[test]
    fn test_iv_2sls_exact_identification() {
        // y = 1 + 2*x, x = 0.5*z
        let n = 100;
        let z: Vec<f64> = (0..n).map(|i| i as f64 / 10.0).collect();
        let x: Vec<f64> = z.iter().map(|zi| 0.5 * zi).collect();
        let y: Vec<f64> = x.iter().map(|xi| 1.0 + 2.0 * xi).collect();

        let res = iv_2sls(&y, &[x], &[z]).unwrap();
        assert_eq!(res.n_obs, n);
        assert_eq!(res.n_instruments, 1);
        assert_relative_eq!(res.coefficients[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(res.coefficients[1], 2.0, epsilon = 1e-6);
        assert!(res.first_stage[0].r_squared > 0.99);
    }

    #[test]
    fn test_wald_agrees_with_2sls_and_removes_confounding() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 20_000;
        let (mut y, mut t, mut z) = (Vec::new(), Vec::new(), Vec::new());
        for _ in 0..n {
            let u: f64 = rng.sample(StandardNormal);
            let zi: f64 = rng.random_range(0.0..1.0);
            let ti = 3.0 * zi + u + rng.sample::<f64, _>(StandardNormal);
            y.push(2.0 * ti + 4.0 * u);
            t.push(ti);
            z.push(zi);
        }
        let w = wald(&y, &t, &z).unwrap();
        let s = iv_2sls(&y, &[t.clone()], &[z.clone()]).unwrap();
        assert_relative_eq!(w, s.coefficients[1], epsilon = 1e-8);
        assert!((w - 2.0).abs() < 0.15, "wald={w}");
        assert!(s.first_stage[0].passes_stock_yogo_10);
    }

    #[test]
    fn test_under_identified() {
        let y = vec![1.0, 2.0, 3.0];
        let x = vec![vec![1.0, 2.0, 2.0], vec![3.0, 3.0, 4.0]];
        let z = vec![vec![0.5, 1.0, 1.5]];
        assert!(iv_2sls(&y, &x, &z).is_err());
    }

    #[test]
    fn test_missing_instruments_is_identification_error() {
        let data = EstimationData {
            y: vec![1.0, 2.0],
            treatments: vec![vec![0.0, 1.0]],
            ..Default::default()
        };
        assert!(matches!(estimate_ate(&data), Err(Error::Identification(_))));
    }

    #[test]
    fn test_uncorrelated_instrument() {
        let err = wald(&[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }
}
