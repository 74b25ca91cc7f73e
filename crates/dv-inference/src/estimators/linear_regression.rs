//! Back-door adjustment by linear regression.
//!
//! Design: `[1, t_1..t_k, W, X, t_j·X_m]`. The ATE of moving every treatment
//! from 0 to 1 is `Σ_j (β_{t_j} + Σ_m β_{t_j·X_m} · mean(X_m))`.

use dv_core::{Error, Result};
use dv_prob::math::mean;

use super::EstimationData;
use crate::linalg::ols;

/// Fitted coefficients with their column layout.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Coefficients in design order.
    pub coefficients: Vec<f64>,
    /// Number of treatments.
    pub k_treatments: usize,
    /// Number of back-door columns.
    pub k_backdoor: usize,
    /// Number of effect modifiers.
    pub k_modifiers: usize,
}

impl LinearFit {
    /// Coefficient of treatment `j`.
    pub fn treatment_coef(&self, j: usize) -> f64 {
        self.coefficients[1 + j]
    }

    /// Coefficient of the `t_j · X_m` interaction.
    pub fn interaction_coef(&self, j: usize, m: usize) -> f64 {
        let base = 1 + self.k_treatments + self.k_backdoor + self.k_modifiers;
        self.coefficients[base + j * self.k_modifiers + m]
    }
}

/// Fit the regression.
pub fn fit(data: &EstimationData) -> Result<LinearFit> {
    let n = data.n_obs();
    if data.treatments.is_empty() {
        return Err(Error::Validation("linear regression needs at least one treatment".into()));
    }
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(
        1 + data.treatments.len() * (1 + data.effect_modifiers.len())
            + data.backdoor.len()
            + data.effect_modifiers.len(),
    );
    columns.push(vec![1.0; n]);
    columns.extend(data.treatments.iter().cloned());
    columns.extend(data.backdoor.iter().cloned());
    columns.extend(data.effect_modifiers.iter().cloned());
    for t in &data.treatments {
        for x in &data.effect_modifiers {
            columns.push(t.iter().zip(x).map(|(a, b)| a * b).collect());
        }
    }
    let coefficients = ols(&columns, &data.y)?;
    Ok(LinearFit {
        coefficients,
        k_treatments: data.treatments.len(),
        k_backdoor: data.backdoor.len(),
        k_modifiers: data.effect_modifiers.len(),
    })
}

/// ATE from the fitted regression.
pub fn estimate_ate(data: &EstimationData) -> Result<f64> {
    let fit = fit(data)?;
    let x_means: Vec<f64> = data.effect_modifiers.iter().map(|x| mean(x)).collect();
    let ate = (0..fit.k_treatments)
        .map(|j| {
            fit.treatment_coef(j)
                + x_means.iter().enumerate().map(|(m, xm)| fit.interaction_coef(j, m) * xm).sum::<f64>()
        })
        .sum();
    Ok(ate)
}
