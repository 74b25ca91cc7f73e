//! Inverse propensity weighting.

use dv_core::{Error, Result};

use super::WeightingScheme;

/// IPW ATE with scores clipped to `[min_ps, max_ps]`.
pub fn estimate_ate(
    y: &[f64],
    t: &[f64],
    ps: &[f64],
    scheme: WeightingScheme,
    min_ps: f64,
    max_ps: f64,
) -> Result<f64> {
    let n = y.len();
    if n == 0 || t.len() != n || ps.len() != n {
        return Err(Error::Validation("weighting inputs must be non-empty and aligned".into()));
    }
    if !(0.0 < min_ps && min_ps <= max_ps && max_ps < 1.0) {
        return Err(Error::Validation(format!(
            "propensity clip bounds must satisfy 0 < min <= max < 1, got [{min_ps}, {max_ps}]"
        )));
    }

    let n_treated = t.iter().filter(|&&v| v > 0.5).count();
    if n_treated == 0 || n_treated == n {
        return Err(Error::Computation(format!(
            "weighting needs both arms (treated={n_treated}, control={})",
            n - n_treated
        )));
    }
    let p_treat = n_treated as f64 / n as f64;
    let (stab_t, stab_c) = match scheme {
        WeightingScheme::IpsStabilizedWeight => (p_treat, 1.0 - p_treat),
        _ => (1.0, 1.0),
    };

    let (mut sum_wy_t, mut sum_w_t, mut sum_wy_c, mut sum_w_c) = (0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        let p = ps[i].clamp(min_ps, max_ps);
        if t[i] > 0.5 {
            let w = stab_t / p;
            sum_wy_t += w * y[i];
            sum_w_t += w;
        } else {
            let w = stab_c / (1.0 - p);
            sum_wy_c += w * y[i];
            sum_w_c += w;
        }
    }

    let ate = match scheme {
        WeightingScheme::IpsWeight => (sum_wy_t - sum_wy_c) / n as f64,
        WeightingScheme::IpsNormalizedWeight | WeightingScheme::IpsStabilizedWeight => {
            sum_wy_t / sum_w_t - sum_wy_c / sum_w_c
        }
    };
    Ok(ate)
}
