//! Propensity-score stratification.
//!
//! Rows are ranked by propensity and split into `num_strata` equal-frequency
//! strata. A stratum is kept only if it has at least `clipping_threshold`
//! treated and `clipping_threshold` control rows. The ATE is the
//! size-weighted mean of per-stratum treated/control differences.

use dv_core::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
struct Stratum {
    n_t: usize,
    n_c: usize,
    sum_t: f64,
    sum_c: f64,
}

impl Stratum {
    fn size(&self) -> usize {
        self.n_t + self.n_c
    }

    fn diff(&self) -> f64 {
        self.sum_t / self.n_t as f64 - self.sum_c / self.n_c as f64
    }
}

/// Stratum index of every row (0-based, ordered by propensity).
pub fn assign_strata(ps: &[f64], num_strata: usize) -> Vec<usize> {
    let n = ps.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| ps[a].total_cmp(&ps[b]));
    let mut strata = vec![0; n];
    for (rank, &i) in order.iter().enumerate() {
        strata[i] = rank * num_strata / n;
    }
    strata
}

/// Stratified ATE.
pub fn estimate_ate(
    y: &[f64],
    t: &[f64],
    ps: &[f64],
    num_strata: usize,
    clipping_threshold: usize,
) -> Result<f64> {
    let n = y.len();
    if n == 0 || t.len() != n || ps.len() != n {
        return Err(Error::Validation(format!(
            "stratification inputs must be non-empty and aligned (y={}, t={}, ps={})",
            n,
            t.len(),
            ps.len()
        )));
    }
    if num_strata == 0 {
        return Err(Error::Validation("num_strata must be > 0".into()));
    }

    let mut strata = vec![Stratum::default(); num_strata.min(n)];
    for (i, s) in assign_strata(ps, strata.len()).into_iter().enumerate() {
        let st = &mut strata[s];
        if t[i] > 0.5 {
            st.n_t += 1;
            st.sum_t += y[i];
        } else {
            st.n_c += 1;
            st.sum_c += y[i];
        }
    }

    let min = clipping_threshold.max(1);
    let kept: Vec<&Stratum> = strata.iter().filter(|s| s.n_t >= min && s.n_c >= min).collect();
    if kept.is_empty() {
        return Err(Error::Computation(format!(
            "no stratum has at least {min} treated and {min} control units"
        )));
    }
    let dropped = strata.len() - kept.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = kept.len(), "dropped strata below clipping threshold");
    }
    let total: usize = kept.iter().map(|s| s.size()).sum();
    let ate = kept.iter().map(|s| s.size() as f64 / total as f64 * s.diff()).sum();
    Ok(ate)
}
