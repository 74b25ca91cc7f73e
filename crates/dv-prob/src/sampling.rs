//! Samplers for synthetic data generation.
//!
//! All samplers take an explicit RNG; nothing here touches global random state.
//! Matrices are column-major: `Vec<column>`, each column of length `n`.

use dv_core::{Error, Result};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::math::sigmoid;

/// `n` draws from `N(0, 1)`.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// `n` draws from `U(lo, hi)`.
///
/// A degenerate range (`hi <= lo`) yields `lo` everywhere, which is what a
/// zero true effect produces for coefficient ranges scaled by it.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, n: usize, lo: f64, hi: f64) -> Result<Vec<f64>> {
    if !lo.is_finite() || !hi.is_finite() {
        return Err(Error::Validation(format!("uniform bounds must be finite: [{lo}, {hi})")));
    }
    if hi <= lo {
        return Ok(vec![lo; n]);
    }
    let dist = Uniform::new(lo, hi)
        .map_err(|e| Error::Validation(format!("invalid uniform range [{lo}, {hi}): {e}")))?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// `n` samples from a multivariate normal with the given means and identity covariance.
///
/// Returns one column per mean.
pub fn multivariate_normal_identity<R: Rng + ?Sized>(
    rng: &mut R,
    means: &[f64],
    n: usize,
) -> Vec<Vec<f64>> {
    let mut cols: Vec<Vec<f64>> = means.iter().map(|_| Vec::with_capacity(n)).collect();
    // Row-wise draw order, one sample vector at a time.
    for _ in 0..n {
        for (col, &mu) in cols.iter_mut().zip(means) {
            col.push(mu + rng.sample::<f64, _>(StandardNormal));
        }
    }
    cols
}

/// Choose `amount` distinct indices from `0..len`, uniformly at random.
pub fn choose_without_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    amount: usize,
) -> Result<Vec<usize>> {
    if amount > len {
        return Err(Error::Validation(format!(
            "cannot choose {amount} distinct members from a group of {len}"
        )));
    }
    Ok(rand::seq::index::sample(rng, len, amount).into_vec())
}

/// Stochastic binarization: `true` with probability `sigmoid(x)`.
#[inline]
pub fn stochastic_binary<R: Rng + ?Sized>(rng: &mut R, x: f64) -> bool {
    let p = sigmoid(x);
    if p.is_nan() {
        return false;
    }
    rng.random_bool(p.clamp(0.0, 1.0))
}
