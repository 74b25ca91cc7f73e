//! Column-oriented least squares on top of `nalgebra`.

use dv_core::{Error, Result};
use nalgebra::{DMatrix, DVector};

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

/// Check that every column has `n` finite rows and return `n`.
pub fn validate_columns(columns: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    let n = y.len();
    if n == 0 {
        return Err(Error::Validation("y must be non-empty".to_string()));
    }
    if columns.is_empty() {
        return Err(Error::Validation("design must have at least 1 column".to_string()));
    }
    for (j, c) in columns.iter().enumerate() {
        if c.len() != n {
            return Err(Error::Validation(format!(
                "design column {j} has {} rows, expected {n}",
                c.len()
            )));
        }
        if c.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation(format!("design column {j} has non-finite values")));
        }
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(Error::Validation("y must contain only finite values".to_string()));
    }
    Ok(n)
}

/// Gram matrix `X^T X` of a column-major design.
pub fn gram(columns: &[Vec<f64>]) -> DMatrix<f64> {
    let p = columns.len();
    let mut xtx = DMatrix::zeros(p, p);
    for a in 0..p {
        for b in a..p {
            let v = dot(&columns[a], &columns[b]);
            xtx[(a, b)] = v;
            xtx[(b, a)] = v;
        }
    }
    xtx
}

/// `X^T v` for a column-major design.
pub fn cross(columns: &[Vec<f64>], v: &[f64]) -> DVector<f64> {
    DVector::from_iterator(columns.len(), columns.iter().map(|c| dot(c, v)))
}

/// `X b` for a column-major design.
pub fn apply(columns: &[Vec<f64>], b: &DVector<f64>) -> Vec<f64> {
    let n = columns.first().map_or(0, Vec::len);
    let mut out = vec![0.0; n];
    for (c, &bj) in columns.iter().zip(b.iter()) {
        for (o, &x) in out.iter_mut().zip(c) {
            *o += x * bj;
        }
    }
    out
}

/// Ordinary least squares via the normal equations `(X^T X) b = X^T y`.
///
/// No intercept is added; include a column of ones if one is wanted.
pub fn ols(columns: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    validate_columns(columns, y)?;
    let xtx = gram(columns);
    let xty = cross(columns, y);
    let sol = xtx
        .lu()
        .solve(&xty)
        .ok_or_else(|| Error::Computation("OLS solve failed (singular XtX)".to_string()))?;
    Ok(sol.iter().copied().collect())
}
