//! One-to-one nearest-neighbour matching on the propensity score, with
//! replacement, in both directions.

use dv_core::{Error, Result};

/// Mean of `y[i] - y[nearest opposite-arm row]` over the rows of one arm.
///
/// `pool` is sorted by propensity.
fn matched_effect(y: &[f64], ps: &[f64], units: &[usize], pool: &[usize]) -> f64 {
    let mut total = 0.0;
    for &i in units {
        let target = ps[i];
        let pos = pool.partition_point(|&j| ps[j] < target);
        let mut best = None::<usize>;
        for cand in [pos.checked_sub(1), Some(pos)].into_iter().flatten() {
            if let Some(&j) = pool.get(cand) {
                let better = match best {
                    Some(b) => (ps[j] - target).abs() < (ps[b] - target).abs(),
                    None => true,
                };
                if better {
                    best = Some(j);
                }
            }
        }
        if let Some(j) = best {
            total += y[i] - y[j];
        }
    }
    total / units.len() as f64
}

/// Matching ATE: `(n_t·ATT + n_c·ATC) / n`.
pub fn estimate_ate(y: &[f64], t: &[f64], ps: &[f64]) -> Result<f64> {
    let n = y.len();
    if n == 0 || t.len() != n || ps.len() != n {
        return Err(Error::Validation("matching inputs must be non-empty and aligned".into()));
    }
    let (mut treated, mut control): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| t[i] > 0.5);
    if treated.is_empty() || control.is_empty() {
        return Err(Error::Computation(format!(
            "matching needs both arms (treated={}, control={})",
            treated.len(),
            control.len()
        )));
    }
    treated.sort_by(|&a, &b| ps[a].total_cmp(&ps[b]));
    control.sort_by(|&a, &b| ps[a].total_cmp(&ps[b]));

    let att = matched_effect(y, ps, &treated, &control);
    // For controls the difference is y(matched treated) - y(control).
    let atc = -matched_effect(y, ps, &control, &treated);
    let (n_t, n_c) = (treated.len() as f64, control.len() as f64);
    Ok((n_t * att + n_c * atc) / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_pairs() {
        let ps = vec![0.2, 0.2, 0.6, 0.6];
        let t = vec![1.0, 0.0, 1.0, 0.0];
        let y = vec![3.0, 1.0, 7.0, 4.0];
        // ATT = ((3-1) + (7-4))/2 = 2.5, ATC the same.
        assert_relative_eq!(estimate_ate(&y, &t, &ps).unwrap(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nearest_neighbour_choice() {
        let ps = vec![0.50, 0.10, 0.48, 0.90];
        let t = vec![1.0, 0.0, 0.0, 0.0];
        let y = vec![10.0, 0.0, 4.0, 100.0];
        // Treated row 0 matches control row 2 (ps 0.48): ATT = 6.
        // Controls all match row 0: ATC = mean(10-0, 10-4, 10-100) = -24.666..
        let expected = (6.0 + 3.0 * ((10.0 + 6.0 - 90.0) / 3.0)) / 4.0;
        assert_relative_eq!(estimate_ate(&y, &t, &ps).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_single_arm_fails() {
        let err = estimate_ate(&[1.0, 2.0], &[1.0, 1.0], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }
}
