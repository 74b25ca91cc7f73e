//! Box-plot artifact: estimates grouped by scenario (x axis) and method (hue).
//!
//! Quartiles use linear interpolation between order statistics; whiskers end
//! at the most extreme observations within 1.5·IQR of the box, anything beyond
//! is an outlier.

use dv_core::{Error, Result};
use dv_inference::ResultRow;
use serde::{Deserialize, Serialize};

/// Axis title for the scenario axis.
pub const X_LABEL: &str = "Affected variables";
/// Axis title for the estimate axis.
pub const Y_LABEL: &str = "Estimated treatment effect";

/// Method identifier without its strategy prefix.
pub fn display_method(method: &str) -> String {
    method
        .strip_prefix("backdoor.")
        .or_else(|| method.strip_prefix("iv."))
        .unwrap_or(method)
        .to_string()
}

/// Scenario label with underscores turned into spaces.
pub fn display_affected(affected: &str) -> String {
    affected.replace('_', " ")
}

/// Five-number summary plus outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Lower whisker end.
    pub whisker_low: f64,
    /// Upper whisker end.
    pub whisker_high: f64,
    /// Observations outside the whiskers.
    pub outliers: Vec<f64>,
    /// Mean of all observations.
    pub mean: f64,
    /// Number of observations.
    pub n: usize,
}

/// Linear-interpolated quantile of sorted data.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl BoxStats {
    /// Summarize `values`; fails on empty or non-finite input.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::Validation("box statistics need at least one value".into()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Validation("box statistics need finite values".into()));
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let inside = sorted.iter().copied().filter(|&v| v >= lo_fence && v <= hi_fence);
        let whisker_low = inside.clone().next().unwrap_or(q1);
        let whisker_high = inside.last().unwrap_or(q3);
        let outliers = sorted.iter().copied().filter(|&v| v < lo_fence || v > hi_fence).collect();
        Ok(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            n: sorted.len(),
        })
    }

    /// Smallest value drawn (whisker or outlier).
    pub fn min(&self) -> f64 {
        self.outliers.iter().copied().fold(self.whisker_low, f64::min)
    }

    /// Largest value drawn (whisker or outlier).
    pub fn max(&self) -> f64 {
        self.outliers.iter().copied().fold(self.whisker_high, f64::max)
    }
}

/// One box: a (scenario, method) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxGroup {
    /// Index into [`BoxPlotArtifact::categories`].
    pub category: usize,
    /// Index into [`BoxPlotArtifact::methods`].
    pub method: usize,
    /// Summary statistics.
    pub stats: BoxStats,
}

/// Plot-friendly grouped box plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotArtifact {
    /// Scenario display labels, in first-appearance order.
    pub categories: Vec<String>,
    /// Method display labels, in first-appearance order.
    pub methods: Vec<String>,
    /// Boxes, ordered by category then method.
    pub groups: Vec<BoxGroup>,
    /// True effect, drawn as a horizontal reference line.
    pub reference: Option<f64>,
    /// X axis title.
    pub x_label: String,
    /// Y axis title.
    pub y_label: String,
}

impl BoxPlotArtifact {
    /// Group result rows. Labels are normalized for display.
    pub fn from_rows(rows: &[ResultRow], reference: Option<f64>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Validation("box plot needs at least one result row".into()));
        }
        let mut categories: Vec<String> = Vec::new();
        let mut methods: Vec<String> = Vec::new();
        let mut values: Vec<Vec<Vec<f64>>> = Vec::new();
        for row in rows {
            let c = display_affected(&row.affected);
            let m = display_method(&row.method);
            let ci = match categories.iter().position(|x| *x == c) {
                Some(i) => i,
                None => {
                    categories.push(c);
                    values.push(vec![Vec::new(); methods.len()]);
                    categories.len() - 1
                }
            };
            let mi = match methods.iter().position(|x| *x == m) {
                Some(i) => i,
                None => {
                    methods.push(m);
                    for per_cat in values.iter_mut() {
                        per_cat.push(Vec::new());
                    }
                    methods.len() - 1
                }
            };
            values[ci][mi].push(row.value);
        }

        let mut groups = Vec::new();
        for (ci, per_cat) in values.iter().enumerate() {
            for (mi, vals) in per_cat.iter().enumerate() {
                if vals.is_empty() {
                    continue;
                }
                groups.push(BoxGroup { category: ci, method: mi, stats: BoxStats::from_values(vals)? });
            }
        }

        Ok(Self {
            categories,
            methods,
            groups,
            reference,
            x_label: X_LABEL.to_string(),
            y_label: Y_LABEL.to_string(),
        })
    }

    /// Data range covered by boxes, whiskers, outliers and the reference line.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for g in &self.groups {
            lo = lo.min(g.stats.min());
            hi = hi.max(g.stats.max());
        }
        if let Some(r) = self.reference {
            lo = lo.min(r);
            hi = hi.max(r);
        }
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(value: f64, method: &str, affected: &str) -> ResultRow {
        ResultRow { value, method: method.into(), affected: affected.into() }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(display_method("backdoor.propensity_score_matching"), "propensity_score_matching");
        assert_eq!(display_method("iv.instrumental_variable"), "instrumental_variable");
        assert_eq!(display_method("custom"), "custom");
        assert_eq!(display_affected("outcome_and_common_cause"), "outcome and common cause");
    }

    #[test]
    fn test_box_stats_known_sample() {
        let s = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0]).unwrap();
        assert_relative_eq!(s.q1, 3.0);
        assert_relative_eq!(s.median, 5.0);
        assert_relative_eq!(s.q3, 7.0);
        assert_relative_eq!(s.whisker_low, 1.0);
        assert_relative_eq!(s.whisker_high, 8.0);
        assert_eq!(s.outliers, vec![100.0]);
        assert_eq!(s.n, 9);
        assert_relative_eq!(s.max(), 100.0);
    }

    #[test]
    fn test_box_stats_interpolates() {
        let s = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_relative_eq!(s.q1, 1.75);
        assert_relative_eq!(s.median, 2.5);
        assert_relative_eq!(s.q3, 3.25);
        assert!(s.outliers.is_empty());

        let single = BoxStats::from_values(&[2.0]).unwrap();
        assert_eq!((single.q1, single.median, single.q3), (2.0, 2.0, 2.0));
        assert!(BoxStats::from_values(&[]).is_err());
        assert!(BoxStats::from_values(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_grouping_order() {
        let rows = vec![
            row(1.0, "backdoor.linear_regression", "outcome"),
            row(2.0, "backdoor.propensity_score_matching", "outcome"),
            row(3.0, "backdoor.linear_regression", "outcome_and_treatment"),
            row(4.0, "backdoor.propensity_score_matching", "outcome_and_treatment"),
            row(5.0, "backdoor.linear_regression", "outcome"),
        ];
        let art = BoxPlotArtifact::from_rows(&rows, Some(10.0)).unwrap();
        assert_eq!(art.categories, vec!["outcome", "outcome and treatment"]);
        assert_eq!(art.methods, vec!["linear_regression", "propensity_score_matching"]);
        assert_eq!(art.groups.len(), 4);
        assert_eq!(art.groups[0].stats.n, 2);
        assert_eq!((art.groups[3].category, art.groups[3].method), (1, 1));
        assert_eq!(art.value_range(), (1.0, 10.0));
        assert_eq!(art.x_label, X_LABEL);
    }

    #[test]
    fn test_sparse_groups_skipped() {
        let rows = vec![row(1.0, "a", "x"), row(2.0, "b", "y")];
        let art = BoxPlotArtifact::from_rows(&rows, None).unwrap();
        assert_eq!(art.groups.len(), 2);
        assert!(BoxPlotArtifact::from_rows(&[], None).is_err());
    }

    #[test]
    fn test_serialization() {
        let art = BoxPlotArtifact::from_rows(&[row(1.0, "a", "x")], Some(1.0)).unwrap();
        let json = serde_json::to_string(&art).unwrap();
        let back: BoxPlotArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, art);
    }
}
