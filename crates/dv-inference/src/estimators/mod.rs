//! Effect estimators.
//!
//! Every method is a variant of [`EstimatorMethod`]. Identifiers follow the
//! `<strategy>.<estimator>` naming (`backdoor.linear_regression`,
//! `iv.instrumental_variable`, ...) and round-trip through `FromStr`/`Display`
//! and serde (`{"method": "<identifier>", ...options}`).

use std::fmt;
use std::str::FromStr;

use dv_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Instrumental variables (Wald / 2SLS).
pub mod iv;
/// Back-door linear regression.
pub mod linear_regression;
/// Propensity-score nearest-neighbour matching.
pub mod matching;
/// Logistic propensity model.
pub mod propensity;
/// Propensity-score stratification.
pub mod stratification;
/// Inverse propensity weighting.
pub mod weighting;

fn default_num_strata() -> usize {
    50
}

fn default_clipping_threshold() -> usize {
    10
}

fn default_min_ps_score() -> f64 {
    0.05
}

fn default_max_ps_score() -> f64 {
    0.95
}

/// Weight family for [`EstimatorMethod::PropensityScoreWeighting`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// Horvitz–Thompson: `1/ps` and `1/(1-ps)`, averaged over all rows.
    #[default]
    IpsWeight,
    /// Hájek: weights normalized within each arm.
    IpsNormalizedWeight,
    /// Weights multiplied by the marginal treatment probability, normalized within each arm.
    IpsStabilizedWeight,
}

/// Estimation method with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum EstimatorMethod {
    /// OLS of the outcome on treatments, back-door variables and effect modifiers.
    #[serde(rename = "backdoor.linear_regression")]
    LinearRegression,
    /// Equal-frequency strata on the propensity score.
    #[serde(rename = "backdoor.propensity_score_stratification")]
    PropensityScoreStratification {
        /// Number of strata.
        #[serde(default = "default_num_strata")]
        num_strata: usize,
        /// Minimum treated and control units for a stratum to be kept.
        #[serde(default = "default_clipping_threshold")]
        clipping_threshold: usize,
    },
    /// Nearest-neighbour matching on the propensity score.
    #[serde(rename = "backdoor.propensity_score_matching")]
    PropensityScoreMatching,
    /// Inverse propensity weighting.
    #[serde(rename = "backdoor.propensity_score_weighting")]
    PropensityScoreWeighting {
        /// Weight family.
        #[serde(default)]
        weighting_scheme: WeightingScheme,
        /// Lower clip for propensity scores.
        #[serde(default = "default_min_ps_score")]
        min_ps_score: f64,
        /// Upper clip for propensity scores.
        #[serde(default = "default_max_ps_score")]
        max_ps_score: f64,
    },
    /// Wald ratio (one instrument) or two-stage least squares.
    #[serde(rename = "iv.instrumental_variable")]
    InstrumentalVariable {
        /// Instrument column names; `None` uses the identified instruments.
        #[serde(default)]
        iv_instrument_name: Option<Vec<String>>,
    },
}

impl EstimatorMethod {
    /// Stratification with default options.
    pub fn stratification() -> Self {
        Self::PropensityScoreStratification {
            num_strata: default_num_strata(),
            clipping_threshold: default_clipping_threshold(),
        }
    }

    /// Weighting with default clipping and the given scheme.
    pub fn weighting(weighting_scheme: WeightingScheme) -> Self {
        Self::PropensityScoreWeighting {
            weighting_scheme,
            min_ps_score: default_min_ps_score(),
            max_ps_score: default_max_ps_score(),
        }
    }

    /// IV estimator restricted to the named instruments.
    pub fn instrumental_variable<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::InstrumentalVariable {
            iv_instrument_name: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Method identifier, e.g. `backdoor.linear_regression`.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::LinearRegression => "backdoor.linear_regression",
            Self::PropensityScoreStratification { .. } => "backdoor.propensity_score_stratification",
            Self::PropensityScoreMatching => "backdoor.propensity_score_matching",
            Self::PropensityScoreWeighting { .. } => "backdoor.propensity_score_weighting",
            Self::InstrumentalVariable { .. } => "iv.instrumental_variable",
        }
    }

    /// Whether the method adjusts via the back-door set.
    pub fn is_backdoor(&self) -> bool {
        !matches!(self, Self::InstrumentalVariable { .. })
    }

    /// Whether the method needs a propensity model (single binary treatment).
    pub fn uses_propensity(&self) -> bool {
        matches!(
            self,
            Self::PropensityScoreStratification { .. }
                | Self::PropensityScoreMatching
                | Self::PropensityScoreWeighting { .. }
        )
    }
}

impl fmt::Display for EstimatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for EstimatorMethod {
    type Err = Error;

    /// Parse an identifier into the method with default options.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "backdoor.linear_regression" => Ok(Self::LinearRegression),
            "backdoor.propensity_score_stratification" => Ok(Self::stratification()),
            "backdoor.propensity_score_matching" => Ok(Self::PropensityScoreMatching),
            "backdoor.propensity_score_weighting" => Ok(Self::weighting(WeightingScheme::default())),
            "iv.instrumental_variable" => Ok(Self::InstrumentalVariable { iv_instrument_name: None }),
            other => Err(Error::Parse(format!("unknown estimation method '{other}'"))),
        }
    }
}

/// Point estimate produced by one method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalEstimate {
    /// Estimated average treatment effect.
    pub value: f64,
    /// Method that produced it.
    pub method: EstimatorMethod,
    /// Rows used.
    pub n_obs: usize,
}

/// Columns handed to an estimator.
#[derive(Debug, Clone, Default)]
pub struct EstimationData {
    /// Outcome.
    pub y: Vec<f64>,
    /// Treatments (0/1 when binary).
    pub treatments: Vec<Vec<f64>>,
    /// Whether every treatment column is 0/1.
    pub treatment_is_binary: bool,
    /// Back-door adjustment columns.
    pub backdoor: Vec<Vec<f64>>,
    /// Effect-modifier columns.
    pub effect_modifiers: Vec<Vec<f64>>,
    /// Instrument columns.
    pub instruments: Vec<Vec<f64>>,
}

impl EstimationData {
    /// Number of rows.
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    /// The single binary treatment, or a validation error.
    pub fn binary_treatment(&self) -> Result<&[f64]> {
        if self.treatments.len() != 1 {
            return Err(Error::Validation(format!(
                "propensity-score estimators need exactly one treatment, got {}",
                self.treatments.len()
            )));
        }
        if !self.treatment_is_binary {
            return Err(Error::Validation(
                "propensity-score estimators need a binary treatment".into(),
            ));
        }
        Ok(&self.treatments[0])
    }
}

/// Run `method` on already-extracted columns.
pub fn estimate(data: &EstimationData, method: &EstimatorMethod) -> Result<f64> {
    match method {
        EstimatorMethod::LinearRegression => linear_regression::estimate_ate(data),
        EstimatorMethod::PropensityScoreStratification { num_strata, clipping_threshold } => {
            let t = data.binary_treatment()?;
            let ps = propensity::propensity_scores(&data.backdoor, t)?;
            stratification::estimate_ate(&data.y, t, &ps, *num_strata, *clipping_threshold)
        }
        EstimatorMethod::PropensityScoreMatching => {
            let t = data.binary_treatment()?;
            let ps = propensity::propensity_scores(&data.backdoor, t)?;
            matching::estimate_ate(&data.y, t, &ps)
        }
        EstimatorMethod::PropensityScoreWeighting { weighting_scheme, min_ps_score, max_ps_score } => {
            let t = data.binary_treatment()?;
            let ps = propensity::propensity_scores(&data.backdoor, t)?;
            weighting::estimate_ate(&data.y, t, &ps, *weighting_scheme, *min_ps_score, *max_ps_score)
        }
        EstimatorMethod::InstrumentalVariable { .. } => iv::estimate_ate(data),
    }
}
