//! Experiment families: which confounding scenarios to simulate and which
//! estimators to compare on them.
//!
//! Each family has four scenarios. The injected effect is `s = 0.5·beta`
//! throughout and each affected group has exactly one member hit by `U`.

use std::fmt;
use std::str::FromStr;

use dv_core::{Error, Result};
use dv_data::ConfoundInjection;
use serde::{Deserialize, Serialize};

use crate::estimators::{EstimatorMethod, WeightingScheme};
use crate::simulation::{SimulationConfig, simulate_dag_violations};

/// Identification strategy under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperimentFamily {
    /// Back-door adjustment estimators.
    #[serde(rename = "backdoor")]
    Backdoor,
    /// Instrumental-variable estimator.
    #[serde(rename = "iv", alias = "instrumental_variable")]
    InstrumentalVariable,
}

impl ExperimentFamily {
    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Backdoor => "backdoor",
            Self::InstrumentalVariable => "iv",
        }
    }

    /// Methods compared by default.
    pub fn default_methods(self) -> Vec<EstimatorMethod> {
        match self {
            Self::Backdoor => vec![
                EstimatorMethod::LinearRegression,
                EstimatorMethod::stratification(),
                EstimatorMethod::PropensityScoreMatching,
                EstimatorMethod::weighting(WeightingScheme::IpsWeight),
            ],
            Self::InstrumentalVariable => vec![EstimatorMethod::instrumental_variable(["Z0"])],
        }
    }

    /// The four confounding scenarios for effect `beta`.
    pub fn scenarios(self, beta: f64) -> Vec<Scenario> {
        let s = 0.5 * beta;
        let on_y = ConfoundInjection { effect_on_y: s, ..Default::default() };
        let on_t = ConfoundInjection { num_t_affected: 1, effect_on_t: s, ..Default::default() };
        let on_w = ConfoundInjection { num_w_affected: 1, effect_on_w: s, ..Default::default() };
        let on_z = ConfoundInjection { num_z_affected: 1, effect_on_z: s, ..Default::default() };
        let both = |a: ConfoundInjection, b: ConfoundInjection| ConfoundInjection {
            num_w_affected: a.num_w_affected.max(b.num_w_affected),
            effect_on_w: a.effect_on_w + b.effect_on_w,
            num_z_affected: a.num_z_affected.max(b.num_z_affected),
            effect_on_z: a.effect_on_z + b.effect_on_z,
            num_t_affected: a.num_t_affected.max(b.num_t_affected),
            effect_on_t: a.effect_on_t + b.effect_on_t,
            effect_on_y: a.effect_on_y + b.effect_on_y,
        };
        match self {
            Self::Backdoor => vec![
                Scenario::new("outcome", on_y),
                Scenario::new("outcome_and_treatment", both(on_t, on_y)),
                Scenario::new("outcome_and_common_cause", both(on_w, on_y)),
                Scenario::new("treatment_and_common_cause", both(on_w, on_t)),
            ],
            Self::InstrumentalVariable => vec![
                Scenario::new("outcome", on_y),
                Scenario::new("outcome_and_treatment", both(on_t, on_y)),
                Scenario::new("outcome_and_instrument", both(on_z, on_y)),
                Scenario::new("treatment_and_instrument", both(on_z, on_t)),
            ],
        }
    }
}

impl fmt::Display for ExperimentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExperimentFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backdoor" => Ok(Self::Backdoor),
            "iv" | "instrumental_variable" => Ok(Self::InstrumentalVariable),
            other => Err(Error::Parse(format!("unknown experiment family '{other}'"))),
        }
    }
}

/// A labelled confound injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Label written to the `affected` column, e.g. `outcome_and_treatment`.
    pub affected: String,
    /// Injection parameters.
    #[serde(default)]
    pub confound: ConfoundInjection,
}

impl Scenario {
    /// New scenario.
    pub fn new(affected: impl Into<String>, confound: ConfoundInjection) -> Self {
        Self { affected: affected.into(), confound }
    }
}

/// A fully resolved experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Family being run.
    pub family: ExperimentFamily,
    /// True effect.
    pub beta: f64,
    /// Iterations per scenario.
    pub times: usize,
    /// Base seed; every scenario reuses it.
    pub seed: u64,
    /// Worker threads.
    pub threads: usize,
    /// Rows per dataset.
    pub num_samples: usize,
    /// Common causes per dataset.
    pub num_common_causes: usize,
    /// Instruments per dataset.
    pub num_instruments: usize,
    /// Methods in output order.
    pub methods: Vec<EstimatorMethod>,
    /// Scenarios in output order.
    pub scenarios: Vec<Scenario>,
}

/// True effect used by both experiment families unless overridden.
pub const DEFAULT_BETA: f64 = 10.0;

impl ExperimentConfig {
    /// Defaults for `family`: beta [`DEFAULT_BETA`], 100 iterations, 10000 rows, 5 common
    /// causes and 2 instruments.
    pub fn for_family(family: ExperimentFamily) -> Self {
        let beta = DEFAULT_BETA;
        Self {
            family,
            beta,
            times: 100,
            seed: 0,
            threads: 1,
            num_samples: 10_000,
            num_common_causes: 5,
            num_instruments: 2,
            methods: family.default_methods(),
            scenarios: family.scenarios(beta),
        }
    }

    /// Apply file overrides. Scenarios follow an overridden beta unless the
    /// file lists its own.
    pub fn apply(&mut self, o: ExperimentOverrides) -> Result<()> {
        if let Some(beta) = o.beta {
            self.set_beta(beta);
        }
        if let Some(v) = o.times {
            self.times = v;
        }
        if let Some(v) = o.seed {
            self.seed = v;
        }
        if let Some(v) = o.threads {
            self.threads = v;
        }
        if let Some(v) = o.num_samples {
            self.num_samples = v;
        }
        if let Some(v) = o.num_common_causes {
            self.num_common_causes = v;
        }
        if let Some(v) = o.num_instruments {
            self.num_instruments = v;
        }
        if let Some(methods) = o.methods {
            self.methods = methods.into_iter().map(MethodEntry::into_method).collect::<Result<_>>()?;
        }
        if let Some(scenarios) = o.scenarios {
            self.scenarios = scenarios;
        }
        Ok(())
    }

    /// Change beta and rescale the family's default scenarios.
    pub fn set_beta(&mut self, beta: f64) {
        self.beta = beta;
        self.scenarios = self.family.scenarios(beta);
    }

    fn simulation(&self, scenario: &Scenario) -> SimulationConfig {
        SimulationConfig {
            methods: self.methods.clone(),
            beta: self.beta,
            confound: scenario.confound,
            times: self.times,
            num_common_causes: self.num_common_causes,
            num_instruments: self.num_instruments,
            num_samples: self.num_samples,
            seed: self.seed,
            threads: self.threads,
            ..Default::default()
        }
    }
}

/// A method given either as a bare identifier or with options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MethodEntry {
    /// Identifier with default options.
    Name(String),
    /// Identifier plus options.
    Full(EstimatorMethod),
}

impl MethodEntry {
    fn into_method(self) -> Result<EstimatorMethod> {
        match self {
            Self::Name(s) => s.parse(),
            Self::Full(m) => Ok(m),
        }
    }
}

/// Experiment file contents; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentOverrides {
    /// True effect.
    pub beta: Option<f64>,
    /// Iterations per scenario.
    pub times: Option<usize>,
    /// Base seed.
    pub seed: Option<u64>,
    /// Worker threads.
    pub threads: Option<usize>,
    /// Rows per dataset.
    pub num_samples: Option<usize>,
    /// Common causes per dataset.
    pub num_common_causes: Option<usize>,
    /// Instruments per dataset.
    pub num_instruments: Option<usize>,
    /// Methods to compare.
    pub methods: Option<Vec<MethodEntry>>,
    /// Scenarios to run.
    pub scenarios: Option<Vec<Scenario>>,
}

/// One output row: estimate, method identifier and scenario label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Estimated effect.
    pub value: f64,
    /// Method identifier.
    pub method: String,
    /// Scenario label.
    pub affected: String,
}

/// Run every scenario and label the estimates. Rows are grouped by scenario
/// in configuration order.
pub fn run_experiment(config: &ExperimentConfig) -> Result<Vec<ResultRow>> {
    let mut rows = Vec::with_capacity(config.scenarios.len() * config.times * config.methods.len());
    for scenario in &config.scenarios {
        tracing::info!(
            family = %config.family,
            affected = %scenario.affected,
            times = config.times,
            "running scenario"
        );
        let records = simulate_dag_violations(&config.simulation(scenario))?;
        rows.extend(records.into_iter().map(|r| ResultRow {
            value: r.value,
            method: r.method,
            affected: scenario.affected.clone(),
        }));
    }
    Ok(rows)
}
