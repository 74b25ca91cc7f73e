//! Monte-Carlo runner: repeatedly generate a dataset with a given confound
//! injection and collect one point estimate per method.
//!
//! Iteration `i` draws its dataset from an RNG seeded with
//! `seed.wrapping_add(i)`, so results do not depend on the thread count.

use dv_core::{Error, Result};
use dv_data::{ConfoundInjection, DatasetSpec, generate_dataset};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::estimators::EstimatorMethod;
use crate::model::CausalModel;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Methods evaluated on every dataset, in output order.
    pub methods: Vec<EstimatorMethod>,
    /// True per-treatment effect.
    pub beta: f64,
    /// Unobserved-confounder injection.
    pub confound: ConfoundInjection,
    /// Number of datasets.
    pub times: usize,
    /// Number of common causes.
    pub num_common_causes: usize,
    /// Number of instruments.
    pub num_instruments: usize,
    /// Number of effect modifiers.
    pub num_effect_modifiers: usize,
    /// Number of treatments.
    pub num_treatments: usize,
    /// Rows per dataset.
    pub num_samples: usize,
    /// Base seed.
    pub seed: u64,
    /// Worker threads (`1` = sequential, `0` = rayon's global pool).
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            beta: 10.0,
            confound: ConfoundInjection::none(),
            times: 100,
            num_common_causes: 5,
            num_instruments: 2,
            num_effect_modifiers: 0,
            num_treatments: 1,
            num_samples: 10_000,
            seed: 0,
            threads: 1,
        }
    }
}

impl SimulationConfig {
    /// Dataset parameters for every iteration.
    pub fn dataset_spec(&self) -> DatasetSpec {
        DatasetSpec {
            beta: self.beta,
            num_samples: self.num_samples,
            num_common_causes: self.num_common_causes,
            num_instruments: self.num_instruments,
            num_effect_modifiers: self.num_effect_modifiers,
            num_treatments: self.num_treatments,
            treatment_is_binary: true,
            outcome_is_binary: false,
            confound: self.confound,
        }
    }
}

/// One point estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateRecord {
    /// Iteration index.
    pub iteration: usize,
    /// Estimated effect.
    pub value: f64,
    /// Method identifier.
    pub method: String,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

fn run_iteration(config: &SimulationConfig, spec: &DatasetSpec, i: usize) -> Result<Vec<EstimateRecord>> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
    let ds = generate_dataset(spec, &mut rng)?;
    let model = CausalModel::from_dataset(&ds, true)?;
    let estimand = model.identify_effect()?;
    config
        .methods
        .iter()
        .map(|method| {
            let est = model.estimate_effect(&estimand, method)?;
            Ok(EstimateRecord { iteration: i, value: est.value, method: method.to_string() })
        })
        .collect()
}

/// Run `times` iterations and return `times × methods.len()` records ordered
/// by iteration, then by method.
///
/// Any failing iteration aborts the run.
pub fn simulate_dag_violations(config: &SimulationConfig) -> Result<Vec<EstimateRecord>> {
    if config.methods.is_empty() {
        return Err(Error::Validation("at least one estimation method is required".into()));
    }
    let spec = config.dataset_spec();
    spec.validate()?;
    let start = std::time::Instant::now();

    let per_iteration: Vec<Vec<EstimateRecord>> = if config.threads == 1 {
        (0..config.times).map(|i| run_iteration(config, &spec, i)).collect::<Result<_>>()?
    } else {
        let run = || -> Result<Vec<Vec<EstimateRecord>>> {
            (0..config.times).into_par_iter().map(|i| run_iteration(config, &spec, i)).collect()
        };
        if config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| Error::Computation(format!("failed to create thread pool: {e}")))?;
            pool.install(run)?
        } else {
            run()?
        }
    };

    let records: Vec<EstimateRecord> = per_iteration.into_iter().flatten().collect();
    tracing::info!(
        times = config.times,
        methods = config.methods.len(),
        records = records.len(),
        wall_s = start.elapsed().as_secs_f64(),
        "simulation finished"
    );
    Ok(records)
}
