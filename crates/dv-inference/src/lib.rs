//! # dv-inference
//!
//! Causal-effect estimation for dagviolations.
//!
//! This crate provides:
//! - Identification of back-door and instrumental-variable estimands on a
//!   causal graph
//! - Effect estimators (linear regression, propensity-score stratification,
//!   matching and weighting, Wald/2SLS instrumental variables)
//! - The Monte-Carlo simulation runner and the back-door / IV experiment
//!   families built on it
//!
//! ## Architecture
//!
//! Estimators see plain column vectors extracted by [`CausalModel`]; they know
//! nothing about graphs or tables.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Effect estimators and the tagged method enum.
pub mod estimators;
/// Back-door / IV experiment families.
pub mod experiment;
/// Estimand identification on a causal graph.
pub mod identification;
/// Small dense least-squares helpers.
pub mod linalg;
/// Causal model: data + graph + roles.
pub mod model;
/// Monte-Carlo simulation runner.
pub mod simulation;

pub use estimators::{CausalEstimate, EstimatorMethod, WeightingScheme};
pub use experiment::{DEFAULT_BETA, ExperimentConfig, ExperimentFamily, ExperimentOverrides, ResultRow, Scenario, run_experiment};
pub use identification::{IdentifiedEstimand, identify_effect};
pub use model::CausalModel;
pub use simulation::{EstimateRecord, SimulationConfig, simulate_dag_violations};
