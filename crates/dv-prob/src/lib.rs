//! Probability building blocks for dagviolations.
//!
//! - small numeric helpers (stable sigmoid, sample moments)
//! - samplers used by the synthetic data generator (column-major draws,
//!   subset selection without replacement, stochastic binarization)

pub mod math;
pub mod sampling;
