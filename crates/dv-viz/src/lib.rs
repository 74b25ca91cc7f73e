//! # dv-viz
//!
//! Result tables and visualization data artifacts for dagviolations.
//!
//! This crate is intentionally dependency-light: it reads and writes the
//! tab-separated results file and turns rows into plot-friendly box-plot
//! statistics. Drawing lives in `dv-viz-render`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Box-plot statistics grouped by scenario and method.
pub mod boxplot;

/// Tab-separated results file.
pub mod results;

pub use boxplot::{BoxGroup, BoxPlotArtifact, BoxStats, display_affected, display_method};
pub use results::{read_results, read_results_path, write_results, write_results_path};
