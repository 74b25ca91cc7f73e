//! # dv-data
//!
//! Synthetic data for causal-estimator stress tests.
//!
//! - [`table`]: columnar table keyed by [`dv_core::ColumnId`]
//! - [`graph`]: causal graph with DOT and GML encodings
//! - [`dataset`]: linear structural-equation generator with an injectable
//!   unobserved confounder `U`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Linear dataset generator.
pub mod dataset;
/// Causal graph and its textual encodings.
pub mod graph;
/// Columnar table.
pub mod table;

pub use dataset::{
    AffectedMembers, ConfoundInjection, DatasetSpec, StructuralCoefficients, SyntheticDataset,
    generate_dataset,
};
pub use graph::{CausalGraph, GraphNode, LATENT_CONFOUNDER};
pub use table::{ColumnData, Table};
