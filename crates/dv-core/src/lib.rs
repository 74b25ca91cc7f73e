//! # dv-core
//!
//! Core types and error handling for dagviolations.
//!
//! This crate provides:
//! - Common error type shared by the library crates
//! - Variable roles and the structured column schema used by generated tables

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ColumnId, VariableRole};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
