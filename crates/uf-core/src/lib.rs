//! # uf-core
//!
//! Shared foundation for the unfolding toolkit: the error taxonomy and the
//! scalar configuration consumed by the algorithmic core. Kept
//! dependency-light so that ingestion (`uf-io`) and the core (`uf-unfold`)
//! can both depend on it without pulling in linear algebra.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Scalar configuration and policy enums.
pub mod config;
/// Error taxonomy and result alias.
pub mod error;

pub use config::{
    BinningPolicy, CenterPolicy, RegularizationPolicy, UnfoldingConfig, MAX_BIN_COUNT,
    MIN_BIN_COUNT,
};
pub use error::{Error, Result};
