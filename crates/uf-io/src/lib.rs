//! # uf-io
//!
//! Data-loading collaborator for the unfolding toolkit: parses delimited
//! text into the two equal-length, index-aligned vector sequences the core
//! consumes. The core itself never sees a file format.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Delimited-text parsing and column pairing.
pub mod loader;

pub use loader::{load_delimited, InputData, TRUTH_SUFFIX};
