//! # uf-unfold
//!
//! Statistical unfolding core: recovers an estimate of a true distribution
//! from a measured one distorted by a learned detector response.
//!
//! Data flow: paired samples → binning engine → bins → {migration matrix,
//! regularization matrix} → Tikhonov-SVD solver → unfolded solution.
//! Every computation is a one-shot, synchronous batch transform over an
//! in-memory sample set; no shared mutable state.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Adaptive multidimensional binning engine.
pub mod binning;
/// Flat ↔ multi-index conversion.
pub mod index;
/// Migration (response) matrix and histogram builders.
pub mod migration;
/// One-shot pipeline and read-only result snapshot.
pub mod pipeline;
/// Smoothness priors over bin adjacency.
pub mod regularization;
/// Paired sample collections and domain bounds.
pub mod sample;
/// Tikhonov-regularized SVD solver.
pub mod solver;

pub use binning::{Bin, Bins};
pub use index::{from_multi_index, to_multi_index};
pub use migration::{histogram, migration_matrix, probabilities};
pub use pipeline::{BinSnapshot, Unfolder, UnfoldingSnapshot};
pub use regularization::{perturb_diagonal, regularization_matrix, REG_EPSILON};
pub use sample::{compute_bounds, Bounds, SampleSet};
pub use solver::solve_system;
