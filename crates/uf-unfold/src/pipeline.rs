//! One-shot unfolding pipeline.
//!
//! Strings the components together in a single synchronous batch: validate
//! configuration, build and finalize bins, build both matrices and the
//! measured histogram, solve. Everything lands in a fresh
//! [`UnfoldingSnapshot`]; a failed run leaves any previously obtained
//! snapshot untouched, so the last-good snapshot survives a failed rebuild
//! by construction.

use crate::binning::Bins;
use crate::migration::{histogram, migration_matrix};
use crate::regularization::regularization_matrix;
use crate::sample::SampleSet;
use crate::solver::solve_system;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uf_core::{BinningPolicy, Error, Result, UnfoldingConfig};

/// Read-only view of one bin for display collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinSnapshot {
    /// Multi-index in the grid.
    pub index: Vec<usize>,
    /// Lower box edge per dimension.
    pub lower: Vec<f64>,
    /// Upper box edge per dimension.
    pub upper: Vec<f64>,
    /// Member sample count.
    pub population: usize,
    /// Measured-sample centroid (box center when empty).
    pub centroid: Vec<f64>,
}

/// Immutable result of one unfolding pass: bins, both matrices (row-major),
/// the measured histogram and the unfolded solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfoldingSnapshot {
    /// Configuration the pass ran with.
    pub config: UnfoldingConfig,
    /// Per-dimension grid sizes.
    pub dim_sizes: Vec<usize>,
    /// Bins ordered by flat index.
    pub bins: Vec<BinSnapshot>,
    /// Per-dimension slab populations (1-D projections of the binned set).
    pub projections: Vec<Vec<usize>>,
    /// Dense migration matrix, row-major, `n x n`.
    pub migration: Vec<f64>,
    /// Dense regularization matrix (un-perturbed), row-major, `n x n`.
    pub regularization: Vec<f64>,
    /// Measured histogram, length `n`.
    pub measured_histogram: Vec<f64>,
    /// Unfolded estimate `τ`, length `n`.
    pub solution: Vec<f64>,
}

/// Single-threaded batch unfolder over an exclusively owned sample set.
#[derive(Debug)]
pub struct Unfolder {
    samples: SampleSet,
    config: UnfoldingConfig,
}

impl Unfolder {
    /// Create an unfolder; the configuration is validated on `run`.
    pub fn new(samples: SampleSet, config: UnfoldingConfig) -> Self {
        Self { samples, config }
    }

    /// Run one batch, unfolding the sample set's own measured side.
    pub fn run(&self) -> Result<UnfoldingSnapshot> {
        self.run_on(self.samples.measured_all())
    }

    /// Run one batch, unfolding an external measured sample through the
    /// response learned from the paired set.
    pub fn run_on(&self, measured: &[Vec<f64>]) -> Result<UnfoldingSnapshot> {
        self.config.validate()?;
        if self.samples.dims() != self.config.dims {
            return Err(Error::Configuration(format!(
                "configured dimensionality {} does not match {}-dimensional samples \
                 (select active columns before building the sample set)",
                self.config.dims,
                self.samples.dims()
            )));
        }

        let mut bins = self.build_bins()?;
        bins.finalize();

        let a = migration_matrix(&bins, &self.samples)?;
        let c = regularization_matrix(&bins, &self.samples, self.config.regularization)?;
        let m = histogram(&bins, measured)?;
        let tau = solve_system(&a, &c, &m, self.config.alpha)?;
        debug!(
            n = bins.len(),
            measured_total = m.sum(),
            solution_total = tau.sum(),
            "unfolding pass complete"
        );

        Ok(self.snapshot(&bins, a, c, m, tau))
    }

    fn build_bins(&self) -> Result<Bins> {
        let cfg = &self.config;
        match cfg.binning {
            BinningPolicy::Static => Bins::static_binning(&self.samples, cfg.dims, cfg.bins),
            BinningPolicy::Dynamic => {
                Bins::dynamic_binning(&self.samples, cfg.dims, cfg.bins, cfg.center)
            }
            BinningPolicy::Hybrid => {
                Bins::hybrid_binning(&self.samples, cfg.dims, cfg.bins, cfg.center)
            }
        }
    }

    fn snapshot(
        &self,
        bins: &Bins,
        a: DMatrix<f64>,
        c: DMatrix<f64>,
        m: DVector<f64>,
        tau: DVector<f64>,
    ) -> UnfoldingSnapshot {
        let bin_snapshots = bins
            .bins()
            .iter()
            .map(|b| BinSnapshot {
                index: b.idx.clone(),
                lower: b.lower.clone(),
                upper: b.upper.clone(),
                population: b.population(),
                centroid: b.centroid(&self.samples),
            })
            .collect();
        let projections =
            (0..bins.dims()).map(|d| bins.slab_populations(d)).collect();
        UnfoldingSnapshot {
            config: self.config.clone(),
            dim_sizes: bins.dim_sizes().to_vec(),
            bins: bin_snapshots,
            projections,
            migration: row_major(&a),
            regularization: row_major(&c),
            measured_histogram: m.iter().copied().collect(),
            solution: tau.iter().copied().collect(),
        }
    }
}

fn row_major(mat: &DMatrix<f64>) -> Vec<f64> {
    let (rows, cols) = mat.shape();
    let mut out = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            out.push(mat[(i, j)]);
        }
    }
    out
}
