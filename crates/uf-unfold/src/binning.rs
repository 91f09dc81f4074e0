//! Adaptive multidimensional binning engine.
//!
//! Partitions the sample domain into axis-aligned half-open boxes and
//! assigns every sample pair to exactly one bin by its measured vector.
//! Three construction paths: a uniform static grid, iterative dynamic
//! refinement, and a hybrid of the two.
//!
//! `Bins` follows a two-phase protocol: construction mutates, then
//! [`Bins::finalize`] builds the per-dimension edge tables once, after
//! which [`Bins::bin_index_of`] is a pure binary-search query.

use crate::index::{from_multi_index, to_multi_index};
use crate::sample::{compute_bounds, Bounds, SampleSet};
use tracing::debug;
use uf_core::{CenterPolicy, Error, Result};

/// One bin: a multi-index, a half-open boundary box and the indices of the
/// sample pairs whose measured vector falls inside the box.
#[derive(Debug, Clone)]
pub struct Bin {
    /// Per-dimension integer coordinate in the grid.
    pub idx: Vec<usize>,
    /// Inclusive lower box edge per dimension.
    pub lower: Vec<f64>,
    /// Exclusive upper box edge per dimension (inclusive on the topmost bin).
    pub upper: Vec<f64>,
    /// Indices into the owning [`SampleSet`].
    pub samples: Vec<usize>,
}

impl Bin {
    /// Number of member sample pairs.
    pub fn population(&self) -> usize {
        self.samples.len()
    }

    /// Half-open containment test against the measured-side box.
    pub fn contains(&self, v: &[f64]) -> bool {
        v.iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(&x, (&lo, &hi))| lo <= x && x < hi)
    }

    /// Centroid of the member samples' measured vectors; box center when
    /// the bin is empty.
    pub fn centroid(&self, samples: &SampleSet) -> Vec<f64> {
        let dims = self.lower.len();
        if self.samples.is_empty() {
            return (0..dims).map(|d| 0.5 * (self.lower[d] + self.upper[d])).collect();
        }
        let mut c = vec![0.0; dims];
        for &i in &self.samples {
            let m = samples.measured(i);
            for d in 0..dims {
                c[d] += m[d];
            }
        }
        let n = self.samples.len() as f64;
        c.iter_mut().for_each(|x| *x /= n);
        c
    }
}

/// Ordered bin collection with per-dimension sizes.
///
/// Bins are kept sorted so that a bin's position in the collection equals
/// its flat index (`from_multi_index(idx, dim_sizes)`); the total count is
/// the product of the per-dimension sizes.
#[derive(Debug, Clone)]
pub struct Bins {
    bins: Vec<Bin>,
    dim_sizes: Vec<usize>,
    dims: usize,
    bounds: Bounds,
    /// Per-dimension sorted `(lower, upper)` slab edges; built by `finalize`.
    edges: Option<Vec<Vec<(f64, f64)>>>,
}

impl Bins {
    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    /// Uniform grid of `bin_count^dims` cells over the global bounds.
    ///
    /// The first bin's lower edge and the last bin's upper edge are snapped
    /// exactly to the global min/max so floating rounding cannot open a gap
    /// at the domain boundary.
    pub fn static_binning(samples: &SampleSet, dims: usize, bin_count: usize) -> Result<Self> {
        if bin_count < 1 {
            return Err(Error::Configuration(format!("bin count must be >= 1, got {bin_count}")));
        }
        let bounds = compute_bounds(samples, dims)?;
        let steps: Vec<f64> =
            (0..dims).map(|d| (bounds.upper[d] - bounds.lower[d]) / bin_count as f64).collect();

        let total = bin_count.pow(dims as u32);
        let dim_sizes = vec![bin_count; dims];
        let mut bins = Vec::with_capacity(total);
        for flat in 0..total {
            let idx = to_multi_index(flat, dims, bin_count);
            let mut lower = Vec::with_capacity(dims);
            let mut upper = Vec::with_capacity(dims);
            for d in 0..dims {
                let lo = if idx[d] == 0 {
                    bounds.lower[d]
                } else {
                    bounds.lower[d] + steps[d] * idx[d] as f64
                };
                let hi = if idx[d] == bin_count - 1 {
                    bounds.upper[d]
                } else {
                    bounds.lower[d] + steps[d] * (idx[d] + 1) as f64
                };
                lower.push(lo);
                upper.push(hi);
            }
            bins.push(Bin { idx, lower, upper, samples: Vec::new() });
        }

        // Direct grid assignment; the top edge claims the global max.
        for i in 0..samples.len() {
            let m = samples.measured(i);
            let mut idx = Vec::with_capacity(dims);
            for d in 0..dims {
                let k = ((m[d] - bounds.lower[d]) / steps[d]) as usize;
                idx.push(k.min(bin_count - 1));
            }
            bins[from_multi_index(&idx, &dim_sizes)].samples.push(i);
        }

        debug!(total, bin_count, dims, "static binning built");
        Ok(Self { bins, dim_sizes, dims, bounds, edges: None })
    }

    /// Iterative adaptive refinement.
    ///
    /// Starts from one bin covering the whole domain and runs exactly
    /// `bin_count - 1` refinement rounds; each round splits the most
    /// populated slab, so one per-dimension size grows by one per round.
    pub fn dynamic_binning(
        samples: &SampleSet,
        dims: usize,
        bin_count: usize,
        center: CenterPolicy,
    ) -> Result<Self> {
        if bin_count < 1 {
            return Err(Error::Configuration(format!("bin count must be >= 1, got {bin_count}")));
        }
        let bounds = compute_bounds(samples, dims)?;
        let seed = Bin {
            idx: vec![0; dims],
            lower: bounds.lower.clone(),
            upper: bounds.upper.clone(),
            samples: (0..samples.len()).collect(),
        };
        let mut bins = Self {
            bins: vec![seed],
            dim_sizes: vec![1; dims],
            dims,
            bounds,
            edges: None,
        };
        bins.refine(samples, bin_count - 1, center)?;
        Ok(bins)
    }

    /// Static seed at roughly a third of the requested count, then dynamic
    /// refinement for the remainder.
    pub fn hybrid_binning(
        samples: &SampleSet,
        dims: usize,
        bin_count: usize,
        center: CenterPolicy,
    ) -> Result<Self> {
        let seed_count = (bin_count / 3).max(2).min(bin_count);
        let mut bins = Self::static_binning(samples, dims, seed_count)?;
        bins.refine(samples, bin_count - seed_count, center)?;
        Ok(bins)
    }

    /// Run `iterations` refinement rounds, each splitting the most
    /// populated (dimension, index) slab at a coordinate chosen by the
    /// center policy.
    pub fn refine(
        &mut self,
        samples: &SampleSet,
        iterations: usize,
        center: CenterPolicy,
    ) -> Result<()> {
        for _ in 0..iterations {
            self.split_round(samples, center)?;
        }
        Ok(())
    }

    /// One refinement round. The replacement bin list is built in a fresh
    /// buffer and swapped in at the end of the pass.
    fn split_round(&mut self, samples: &SampleSet, center: CenterPolicy) -> Result<()> {
        // Most populated (dimension, index) slab.
        let (mut best_dim, mut best_idx, mut best_pop) = (0, 0, 0usize);
        for d in 0..self.dims {
            for (k, &pop) in self.slab_populations(d).iter().enumerate() {
                if pop > best_pop {
                    (best_dim, best_idx, best_pop) = (d, k, pop);
                }
            }
        }

        let (slab_lo, slab_hi) = self
            .bins
            .iter()
            .find(|b| b.idx[best_dim] == best_idx)
            .map(|b| (b.lower[best_dim], b.upper[best_dim]))
            .ok_or_else(|| Error::Configuration("refinement on empty bin set".to_string()))?;

        let split = self.split_coordinate(samples, best_dim, best_idx, slab_lo, slab_hi, center);
        debug!(
            dim = best_dim,
            index = best_idx,
            population = best_pop,
            split,
            "splitting most populated slab"
        );

        let mut next = Vec::with_capacity(self.bins.len() + self.dim_sizes[best_dim]);
        for bin in self.bins.drain(..) {
            if bin.idx[best_dim] < best_idx {
                next.push(bin);
            } else if bin.idx[best_dim] > best_idx {
                let mut shifted = bin;
                shifted.idx[best_dim] += 1;
                next.push(shifted);
            } else {
                let Bin { idx, lower, upper, samples: members } = bin;
                let (below, above): (Vec<usize>, Vec<usize>) = members
                    .into_iter()
                    .partition(|&i| samples.measured(i)[best_dim] < split);

                let mut low_upper = upper.clone();
                low_upper[best_dim] = split;
                next.push(Bin {
                    idx: idx.clone(),
                    lower: lower.clone(),
                    upper: low_upper,
                    samples: below,
                });

                let mut high_idx = idx;
                high_idx[best_dim] += 1;
                let mut high_lower = lower;
                high_lower[best_dim] = split;
                next.push(Bin { idx: high_idx, lower: high_lower, upper, samples: above });
            }
        }

        self.dim_sizes[best_dim] += 1;
        next.sort_by_key(|b| from_multi_index(&b.idx, &self.dim_sizes));
        self.bins = next;
        self.edges = None;
        Ok(())
    }

    /// Split coordinate for a slab, per center policy. Falls back to the
    /// span midpoint when the sample median does not fall strictly inside
    /// the slab (empty slab, or all coordinates equal to an edge).
    fn split_coordinate(
        &self,
        samples: &SampleSet,
        dim: usize,
        index: usize,
        lo: f64,
        hi: f64,
        center: CenterPolicy,
    ) -> f64 {
        let midpoint = 0.5 * (lo + hi);
        match center {
            CenterPolicy::SpanMidpoint => midpoint,
            CenterPolicy::SampleMedian => {
                let mut coords: Vec<f64> = self
                    .bins
                    .iter()
                    .filter(|b| b.idx[dim] == index)
                    .flat_map(|b| b.samples.iter().map(|&i| samples.measured(i)[dim]))
                    .collect();
                if coords.is_empty() {
                    return midpoint;
                }
                coords.sort_by(|a, b| a.total_cmp(b));
                let median = coords[coords.len() / 2];
                if lo < median && median < hi {
                    median
                } else {
                    midpoint
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Finalization and lookup
    // -----------------------------------------------------------------

    /// Build the per-dimension sorted edge tables. Must be called once
    /// after construction; afterwards [`Bins::bin_index_of`] is pure.
    pub fn finalize(&mut self) {
        let mut edges = Vec::with_capacity(self.dims);
        for d in 0..self.dims {
            let mut slabs = Vec::with_capacity(self.dim_sizes[d]);
            for k in 0..self.dim_sizes[d] {
                // All bins sharing a projected index tile the same interval.
                let bin = self
                    .bins
                    .iter()
                    .find(|b| b.idx[d] == k)
                    .unwrap_or_else(|| unreachable!("slab {k} missing in dimension {d}"));
                slabs.push((bin.lower[d], bin.upper[d]));
            }
            edges.push(slabs);
        }
        self.edges = Some(edges);
    }

    /// Whether [`Bins::finalize`] has run since the last structural change.
    pub fn is_finalized(&self) -> bool {
        self.edges.is_some()
    }

    /// Flat bin index containing `value`.
    ///
    /// Per dimension: binary search of the edge table; a value at or above
    /// the top outer edge clamps to the topmost slab (the half-open tiling
    /// leaves the global max itself uncovered), a value below the bottom
    /// outer edge raises [`Error::Range`]. Interior boundary ties resolve
    /// to the upper slab.
    pub fn bin_index_of(&self, value: &[f64]) -> Result<usize> {
        let edges = self.edges.as_ref().ok_or_else(|| {
            Error::Configuration("bin lookup before finalize()".to_string())
        })?;
        if value.len() != self.dims {
            return Err(Error::Input(format!(
                "lookup vector has dimension {} (expected {})",
                value.len(),
                self.dims
            )));
        }
        let mut idx = Vec::with_capacity(self.dims);
        for (d, slabs) in edges.iter().enumerate() {
            let v = value[d];
            if v < slabs[0].0 {
                return Err(Error::Range(format!(
                    "value {v} below domain minimum {} in dimension {d}",
                    slabs[0].0
                )));
            }
            let last = slabs.len() - 1;
            let k = if v >= slabs[last].1 {
                last
            } else {
                slabs.partition_point(|&(lo, _)| lo <= v) - 1
            };
            idx.push(k);
        }
        Ok(from_multi_index(&idx, &self.dim_sizes))
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Bins ordered by flat index.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Total bin count (product of per-dimension sizes).
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// True when no bins exist (never after construction).
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Per-dimension grid sizes.
    pub fn dim_sizes(&self) -> &[usize] {
        &self.dim_sizes
    }

    /// Grid dimensionality.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Global domain bounds the grid tiles.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Population of each slab along `dim`: the sum of bin occupancy over
    /// bins sharing that projected index. Doubles as the 1-D projection of
    /// the binned sample distribution.
    pub fn slab_populations(&self, dim: usize) -> Vec<usize> {
        let mut pops = vec![0usize; self.dim_sizes[dim]];
        for b in &self.bins {
            pops[b.idx[dim]] += b.samples.len();
        }
        pops
    }
}
