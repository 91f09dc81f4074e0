//! Paired measured/truth samples.
//!
//! The core consumes two equal-length, index-aligned collections of
//! fixed-dimension vectors. Bins refer to samples by index into a
//! `SampleSet`; nothing in the core holds a reference whose lifetime is
//! tied to a structure that can be replaced during rebinning.

use serde::{Deserialize, Serialize};
use uf_core::{Error, Result};

/// Equal-length, index-aligned measured and truth vector collections.
#[derive(Debug, Clone)]
pub struct SampleSet {
    measured: Vec<Vec<f64>>,
    truth: Vec<Vec<f64>>,
    dims: usize,
}

impl SampleSet {
    /// Build a sample set and validate alignment.
    ///
    /// All vectors on both sides must share the same dimension; the two
    /// sides must have the same length; the set must be non-empty.
    pub fn new(measured: Vec<Vec<f64>>, truth: Vec<Vec<f64>>) -> Result<Self> {
        if measured.is_empty() {
            return Err(Error::Input("sample set is empty".to_string()));
        }
        if measured.len() != truth.len() {
            return Err(Error::Input(format!(
                "measured/truth sample counts differ: {} != {}",
                measured.len(),
                truth.len()
            )));
        }
        let dims = measured[0].len();
        if dims == 0 {
            return Err(Error::Input("samples have zero dimension".to_string()));
        }
        for (i, v) in measured.iter().chain(truth.iter()).enumerate() {
            if v.len() != dims {
                return Err(Error::Input(format!(
                    "sample {} has dimension {} (expected {})",
                    i,
                    v.len(),
                    dims
                )));
            }
            if v.iter().any(|x| !x.is_finite()) {
                return Err(Error::Input(format!("sample {i} contains a non-finite value")));
            }
        }
        Ok(Self { measured, truth, dims })
    }

    /// Number of sample pairs.
    pub fn len(&self) -> usize {
        self.measured.len()
    }

    /// True when the set holds no pairs (never constructible; kept for API symmetry).
    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    /// Shared sample dimension.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Measured vector of pair `i`.
    pub fn measured(&self, i: usize) -> &[f64] {
        &self.measured[i]
    }

    /// Truth vector of pair `i`.
    pub fn truth(&self, i: usize) -> &[f64] {
        &self.truth[i]
    }

    /// All measured vectors, in sample order.
    pub fn measured_all(&self) -> &[Vec<f64>] {
        &self.measured
    }

    /// All truth vectors, in sample order.
    pub fn truth_all(&self) -> &[Vec<f64>] {
        &self.truth
    }
}

/// Per-dimension minimum and maximum over the union of measured and truth
/// vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Per-dimension global minimum.
    pub lower: Vec<f64>,
    /// Per-dimension global maximum.
    pub upper: Vec<f64>,
}

/// Compute per-dimension bounds over both sides of the set, restricted to
/// the first `dims` components.
///
/// Truth vectors are included so that every paired vector is in-domain for
/// bin lookup when the migration matrix is built.
pub fn compute_bounds(samples: &SampleSet, dims: usize) -> Result<Bounds> {
    if dims == 0 || dims > samples.dims() {
        return Err(Error::Configuration(format!(
            "active dimensionality {} invalid for {}-dimensional samples",
            dims,
            samples.dims()
        )));
    }
    let mut lower = vec![f64::INFINITY; dims];
    let mut upper = vec![f64::NEG_INFINITY; dims];
    for v in samples.measured_all().iter().chain(samples.truth_all().iter()) {
        for d in 0..dims {
            lower[d] = lower[d].min(v[d]);
            upper[d] = upper[d].max(v[d]);
        }
    }
    for d in 0..dims {
        if lower[d] >= upper[d] {
            return Err(Error::Input(format!(
                "degenerate domain in dimension {d}: min {} >= max {}",
                lower[d], upper[d]
            )));
        }
    }
    Ok(Bounds { lower, upper })
}
