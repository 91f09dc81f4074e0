//! Migration matrix: the discretized linear response operator.
//!
//! Convention (fixed part of the contract): the matrix is
//! **column-stochastic** with rows indexed by measured bins and columns by
//! truth bins. Entry `(i, j)` is the estimated probability that a sample
//! true in bin `j` is measured in bin `i`; every non-empty column sums
//! to 1, empty columns stay exactly 0. With `t` the truth histogram of the
//! training set, `A·t` reproduces its measured histogram exactly.

use crate::binning::Bins;
use crate::sample::SampleSet;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};
use uf_core::{Error, Result};

/// Build the normalized migration matrix from a populated, finalized bin
/// set.
///
/// Bin membership is by measured vector, so a bin's position is the
/// measured-side index `i`; each member's paired truth vector is looked up
/// to find the truth-side index `j`.
pub fn migration_matrix(bins: &Bins, samples: &SampleSet) -> Result<DMatrix<f64>> {
    if !bins.is_finalized() {
        return Err(Error::Configuration(
            "migration matrix requires finalized bins".to_string(),
        ));
    }
    let n = bins.len();
    let mut mat = DMatrix::<f64>::zeros(n, n);

    for (i, bin) in bins.bins().iter().enumerate() {
        for &s in &bin.samples {
            let j = bins.bin_index_of(samples.truth(s))?;
            mat[(i, j)] += 1.0;
        }
    }

    let mut empty_columns = 0usize;
    for j in 0..n {
        let sum: f64 = mat.column(j).sum();
        if sum > 0.0 {
            for i in 0..n {
                mat[(i, j)] /= sum;
            }
        } else {
            empty_columns += 1;
        }
    }
    if empty_columns > 0 {
        warn!(empty_columns, n, "migration matrix has empty columns");
    }
    debug!(n, "migration matrix built");
    Ok(mat)
}

/// Per-bin counts of arbitrary vectors routed through the bin lookup.
pub fn histogram(bins: &Bins, vectors: &[Vec<f64>]) -> Result<DVector<f64>> {
    let mut hist = DVector::<f64>::zeros(bins.len());
    for v in vectors {
        hist[bins.bin_index_of(v)?] += 1.0;
    }
    Ok(hist)
}

/// Histogram normalised to unit sum; an all-zero histogram stays zero.
pub fn probabilities(hist: &DVector<f64>) -> DVector<f64> {
    let total = hist.sum();
    if total > 0.0 {
        hist / total
    } else {
        hist.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 1-D set where measured and truth coincide: the migration matrix
    /// must be the identity on populated columns.
    fn identity_case() -> (Bins, SampleSet) {
        let vals: Vec<Vec<f64>> = (0..12).map(|i| vec![i as f64]).collect();
        let s = SampleSet::new(vals.clone(), vals).unwrap();
        let mut bins = Bins::static_binning(&s, 1, 4).unwrap();
        bins.finalize();
        (bins, s)
    }

    #[test]
    fn test_identity_response() {
        let (bins, s) = identity_case();
        let a = migration_matrix(&bins, &s).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(a[(i, j)], expect, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_columns_stochastic_or_zero() {
        // Truth shifted half a domain: off-diagonal migration.
        let measured: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 10) as f64]).collect();
        let truth: Vec<Vec<f64>> = (0..40).map(|i| vec![((i + 3) % 10) as f64]).collect();
        let s = SampleSet::new(measured, truth).unwrap();
        let mut bins = Bins::static_binning(&s, 1, 5).unwrap();
        bins.finalize();
        let a = migration_matrix(&bins, &s).unwrap();
        for j in 0..5 {
            let sum: f64 = a.column(j).sum();
            assert!(
                (sum - 1.0).abs() < 1e-6 || sum == 0.0,
                "column {j} sums to {sum}"
            );
        }
        assert!(a.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_requires_finalized_bins() {
        let vals: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let s = SampleSet::new(vals.clone(), vals).unwrap();
        let bins = Bins::static_binning(&s, 1, 2).unwrap();
        assert!(matches!(
            migration_matrix(&bins, &s),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_histogram_counts() {
        let (bins, s) = identity_case();
        let h = histogram(&bins, s.measured_all()).unwrap();
        assert_eq!(h.sum(), 12.0);
        assert_eq!(h.len(), 4);
        assert_eq!(h[0], 3.0);
    }

    #[test]
    fn test_probabilities_unit_sum_and_zero_guard() {
        let (bins, s) = identity_case();
        let h = histogram(&bins, s.measured_all()).unwrap();
        let p = probabilities(&h);
        assert_relative_eq!(p.sum(), 1.0, max_relative = 1e-12);

        let zeros = DVector::<f64>::zeros(4);
        assert_eq!(probabilities(&zeros), zeros);
    }
}
