//! Regularization matrix: smoothness priors over bin adjacency.
//!
//! Two bins are adjacent when their multi-indices differ by exactly 1 in
//! exactly one component (Manhattan distance 1 in index space). All three
//! policies produce a row-sum-zero operator; the solver applies the fixed
//! diagonal perturbation [`REG_EPSILON`] before inverting.

use crate::binning::Bins;
use crate::sample::SampleSet;
use nalgebra::DMatrix;
use tracing::debug;
use uf_core::{Error, RegularizationPolicy, Result};

/// Fixed diagonal perturbation guaranteeing numerical invertibility.
pub const REG_EPSILON: f64 = 1e-6;

/// Guard against zero centroid distance in the mass-center policy.
const DIST_EPSILON: f64 = 1e-9;

/// Build the (un-perturbed) regularization matrix for the selected policy.
pub fn regularization_matrix(
    bins: &Bins,
    samples: &SampleSet,
    policy: RegularizationPolicy,
) -> Result<DMatrix<f64>> {
    if !bins.is_finalized() {
        return Err(Error::Configuration(
            "regularization matrix requires finalized bins".to_string(),
        ));
    }
    let mat = match policy {
        RegularizationPolicy::BinaryAdjacency => binary_adjacency(bins),
        RegularizationPolicy::StatisticalProximity => statistical_proximity(bins, samples)?,
        RegularizationPolicy::MassCenterProximity => mass_center_proximity(bins, samples),
    };
    debug!(n = bins.len(), ?policy, "regularization matrix built");
    Ok(mat)
}

/// Add `eps` to every diagonal entry in place.
pub fn perturb_diagonal(mat: &mut DMatrix<f64>, eps: f64) {
    for i in 0..mat.nrows().min(mat.ncols()) {
        mat[(i, i)] += eps;
    }
}

/// Manhattan distance 1 in multi-index space.
fn adjacent(a: &[usize], b: &[usize]) -> bool {
    let mut diff = 0usize;
    for (&x, &y) in a.iter().zip(b.iter()) {
        diff += x.abs_diff(y);
        if diff > 1 {
            return false;
        }
    }
    diff == 1
}

/// Discrete Laplacian: -1 for each adjacent pair, neighbor count on the
/// diagonal. Every row sums to zero.
fn binary_adjacency(bins: &Bins) -> DMatrix<f64> {
    let n = bins.len();
    let mut mat = DMatrix::<f64>::zeros(n, n);
    for (i, a) in bins.bins().iter().enumerate() {
        for (j, b) in bins.bins().iter().enumerate() {
            if adjacent(&a.idx, &b.idx) {
                mat[(i, j)] = -1.0;
                mat[(i, i)] += 1.0;
            }
        }
    }
    mat
}

/// Off-diagonal weight for adjacent pairs: the number of bin `i`'s samples
/// whose paired truth vector lands in neighbor `j`. Diagonal = negative
/// row sum; rows scaled by the diagonal magnitude when non-zero.
fn statistical_proximity(bins: &Bins, samples: &SampleSet) -> Result<DMatrix<f64>> {
    let n = bins.len();
    let mut mat = DMatrix::<f64>::zeros(n, n);
    for (i, a) in bins.bins().iter().enumerate() {
        for (j, b) in bins.bins().iter().enumerate() {
            if !adjacent(&a.idx, &b.idx) {
                continue;
            }
            let mut overlap = 0usize;
            for &s in &a.samples {
                if bins.bin_index_of(samples.truth(s))? == j {
                    overlap += 1;
                }
            }
            mat[(i, j)] = overlap as f64;
        }
    }
    finish_rows(&mut mat);
    Ok(mat)
}

/// Off-diagonal weight for adjacent pairs: inverse Euclidean distance
/// between the two bins' sample centroids.
fn mass_center_proximity(bins: &Bins, samples: &SampleSet) -> DMatrix<f64> {
    let n = bins.len();
    let centroids: Vec<Vec<f64>> = bins.bins().iter().map(|b| b.centroid(samples)).collect();
    let mut mat = DMatrix::<f64>::zeros(n, n);
    for (i, a) in bins.bins().iter().enumerate() {
        for (j, b) in bins.bins().iter().enumerate() {
            if !adjacent(&a.idx, &b.idx) {
                continue;
            }
            let dist = centroids[i]
                .iter()
                .zip(centroids[j].iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt();
            mat[(i, j)] = 1.0 / (dist + DIST_EPSILON);
        }
    }
    finish_rows(&mut mat);
    mat
}

/// Set each diagonal to the negative off-diagonal row sum, then scale the
/// row by the diagonal magnitude (rows with zero sum are left as-is).
fn finish_rows(mat: &mut DMatrix<f64>) {
    let n = mat.nrows();
    for i in 0..n {
        let row_sum: f64 = (0..n).filter(|&j| j != i).map(|j| mat[(i, j)]).sum();
        mat[(i, i)] = -row_sum;
        if row_sum > 0.0 {
            for j in 0..n {
                mat[(i, j)] /= row_sum;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uf_core::RegularizationPolicy;

    fn bins_1d(n_bins: usize) -> (Bins, SampleSet) {
        let vals: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let s = SampleSet::new(vals.clone(), vals).unwrap();
        let mut bins = Bins::static_binning(&s, 1, n_bins).unwrap();
        bins.finalize();
        (bins, s)
    }

    fn bins_2d() -> (Bins, SampleSet) {
        let mut m = Vec::new();
        for i in 0..8 {
            for j in 0..8 {
                m.push(vec![i as f64, j as f64]);
            }
        }
        let s = SampleSet::new(m.clone(), m).unwrap();
        let mut bins = Bins::static_binning(&s, 2, 3).unwrap();
        bins.finalize();
        (bins, s)
    }

    #[test]
    fn test_adjacency_is_manhattan_one() {
        assert!(adjacent(&[1, 2], &[1, 3]));
        assert!(adjacent(&[1, 2], &[0, 2]));
        assert!(!adjacent(&[1, 2], &[1, 2]));
        assert!(!adjacent(&[1, 2], &[2, 3]));
        assert!(!adjacent(&[1, 2], &[1, 4]));
    }

    #[test]
    fn test_binary_rows_sum_to_zero() {
        let (bins, s) = bins_2d();
        let c = regularization_matrix(&bins, &s, RegularizationPolicy::BinaryAdjacency).unwrap();
        for i in 0..c.nrows() {
            assert_relative_eq!(c.row(i).sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_binary_1d_is_path_laplacian() {
        let (bins, s) = bins_1d(4);
        let c = regularization_matrix(&bins, &s, RegularizationPolicy::BinaryAdjacency).unwrap();
        // Endpoints have one neighbor, interior bins two.
        assert_eq!(c[(0, 0)], 1.0);
        assert_eq!(c[(1, 1)], 2.0);
        assert_eq!(c[(0, 1)], -1.0);
        assert_eq!(c[(0, 2)], 0.0);
    }

    #[test]
    fn test_perturbation_raises_diagonal_by_epsilon() {
        let (bins, s) = bins_1d(4);
        let c = regularization_matrix(&bins, &s, RegularizationPolicy::BinaryAdjacency).unwrap();
        let mut cf = c.clone();
        perturb_diagonal(&mut cf, REG_EPSILON);
        for i in 0..4 {
            assert_relative_eq!(cf[(i, i)] - c[(i, i)], REG_EPSILON, max_relative = 1e-9);
            for j in 0..4 {
                if i != j {
                    assert_eq!(cf[(i, j)], c[(i, j)]);
                }
            }
        }
    }

    #[test]
    fn test_statistical_rows_sum_to_zero_and_diag_is_minus_one() {
        // Truth shifted by one bin width so neighbor overlap is non-trivial.
        let measured: Vec<Vec<f64>> = (0..30).map(|i| vec![(i % 10) as f64]).collect();
        let truth: Vec<Vec<f64>> = (0..30).map(|i| vec![(i % 10) as f64 + 2.0]).collect();
        let s = SampleSet::new(measured, truth).unwrap();
        let mut bins = Bins::static_binning(&s, 1, 5).unwrap();
        bins.finalize();
        let c =
            regularization_matrix(&bins, &s, RegularizationPolicy::StatisticalProximity).unwrap();
        for i in 0..5 {
            assert_relative_eq!(c.row(i).sum(), 0.0, epsilon = 1e-12);
            // Normalized rows have a -1 diagonal.
            if (0..5).any(|j| j != i && c[(i, j)] != 0.0) {
                assert_relative_eq!(c[(i, i)], -1.0, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_mass_center_prefers_close_centroids() {
        let (bins, s) = bins_1d(4);
        let c =
            regularization_matrix(&bins, &s, RegularizationPolicy::MassCenterProximity).unwrap();
        // Adjacent entries positive pre-normalisation sign convention:
        // off-diagonals scaled to positive fractions, diagonal -1.
        assert!(c[(0, 1)] > 0.0);
        assert_eq!(c[(0, 2)], 0.0);
        assert_relative_eq!(c[(1, 1)], -1.0, max_relative = 1e-12);
        for i in 0..4 {
            assert_relative_eq!(c.row(i).sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_requires_finalized_bins() {
        let vals: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let s = SampleSet::new(vals.clone(), vals).unwrap();
        let bins = Bins::static_binning(&s, 1, 2).unwrap();
        assert!(matches!(
            regularization_matrix(&bins, &s, RegularizationPolicy::BinaryAdjacency),
            Err(Error::Configuration(_))
        ));
    }
}
