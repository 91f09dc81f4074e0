//! Tikhonov-regularized SVD solver.
//!
//! Inverts the learned response operator: given the migration matrix `A`,
//! the (un-perturbed) regularization matrix `C`, a measured histogram `m`
//! and a strength `alpha`, produces the unfolded estimate `τ`. One SVD per
//! solve, no iteration, deterministic for fixed inputs.

use crate::regularization::{perturb_diagonal, REG_EPSILON};
use nalgebra::{DMatrix, DVector};
use tracing::debug;
use uf_core::{Error, Result};

/// Iteration cap handed to the SVD routine.
const SVD_MAX_ITER: usize = 1000;

/// Solve the regularized system for the unfolded estimate `τ`.
///
/// Steps:
/// 1. `Cf = C + ε·I`, inverted by LU (`Numeric` error when singular).
/// 2. `A' = A · Ci`.
/// 3. Vertical Tikhonov augmentation: `[A'; sqrt(alpha)·I]` (2N×N).
/// 4. Right-multiply by `Cf` to get the matrix actually decomposed.
/// 5. Thin SVD `Ã = U·S·Vᵗ`, singular values sorted descending.
/// 6. Zero-pad `m` to 2N, project `d = Uᵗ·m`.
/// 7. Filter factors `z_i = (d_i/s_i)·(s_i²/(s_i²+alpha))`; `s_i = 0`
///    contributes 0 instead of dividing.
/// 8. Back-project `τ = V·z`.
pub fn solve_system(
    a: &DMatrix<f64>,
    c: &DMatrix<f64>,
    measured: &DVector<f64>,
    alpha: f64,
) -> Result<DVector<f64>> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n {
        return Err(Error::Input(format!(
            "migration matrix must be square and non-empty, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if c.nrows() != n || c.ncols() != n {
        return Err(Error::Input(format!(
            "regularization matrix is {}x{}, expected {n}x{n}",
            c.nrows(),
            c.ncols()
        )));
    }
    if measured.len() != n {
        return Err(Error::Input(format!(
            "measured histogram has length {}, expected {n}",
            measured.len()
        )));
    }
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(Error::Configuration(format!(
            "alpha must be finite and >= 0, got {alpha}"
        )));
    }

    // 1. Perturbed regularization matrix and its inverse.
    let mut cf = c.clone();
    perturb_diagonal(&mut cf, REG_EPSILON);
    let ci = cf
        .clone()
        .lu()
        .try_inverse()
        .ok_or_else(|| Error::Numeric("regularization matrix is singular".to_string()))?;

    // 2-4. Augmented system, expressed back in the original basis.
    let a_prime = a * &ci;
    let mut augmented = DMatrix::<f64>::zeros(2 * n, n);
    augmented.view_mut((0, 0), (n, n)).copy_from(&a_prime);
    let sqrt_alpha = alpha.sqrt();
    for i in 0..n {
        augmented[(n + i, i)] = sqrt_alpha;
    }
    let a_tilde = &augmented * &cf;

    // 5. One thin SVD.
    let svd = a_tilde
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITER)
        .ok_or_else(|| Error::Numeric("SVD did not converge".to_string()))?;
    let u = svd.u.as_ref().ok_or_else(|| Error::Numeric("SVD returned no U".to_string()))?;
    let v_t = svd.v_t.as_ref().ok_or_else(|| Error::Numeric("SVD returned no Vt".to_string()))?;
    let s = &svd.singular_values;
    debug!(
        s_max = s.iter().fold(0.0_f64, |acc, &x| acc.max(x)),
        s_min = s.iter().fold(f64::INFINITY, |acc, &x| acc.min(x)),
        alpha,
        "singular spectrum"
    );

    // 6. Project the zero-padded measurement.
    let mut m_ext = DVector::<f64>::zeros(2 * n);
    m_ext.rows_mut(0, n).copy_from(measured);
    let d = u.transpose() * m_ext;

    // 7. Damped inversion of the spectrum.
    let mut z = DVector::<f64>::zeros(s.len());
    for i in 0..s.len() {
        let si = s[i];
        if si > 0.0 {
            z[i] = (d[i] / si) * (si * si / (si * si + alpha));
        }
    }

    // 8. Back to the solution basis.
    Ok(v_t.transpose() * z)
}
