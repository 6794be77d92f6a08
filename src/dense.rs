//! Dense reference solver for small pencils.
//!
//! Reduces K u = λ B u to a standard symmetric problem through the Cholesky
//! factor of B and hands it to `SymmetricEigen`. Only meant for small test
//! models, where it serves as the reference for the Lanczos results.

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::error::{EigenError, Result};
use crate::matrix::OperatorMatrix;
use crate::types::{MatrixKind, RIGID_BODY_LAMBDA_THRESHOLD};

/// All eigenpairs of K u = λ B u, ascending, with B-normalized eigenvectors
/// stored column-wise. B must be positive definite.
pub fn dense_generalized_eigen<M: OperatorMatrix>(
    k: &M,
    b: &M,
    b_kind: MatrixKind,
) -> Result<(DVector<f64>, DMatrix<f64>)> {
    let (n, nc) = k.dims();
    if n != nc || b.dims() != (n, n) {
        return Err(EigenError::DimensionMismatch {
            what: "dense pencil",
            expected: n,
            found: b.dims().0,
        });
    }
    let chol = b
        .to_dense()
        .cholesky()
        .ok_or(EigenError::IndefiniteInnerProduct(b_kind))?;
    let l_inv = chol
        .l()
        .try_inverse()
        .ok_or(EigenError::IndefiniteInnerProduct(b_kind))?;
    let mut a = &l_inv * k.to_dense() * l_inv.transpose();
    a = 0.5 * (&a + a.transpose());

    let eig = SymmetricEigen::new(a);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let values = DVector::from_fn(n, |i, _| eig.eigenvalues[order[i]]);
    // u = L⁻ᵀ y keeps uᵀ B u = yᵀ y = 1.
    let l_inv_t = l_inv.transpose();
    let mut vectors = DMatrix::zeros(n, n);
    for (col, &src) in order.iter().enumerate() {
        vectors.set_column(col, &(&l_inv_t * eig.eigenvectors.column(src)));
    }
    Ok((values, vectors))
}

/// Lowest `num_modes` elastic natural frequencies (Hz) of K u = ω² M u.
/// Rigid-body modes are dropped.
pub fn dense_natural_frequencies<M: OperatorMatrix>(
    k: &M,
    m: &M,
    num_modes: usize,
) -> Result<Vec<f64>> {
    let (values, _) = dense_generalized_eigen(k, m, MatrixKind::Mass)?;
    Ok(values
        .iter()
        .copied()
        .filter(|lambda| *lambda > RIGID_BODY_LAMBDA_THRESHOLD)
        .map(|lambda| lambda.sqrt() / (2.0 * std::f64::consts::PI))
        .take(num_modes)
        .collect())
}
