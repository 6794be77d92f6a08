//! Storage-agnostic matrix capabilities used by the shift-invert operator.
//!
//! The operator only ever needs to copy one matrix into another, add a scaled
//! matrix, multiply a vector and hand the result to a factorization. Any
//! storage that provides these can be used for K, B and the auxiliary matrix.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

#[cfg(feature = "sprs-backend")]
use sprs::CsMat;

use crate::error::{EigenError, Result};

/// Capability set {copy, axpy, multiply, densify} over a concrete matrix type.
pub trait OperatorMatrix {
    /// (rows, cols)
    fn dims(&self) -> (usize, usize);

    /// True when `other` has the same dimensions and stored entries.
    fn same_pattern(&self, other: &Self) -> bool;

    /// self ← other. Patterns must match.
    fn copy_values_from(&mut self, other: &Self) -> Result<()>;

    /// self ← self + alpha * other. Patterns must match.
    fn add_scaled(&mut self, alpha: f64, other: &Self) -> Result<()>;

    /// Set every stored entry to zero, keeping the pattern.
    fn zero_entries(&mut self);

    /// y = A x
    fn mult(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Dense copy, used by dense factorization backends.
    fn to_dense(&self) -> DMatrix<f64>;
}

impl OperatorMatrix for DMatrix<f64> {
    fn dims(&self) -> (usize, usize) {
        self.shape()
    }

    fn same_pattern(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }

    fn copy_values_from(&mut self, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("dense"));
        }
        self.copy_from(other);
        Ok(())
    }

    fn add_scaled(&mut self, alpha: f64, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("dense"));
        }
        *self += other * alpha;
        Ok(())
    }

    fn zero_entries(&mut self) {
        self.fill(0.0);
    }

    fn mult(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }

    fn to_dense(&self) -> DMatrix<f64> {
        self.clone()
    }
}

impl OperatorMatrix for CsrMatrix<f64> {
    fn dims(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn same_pattern(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }

    fn copy_values_from(&mut self, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("CSR"));
        }
        self.values_mut().copy_from_slice(other.values());
        Ok(())
    }

    fn add_scaled(&mut self, alpha: f64, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("CSR"));
        }
        for (a, &b) in self.values_mut().iter_mut().zip(other.values()) {
            *a += alpha * b;
        }
        Ok(())
    }

    fn zero_entries(&mut self) {
        self.values_mut().fill(0.0);
    }

    #[inline]
    fn mult(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }

    fn to_dense(&self) -> DMatrix<f64> {
        let mut a = DMatrix::zeros(self.nrows(), self.ncols());
        for (i, row) in self.row_iter().enumerate() {
            for (&col, &val) in row.col_indices().iter().zip(row.values().iter()) {
                a[(i, col)] += val;
            }
        }
        a
    }
}

#[cfg(feature = "sprs-backend")]
impl OperatorMatrix for CsMat<f64> {
    fn dims(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    fn same_pattern(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.storage() == other.storage()
            && self.indptr().raw_storage() == other.indptr().raw_storage()
            && self.indices() == other.indices()
    }

    fn copy_values_from(&mut self, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("sprs"));
        }
        self.data_mut().copy_from_slice(other.data());
        Ok(())
    }

    fn add_scaled(&mut self, alpha: f64, other: &Self) -> Result<()> {
        if !self.same_pattern(other) {
            return Err(EigenError::SparsityMismatch("sprs"));
        }
        for (a, &b) in self.data_mut().iter_mut().zip(other.data()) {
            *a += alpha * b;
        }
        Ok(())
    }

    fn zero_entries(&mut self) {
        self.data_mut().fill(0.0);
    }

    fn mult(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.rows());
        if self.is_csr() {
            sprs::prod::mul_acc_mat_vec_csr(self.view(), x.as_slice(), y.as_mut_slice());
        } else {
            sprs::prod::mul_acc_mat_vec_csc(self.view(), x.as_slice(), y.as_mut_slice());
        }
        y
    }

    fn to_dense(&self) -> DMatrix<f64> {
        let mut a = DMatrix::zeros(self.rows(), self.cols());
        for (&val, (row, col)) in self.iter() {
            a[(row, col)] += val;
        }
        a
    }
}

/// Bᵀ-weighted inner product xᵀ B y.
pub fn weighted_dot<M: OperatorMatrix + ?Sized>(b: &M, x: &DVector<f64>, y: &DVector<f64>) -> f64 {
    x.dot(&b.mult(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn tridiagonal_csr(n: usize, diag: f64, off: f64) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            coo.push(i, i, diag);
            if i + 1 < n {
                coo.push(i, i + 1, off);
                coo.push(i + 1, i, off);
            }
        }
        CsrMatrix::from(&coo)
    }

    #[test]
    fn csr_copy_and_axpy_match_dense() {
        let k = tridiagonal_csr(4, 2.0, -1.0);
        let m = tridiagonal_csr(4, 4.0, 1.0);
        let mut aux = k.clone();
        aux.zero_entries();

        aux.copy_values_from(&k).unwrap();
        aux.add_scaled(-0.5, &m).unwrap();

        let expected = k.to_dense() - 0.5 * m.to_dense();
        let got = aux.to_dense();
        assert!((got - expected).amax() < 1e-14);
    }

    #[test]
    fn dense_add_scaled_forms_shifted_matrix() {
        let k = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 2.0]);
        let b = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let mut aux = DMatrix::<f64>::zeros(2, 2);
        aux.copy_values_from(&k).unwrap();
        aux.add_scaled(-0.25, &b).unwrap();
        let expected = DMatrix::from_row_slice(2, 2, &[1.5, -1.25, -1.25, 1.5]);
        assert!((aux - expected).amax() < 1e-15);

        let mut wrong = DMatrix::<f64>::zeros(3, 3);
        assert!(matches!(
            wrong.add_scaled(1.0, &k),
            Err(EigenError::SparsityMismatch(_))
        ));
    }

    #[test]
    fn csr_rejects_mismatched_pattern() {
        let k = tridiagonal_csr(4, 2.0, -1.0);
        let mut diag = {
            let mut coo = CooMatrix::new(4, 4);
            for i in 0..4 {
                coo.push(i, i, 1.0);
            }
            CsrMatrix::from(&coo)
        };
        assert!(matches!(
            diag.add_scaled(1.0, &k),
            Err(EigenError::SparsityMismatch(_))
        ));
        assert!(diag.copy_values_from(&k).is_err());
    }

    #[test]
    fn dense_rejects_mismatched_shape() {
        let mut a = DMatrix::<f64>::zeros(3, 3);
        let b = DMatrix::<f64>::identity(4, 4);
        assert!(a.copy_values_from(&b).is_err());
    }

    #[test]
    fn weighted_dot_uses_matrix() {
        let b = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 2.0, 3.0]));
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        assert!((weighted_dot(&b, &x, &x) - 6.0).abs() < 1e-15);
    }

    #[test]
    fn zero_entries_keeps_pattern() {
        let mut k = tridiagonal_csr(5, 2.0, -1.0);
        let nnz = k.nnz();
        k.zero_entries();
        assert_eq!(k.nnz(), nnz);
        assert!(k.values().iter().all(|v| *v == 0.0));
    }

    #[cfg(feature = "sprs-backend")]
    #[test]
    fn sprs_axpy_matches_dense() {
        let mut tri = sprs::TriMat::new((3, 3));
        for i in 0..3 {
            tri.add_triplet(i, i, 2.0);
        }
        tri.add_triplet(0, 1, -1.0);
        tri.add_triplet(1, 0, -1.0);
        let k: CsMat<f64> = tri.to_csr();
        let mut aux = k.clone();
        aux.zero_entries();
        aux.copy_values_from(&k).unwrap();
        aux.add_scaled(2.0, &k).unwrap();
        // CsMat has an inherent ndarray `to_dense`, so go through the trait.
        let k_dense = OperatorMatrix::to_dense(&k);
        let expected = 3.0 * &k_dense;
        assert!((OperatorMatrix::to_dense(&aux) - expected).amax() < 1e-14);

        let x = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let y = k.mult(&x);
        assert!((y - k_dense * &x).amax() < 1e-14);
    }
}
