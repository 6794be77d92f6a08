//! Global assembly of scaled element blocks into each supported storage.
//!
//! Every entry of every element block is stored, zero or not, so the result
//! has the same sparsity pattern for any choice of scales. K, M and the
//! auxiliary matrix built this way can always be combined by copy/axpy.

use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

#[cfg(feature = "sprs-backend")]
use sprs::{CsMat, TriMat};

use crate::matrix::OperatorMatrix;
use crate::types::Matrix24x24;

/// Storage that can be assembled from 24×24 element blocks.
pub trait GlobalAssembly: OperatorMatrix + Sized {
    /// Σₑ scales[e] · blocks[e], scattered through `dof_maps[e]`.
    fn assemble_blocks(
        num_dofs: usize,
        dof_maps: &[[usize; 24]],
        blocks: &[Matrix24x24],
        scales: &[f64],
    ) -> Self;
}

fn for_each_entry(
    dof_maps: &[[usize; 24]],
    blocks: &[Matrix24x24],
    scales: &[f64],
    mut push: impl FnMut(usize, usize, f64),
) {
    for ((dofs, local), &scale) in dof_maps.iter().zip(blocks).zip(scales) {
        for i in 0..24 {
            for j in 0..24 {
                push(dofs[i], dofs[j], scale * local[(i, j)]);
            }
        }
    }
}

impl GlobalAssembly for CsrMatrix<f64> {
    fn assemble_blocks(
        num_dofs: usize,
        dof_maps: &[[usize; 24]],
        blocks: &[Matrix24x24],
        scales: &[f64],
    ) -> Self {
        let mut coo = CooMatrix::new(num_dofs, num_dofs);
        for_each_entry(dof_maps, blocks, scales, |r, c, v| coo.push(r, c, v));
        CsrMatrix::from(&coo)
    }
}

/// Dense variant used for small test problems.
impl GlobalAssembly for DMatrix<f64> {
    fn assemble_blocks(
        num_dofs: usize,
        dof_maps: &[[usize; 24]],
        blocks: &[Matrix24x24],
        scales: &[f64],
    ) -> Self {
        let mut mat = DMatrix::<f64>::zeros(num_dofs, num_dofs);
        for_each_entry(dof_maps, blocks, scales, |r, c, v| mat[(r, c)] += v);
        mat
    }
}

#[cfg(feature = "sprs-backend")]
impl GlobalAssembly for CsMat<f64> {
    fn assemble_blocks(
        num_dofs: usize,
        dof_maps: &[[usize; 24]],
        blocks: &[Matrix24x24],
        scales: &[f64],
    ) -> Self {
        let mut tri = TriMat::new((num_dofs, num_dofs));
        for_each_entry(dof_maps, blocks, scales, |r, c, v| tri.add_triplet(r, c, v));
        tri.to_csr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_blocks() -> (Vec<[usize; 24]>, Vec<Matrix24x24>) {
        let first: [usize; 24] = std::array::from_fn(|i| i);
        let second: [usize; 24] = std::array::from_fn(|i| i + 12);
        (vec![first, second], vec![Matrix24x24::identity(); 2])
    }

    #[test]
    fn sparse_assembly_sums_overlaps() {
        let (maps, blocks) = identity_blocks();
        let csr = CsrMatrix::assemble_blocks(36, &maps, &blocks, &[1.0, 2.0]);
        assert_eq!(csr.nrows(), 36);
        let dense = csr.to_dense();
        assert_eq!(dense[(0, 0)], 1.0);
        assert_eq!(dense[(12, 12)], 3.0);
        assert_eq!(dense[(30, 30)], 2.0);
    }

    #[test]
    fn pattern_does_not_depend_on_scales() {
        let (maps, blocks) = identity_blocks();
        let a = CsrMatrix::assemble_blocks(36, &maps, &blocks, &[1.0, 2.0]);
        let b = CsrMatrix::assemble_blocks(36, &maps, &blocks, &[3.0, 5.0]);
        assert!(a.same_pattern(&b));
    }

    #[test]
    fn dense_and_sparse_agree() {
        let (maps, blocks) = identity_blocks();
        let csr = CsrMatrix::assemble_blocks(36, &maps, &blocks, &[0.5, 1.5]);
        let dense = DMatrix::assemble_blocks(36, &maps, &blocks, &[0.5, 1.5]);
        assert!((OperatorMatrix::to_dense(&csr) - dense).amax() < 1e-15);
    }
}
