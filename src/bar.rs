//! Free-free solid bar of hexahedra with per-slice design variables.
//!
//! Design variables come in two blocks of `num_slices` each: first a
//! stiffness scale per axial slice, then a density scale per axial slice.
//! K and M are linear in their scales, so element derivatives are the unit
//! element matrices themselves.

use std::marker::PhantomData;

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::assembly::GlobalAssembly;
use crate::element::{hex8_element_matrices, Hex8Matrices, SolidMaterial};
use crate::error::{EigenError, Result};
use crate::mesh::{generate_bar_mesh_3d, Mesh3d};
use crate::model::StructuralModel;
use crate::types::{Matrix24x24, MatrixKind};

/// Outer dimensions and mesh density of a bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub length: f64,
    pub width: f64,
    /// Height of each axial slice.
    pub slice_heights: Vec<f64>,
    pub ny: usize,
    pub nz: usize,
}

impl BarGeometry {
    /// Prismatic bar with `nx` slices of equal height.
    pub fn prismatic(length: f64, width: f64, height: f64, nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            length,
            width,
            slice_heights: vec![height; nx],
            ny,
            nz,
        }
    }
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
fn compute_all_element_matrices_sequential(
    mesh: &Mesh3d,
    material: &SolidMaterial,
) -> Result<Vec<Hex8Matrices>> {
    (0..mesh.elements.len())
        .map(|e| hex8_element_matrices(&mesh.element_coords(e), material))
        .collect()
}

/// Each element is independent, so the loop parallelizes trivially.
#[cfg(feature = "parallel")]
fn compute_all_element_matrices_parallel(
    mesh: &Mesh3d,
    material: &SolidMaterial,
) -> Result<Vec<Hex8Matrices>> {
    (0..mesh.elements.len())
        .into_par_iter()
        .map(|e| hex8_element_matrices(&mesh.element_coords(e), material))
        .collect()
}

#[inline]
fn compute_all_element_matrices(
    mesh: &Mesh3d,
    material: &SolidMaterial,
) -> Result<Vec<Hex8Matrices>> {
    #[cfg(feature = "parallel")]
    {
        compute_all_element_matrices_parallel(mesh, material)
    }
    #[cfg(not(feature = "parallel"))]
    {
        compute_all_element_matrices_sequential(mesh, material)
    }
}

/// Element-wise ψₑᵀ A φₑ.
fn element_inner_product(
    dofs: &[usize; 24],
    local: &Matrix24x24,
    psi: &DVector<f64>,
    phi: &DVector<f64>,
) -> f64 {
    let mut sum = 0.0;
    for i in 0..24 {
        let pi = psi[dofs[i]];
        if pi == 0.0 {
            continue;
        }
        for j in 0..24 {
            sum += pi * local[(i, j)] * phi[dofs[j]];
        }
    }
    sum
}

/// Free-free hexahedral bar model, generic over the assembled storage.
#[derive(Debug, Clone)]
pub struct HexBarModel<M = CsrMatrix<f64>> {
    mesh: Mesh3d,
    dof_maps: Vec<[usize; 24]>,
    unit_stiffness: Vec<Matrix24x24>,
    unit_mass: Vec<Matrix24x24>,
    stiffness_scale: Vec<f64>,
    density_scale: Vec<f64>,
    _storage: PhantomData<M>,
}

impl<M: GlobalAssembly> HexBarModel<M> {
    pub fn new(geometry: &BarGeometry, material: SolidMaterial) -> Result<Self> {
        let mesh = generate_bar_mesh_3d(
            geometry.length,
            geometry.width,
            &geometry.slice_heights,
            geometry.ny,
            geometry.nz,
        )?;
        let element_matrices = compute_all_element_matrices(&mesh, &material)?;
        let dof_maps = (0..mesh.elements.len())
            .map(|e| mesh.element_dofs(e))
            .collect();
        let (unit_stiffness, unit_mass) = element_matrices
            .into_iter()
            .map(|m| (m.stiffness, m.mass))
            .unzip();

        log::debug!(
            "hex bar: {} nodes, {} elements, {} slices",
            mesh.nodes.len(),
            mesh.elements.len(),
            mesh.num_slices
        );

        let num_slices = mesh.num_slices;
        Ok(Self {
            mesh,
            dof_maps,
            unit_stiffness,
            unit_mass,
            stiffness_scale: vec![1.0; num_slices],
            density_scale: vec![1.0; num_slices],
            _storage: PhantomData,
        })
    }

    pub fn mesh(&self) -> &Mesh3d {
        &self.mesh
    }

    pub fn num_slices(&self) -> usize {
        self.mesh.num_slices
    }

    /// Matrix with the model's sparsity pattern. K, M and the auxiliary
    /// matrix of an analysis must all come from here.
    pub fn allocate_matrix(&self) -> M {
        let ones = vec![1.0; self.dof_maps.len()];
        M::assemble_blocks(self.num_dofs(), &self.dof_maps, &self.unit_stiffness, &ones)
    }

    fn element_scales(&self, per_slice: &[f64]) -> Vec<f64> {
        self.mesh
            .slice_of_element
            .iter()
            .map(|&s| per_slice[s])
            .collect()
    }
}

impl<M: GlobalAssembly> StructuralModel for HexBarModel<M> {
    type Matrix = M;

    fn num_dofs(&self) -> usize {
        self.mesh.num_dofs()
    }

    fn num_design_vars(&self) -> usize {
        2 * self.mesh.num_slices
    }

    fn design_vars(&self) -> Vec<f64> {
        let mut x = self.stiffness_scale.clone();
        x.extend_from_slice(&self.density_scale);
        x
    }

    fn set_design_vars(&mut self, x: &[f64]) -> Result<()> {
        let expected = self.num_design_vars();
        if x.len() != expected {
            return Err(EigenError::DesignVarLength {
                expected,
                found: x.len(),
            });
        }
        if x.iter().any(|v| v.is_nan() || *v <= 0.0) {
            return Err(EigenError::Model("bar scale factors must be positive".into()));
        }
        let (k, m) = x.split_at(self.mesh.num_slices);
        self.stiffness_scale.copy_from_slice(k);
        self.density_scale.copy_from_slice(m);
        Ok(())
    }

    fn assemble_matrix(&self, kind: MatrixKind, out: &mut M) -> Result<()> {
        let (blocks, scales) = match kind {
            MatrixKind::Stiffness => (&self.unit_stiffness, &self.stiffness_scale),
            MatrixKind::Mass => (&self.unit_mass, &self.density_scale),
            MatrixKind::GeometricStiffness => {
                return Err(EigenError::Model(
                    "hex bar model has no geometric stiffness".into(),
                ))
            }
        };
        let assembled = M::assemble_blocks(
            self.num_dofs(),
            &self.dof_maps,
            blocks,
            &self.element_scales(scales),
        );
        out.copy_values_from(&assembled)
    }

    fn add_matrix_dv_sens_inner_product(
        &self,
        kind: MatrixKind,
        scale: f64,
        psi: &DVector<f64>,
        phi: &DVector<f64>,
        _path: Option<&DVector<f64>>,
        out: &mut [f64],
    ) -> Result<()> {
        let expected = self.num_design_vars();
        if out.len() != expected {
            return Err(EigenError::DesignVarLength {
                expected,
                found: out.len(),
            });
        }
        let n = self.num_dofs();
        if psi.len() != n || phi.len() != n {
            return Err(EigenError::DimensionMismatch {
                what: "sensitivity vectors",
                expected: n,
                found: psi.len().min(phi.len()),
            });
        }

        let (blocks, offset) = match kind {
            MatrixKind::Stiffness => (&self.unit_stiffness, 0),
            MatrixKind::Mass => (&self.unit_mass, self.mesh.num_slices),
            MatrixKind::GeometricStiffness => {
                return Err(EigenError::Model(
                    "hex bar model has no geometric stiffness".into(),
                ))
            }
        };
        for (e, (dofs, local)) in self.dof_maps.iter().zip(blocks).enumerate() {
            let slice = self.mesh.slice_of_element[e];
            out[offset + slice] += scale * element_inner_product(dofs, local, psi, phi);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::OperatorMatrix;
    use nalgebra::DMatrix;

    fn small_bar() -> HexBarModel {
        let geometry = BarGeometry::prismatic(0.4, 0.03, 0.02, 3, 1, 1);
        HexBarModel::new(&geometry, SolidMaterial::new(70e9, 0.33, 2700.0).unwrap()).unwrap()
    }

    #[test]
    fn assembled_matrices_share_pattern() {
        let model = small_bar();
        let mut k = model.allocate_matrix();
        let mut m = model.allocate_matrix();
        model.assemble_matrix(MatrixKind::Stiffness, &mut k).unwrap();
        model.assemble_matrix(MatrixKind::Mass, &mut m).unwrap();
        assert!(k.same_pattern(&m));
        assert_eq!(k.dims(), (model.num_dofs(), model.num_dofs()));
    }

    #[test]
    fn total_mass_matches_volume() {
        let model = small_bar();
        let mut m = model.allocate_matrix();
        model.assemble_matrix(MatrixKind::Mass, &mut m).unwrap();
        // Rigid x-translation: uᵀ M u is the total mass.
        let u = DVector::from_fn(model.num_dofs(), |i, _| if i % 3 == 0 { 1.0 } else { 0.0 });
        let total = u.dot(&m.mult(&u));
        let expected = 2700.0 * 0.4 * 0.03 * 0.02;
        assert!((total - expected).abs() < 1e-12 * expected.max(1.0));
    }

    #[test]
    fn design_scaling_is_linear() {
        let mut model = small_bar();
        let mut k1 = model.allocate_matrix();
        model.assemble_matrix(MatrixKind::Stiffness, &mut k1).unwrap();
        model.set_design_vars(&[2.0, 2.0, 2.0, 1.0, 1.0, 1.0]).unwrap();
        let mut k2 = model.allocate_matrix();
        model.assemble_matrix(MatrixKind::Stiffness, &mut k2).unwrap();
        let diff = k2.to_dense() - 2.0 * k1.to_dense();
        assert!(diff.amax() < 1e-9 * k1.to_dense().amax());
    }

    #[test]
    fn sensitivity_matches_slice_energy() {
        let model = small_bar();
        let n = model.num_dofs();
        let u = DVector::from_fn(n, |i, _| ((i * 13 + 5) % 11) as f64 / 11.0 - 0.5);
        let mut out = vec![0.0; model.num_design_vars()];
        model
            .add_matrix_dv_sens_inner_product(MatrixKind::Stiffness, 1.0, &u, &u, None, &mut out)
            .unwrap();

        // With unit scales the slice energies sum to uᵀKu.
        let mut k = model.allocate_matrix();
        model.assemble_matrix(MatrixKind::Stiffness, &mut k).unwrap();
        let energy = u.dot(&k.mult(&u));
        let sum: f64 = out[..3].iter().sum();
        assert!((sum - energy).abs() < 1e-9 * energy.abs());
        assert!(out[3..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dense_storage_matches_sparse() {
        let geometry = BarGeometry::prismatic(0.2, 0.02, 0.02, 2, 1, 1);
        let material = SolidMaterial::new(200e9, 0.3, 7800.0).unwrap();
        let sparse: HexBarModel = HexBarModel::new(&geometry, material).unwrap();
        let dense: HexBarModel<DMatrix<f64>> = HexBarModel::new(&geometry, material).unwrap();
        let mut ks = sparse.allocate_matrix();
        let mut kd = dense.allocate_matrix();
        sparse.assemble_matrix(MatrixKind::Mass, &mut ks).unwrap();
        dense.assemble_matrix(MatrixKind::Mass, &mut kd).unwrap();
        assert!((ks.to_dense() - kd).amax() < 1e-15);
    }

    #[test]
    fn geometric_stiffness_is_unavailable() {
        let model = small_bar();
        let mut g = model.allocate_matrix();
        assert!(model
            .assemble_matrix(MatrixKind::GeometricStiffness, &mut g)
            .is_err());
    }
}
