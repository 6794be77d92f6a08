//! 8-node hexahedral (Hex8) solid element.
//!
//! Trilinear shape functions, isotropic elasticity and 2×2×2 Gauss
//! quadrature. Node ordering: bottom face (z-) then top face (z+), each
//! counterclockwise.

use nalgebra::{Matrix3, SVector, Vector3};

use crate::error::{EigenError, Result};
use crate::types::{
    Matrix24x24, Matrix3x24, Matrix3x8, Matrix6, Matrix6x24, NodeCoords, GAUSS_G, MIN_DET_J,
};

/// Isotropic linear-elastic material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidMaterial {
    /// Young's modulus (Pa)
    pub e: f64,
    /// Poisson's ratio
    pub nu: f64,
    /// Density (kg/m³)
    pub rho: f64,
}

impl SolidMaterial {
    pub fn new(e: f64, nu: f64, rho: f64) -> Result<Self> {
        if !(e > 0.0 && rho > 0.0 && nu > -1.0 && nu < 0.5) {
            return Err(EigenError::Model(format!(
                "invalid solid material: E = {e}, nu = {nu}, rho = {rho}"
            )));
        }
        Ok(Self { e, nu, rho })
    }

    /// 6×6 isotropic elasticity matrix in Voigt order (xx, yy, zz, xy, yz, zx).
    pub fn elasticity_matrix(&self) -> Matrix6 {
        let nu = self.nu;
        let factor = self.e / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let normal = factor * (1.0 - nu);
        let coupling = factor * nu;
        let shear = factor * (1.0 - 2.0 * nu) / 2.0;

        let mut d = Matrix6::zeros();
        for i in 0..3 {
            for j in 0..3 {
                d[(i, j)] = if i == j { normal } else { coupling };
            }
            d[(i + 3, i + 3)] = shear;
        }
        d
    }
}

/// Element stiffness, mass and volume.
#[derive(Debug, Clone)]
pub struct Hex8Matrices {
    pub stiffness: Matrix24x24,
    pub mass: Matrix24x24,
    pub volume: f64,
}

/// 2×2×2 Gauss points; every weight is 1.
pub fn gauss_points_3d() -> [Vector3<f64>; 8] {
    let g = GAUSS_G;
    [
        Vector3::new(-g, -g, -g),
        Vector3::new(g, -g, -g),
        Vector3::new(g, g, -g),
        Vector3::new(-g, g, -g),
        Vector3::new(-g, -g, g),
        Vector3::new(g, -g, g),
        Vector3::new(g, g, g),
        Vector3::new(-g, g, g),
    ]
}

/// Natural coordinates of the corner nodes.
const CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Hex8 shape functions at (xi, eta, zeta).
pub fn shape_functions_hex8(xi: f64, eta: f64, zeta: f64) -> SVector<f64, 8> {
    SVector::<f64, 8>::from_fn(|i, _| {
        let [a, b, c] = CORNERS[i];
        0.125 * (1.0 + a * xi) * (1.0 + b * eta) * (1.0 + c * zeta)
    })
}

/// Shape function derivatives w.r.t. natural coordinates.
pub fn shape_function_derivatives_hex8(xi: f64, eta: f64, zeta: f64) -> Matrix3x8 {
    let mut d_n = Matrix3x8::zeros();
    for (i, &[a, b, c]) in CORNERS.iter().enumerate() {
        d_n[(0, i)] = 0.125 * a * (1.0 + b * eta) * (1.0 + c * zeta);
        d_n[(1, i)] = 0.125 * b * (1.0 + a * xi) * (1.0 + c * zeta);
        d_n[(2, i)] = 0.125 * c * (1.0 + a * xi) * (1.0 + b * eta);
    }
    d_n
}

fn strain_displacement(d_n_phys: &Matrix3x8) -> Matrix6x24 {
    let mut b = Matrix6x24::zeros();
    for i in 0..8 {
        let col = 3 * i;
        let dndx = d_n_phys[(0, i)];
        let dndy = d_n_phys[(1, i)];
        let dndz = d_n_phys[(2, i)];

        b[(0, col)] = dndx;
        b[(1, col + 1)] = dndy;
        b[(2, col + 2)] = dndz;

        b[(3, col)] = dndy;
        b[(3, col + 1)] = dndx;
        b[(4, col + 1)] = dndz;
        b[(4, col + 2)] = dndy;
        b[(5, col)] = dndz;
        b[(5, col + 2)] = dndx;
    }
    b
}

/// Stiffness and consistent mass of one hexahedron.
///
/// An element with a non-positive Jacobian at any Gauss point is inverted or
/// degenerate and is rejected.
pub fn hex8_element_matrices(
    node_coords: &NodeCoords,
    material: &SolidMaterial,
) -> Result<Hex8Matrices> {
    let d = material.elasticity_matrix();
    let mut ke = Matrix24x24::zeros();
    let mut me = Matrix24x24::zeros();
    let mut volume = 0.0;

    for point in gauss_points_3d() {
        let (xi, eta, zeta) = (point.x, point.y, point.z);
        let n = shape_functions_hex8(xi, eta, zeta);
        let d_n_nat = shape_function_derivatives_hex8(xi, eta, zeta);

        let j: Matrix3<f64> = d_n_nat * node_coords;
        let det_j = j.determinant();
        if det_j <= MIN_DET_J {
            return Err(EigenError::Model(format!(
                "degenerate hexahedron: det J = {det_j:.3e}"
            )));
        }
        let j_inv = j
            .try_inverse()
            .ok_or_else(|| EigenError::Model("singular hexahedron Jacobian".into()))?;

        let b = strain_displacement(&(j_inv * d_n_nat));
        ke += det_j * (b.transpose() * d * b);

        let mut n_mat = Matrix3x24::zeros();
        for i in 0..8 {
            let col = 3 * i;
            n_mat[(0, col)] = n[i];
            n_mat[(1, col + 1)] = n[i];
            n_mat[(2, col + 2)] = n[i];
        }
        me += (det_j * material.rho) * (n_mat.transpose() * n_mat);
        volume += det_j;
    }

    Ok(Hex8Matrices {
        stiffness: 0.5 * (ke + ke.transpose()),
        mass: 0.5 * (me + me.transpose()),
        volume,
    })
}
