//! Interfaces to the structural model that assembles operator matrices.
//!
//! The analyses never build element physics themselves. They ask the model to
//! fill caller-owned matrices and to contract matrix derivatives with
//! eigenvectors, so the model is free to compute design derivatives element
//! by element without ever forming ∂K/∂xₖ globally.

use nalgebra::DVector;

use crate::error::Result;
use crate::matrix::OperatorMatrix;
use crate::types::MatrixKind;

/// A finite-element model with design variables.
pub trait StructuralModel {
    /// Matrix storage this model assembles into.
    type Matrix: OperatorMatrix;

    fn num_dofs(&self) -> usize;

    fn num_design_vars(&self) -> usize;

    fn design_vars(&self) -> Vec<f64>;

    /// Replace the design. Assembled matrices become out of date.
    fn set_design_vars(&mut self, x: &[f64]) -> Result<()>;

    /// Overwrite the values of `out` with K or M. The pattern of `out` must
    /// be the one produced by the model's own allocation.
    fn assemble_matrix(&self, kind: MatrixKind, out: &mut Self::Matrix) -> Result<()>;

    /// out[k] += scale · ψᵀ (∂A/∂xₖ) φ for every design variable, where A is
    /// the matrix selected by `kind`. `path` is the equilibrium state G is
    /// evaluated at and is ignored for K and M.
    fn add_matrix_dv_sens_inner_product(
        &self,
        kind: MatrixKind,
        scale: f64,
        psi: &DVector<f64>,
        phi: &DVector<f64>,
        path: Option<&DVector<f64>>,
        out: &mut [f64],
    ) -> Result<()>;
}

/// A model whose geometric stiffness depends on a static equilibrium state.
///
/// G is assembled sign-flipped so that compressive reference loads produce a
/// positive semi-definite matrix; buckling solves K u = λ G u with λ the load
/// factor.
pub trait PathDependentModel: StructuralModel {
    /// Static equilibrium displacements under the reference load `load_case`.
    fn solve_equilibrium_path(&mut self, load_case: usize) -> Result<DVector<f64>>;

    /// Overwrite `out` with G evaluated at `path`.
    fn assemble_geometric_stiffness(
        &self,
        path: &DVector<f64>,
        out: &mut Self::Matrix,
    ) -> Result<()>;

    /// ∂(ψᵀ G(path) φ)/∂path.
    fn geometric_stiffness_path_sens_product(
        &self,
        psi: &DVector<f64>,
        phi: &DVector<f64>,
        path: &DVector<f64>,
    ) -> Result<DVector<f64>>;

    /// Solve Kₜᵀ ψ = rhs with the tangent stiffness at `path`.
    fn solve_tangent_adjoint(&self, path: &DVector<f64>, rhs: &DVector<f64>)
        -> Result<DVector<f64>>;

    /// out[k] += scale · adjointᵀ (∂R/∂xₖ) at fixed `path`, where R is the
    /// equilibrium residual (internal minus external force).
    fn add_residual_dv_sens_product(
        &self,
        load_case: usize,
        path: &DVector<f64>,
        adjoint: &DVector<f64>,
        scale: f64,
        out: &mut [f64],
    ) -> Result<()>;
}
