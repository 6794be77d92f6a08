//! Design sensitivities of converged eigenvalues.
//!
//! Two independent stages:
//!
//! 1. [`rayleigh_quotient_sensitivity`]: the explicit derivative of the
//!    Rayleigh quotient with every matrix held at its current state,
//!    dλ/dxₖ = uᵀ(∂K/∂xₖ − λ ∂B/∂xₖ)u / (uᵀBu).
//! 2. [`path_adjoint_sensitivity`]: for buckling, G is evaluated at an
//!    equilibrium path p(x) with R(p, x) = 0. Its total derivative adds
//!    −λ gᵀ dp/dxₖ / (uᵀGu) with g = ∂(uᵀGu)/∂p. Since Kₜ dp/dxₖ = −∂R/∂xₖ,
//!    one adjoint solve Kₜᵀψ = g turns this into λ ψᵀ ∂R/∂xₖ / (uᵀGu) for
//!    every design variable at once.

use nalgebra::DVector;

use crate::error::{EigenError, Result};
use crate::model::{PathDependentModel, StructuralModel};
use crate::types::MatrixKind;

fn check_buffer(expected: usize, out: &[f64]) -> Result<()> {
    if out.len() != expected {
        return Err(EigenError::DesignVarLength {
            expected,
            found: out.len(),
        });
    }
    Ok(())
}

fn check_norm(b_kind: MatrixKind, u_b_u: f64) -> Result<()> {
    if !(u_b_u.is_finite() && u_b_u > 0.0) {
        return Err(EigenError::IndefiniteInnerProduct(b_kind));
    }
    Ok(())
}

/// Overwrite `out` with the explicit eigenvalue derivative.
///
/// `u_b_u` is uᵀBu for the B selected by `b_kind`; `path` is forwarded to the
/// model for path-dependent B.
pub fn rayleigh_quotient_sensitivity<Mdl>(
    model: &Mdl,
    b_kind: MatrixKind,
    lambda: f64,
    u: &DVector<f64>,
    u_b_u: f64,
    path: Option<&DVector<f64>>,
    out: &mut [f64],
) -> Result<()>
where
    Mdl: StructuralModel + ?Sized,
{
    check_buffer(model.num_design_vars(), out)?;
    check_norm(b_kind, u_b_u)?;
    out.fill(0.0);

    let scale = 1.0 / u_b_u;
    model.add_matrix_dv_sens_inner_product(MatrixKind::Stiffness, scale, u, u, path, out)?;
    model.add_matrix_dv_sens_inner_product(b_kind, -lambda * scale, u, u, path, out)?;
    Ok(())
}

/// Add the implicit equilibrium-path term to `out` and return the adjoint ψ.
pub fn path_adjoint_sensitivity<Mdl>(
    model: &Mdl,
    load_case: usize,
    lambda: f64,
    u: &DVector<f64>,
    u_g_u: f64,
    path: &DVector<f64>,
    out: &mut [f64],
) -> Result<DVector<f64>>
where
    Mdl: PathDependentModel + ?Sized,
{
    check_buffer(model.num_design_vars(), out)?;
    check_norm(MatrixKind::GeometricStiffness, u_g_u)?;

    let g = model.geometric_stiffness_path_sens_product(u, u, path)?;
    if g.len() != path.len() {
        return Err(EigenError::DimensionMismatch {
            what: "path sensitivity of uᵀGu",
            expected: path.len(),
            found: g.len(),
        });
    }
    let adjoint = model.solve_tangent_adjoint(path, &g)?;
    log::debug!(
        "path adjoint for lambda = {lambda:.6e}: |g| = {:.3e}, |psi| = {:.3e}",
        g.norm(),
        adjoint.norm()
    );
    model.add_residual_dv_sens_product(load_case, path, &adjoint, lambda / u_g_u, out)?;
    Ok(adjoint)
}
