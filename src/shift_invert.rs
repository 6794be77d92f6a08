//! Shift-and-invert operator for the pencil (K, B).
//!
//! Forms A = K - σB in the caller's auxiliary matrix, factors it once per
//! shift and applies y = A⁻¹ B x. The operator never owns K, B or A; it holds
//! exclusive borrows for its lifetime. Any change of σ or reassembly of K/B
//! drops the factorization.

use nalgebra::DVector;

use crate::error::{EigenError, Result};
use crate::lanczos::SpectralOperator;
use crate::linear_solver::LinearSolver;
use crate::matrix::OperatorMatrix;
use crate::types::MatrixKind;

pub struct ShiftInvertOperator<'a, M, S> {
    kmat: &'a mut M,
    bmat: &'a mut M,
    aux_mat: &'a mut M,
    solver: &'a mut S,
    b_kind: MatrixKind,
    sigma: f64,
    factored: bool,
    num_factorizations: usize,
}

impl<'a, M, S> ShiftInvertOperator<'a, M, S>
where
    M: OperatorMatrix,
    S: LinearSolver<M>,
{
    /// Wrap K, B and the auxiliary matrix. All three must be square with the
    /// same dimension; copy/axpy additionally require a shared pattern, which
    /// is checked when the operator is factored.
    pub fn new(
        kmat: &'a mut M,
        bmat: &'a mut M,
        aux_mat: &'a mut M,
        solver: &'a mut S,
        b_kind: MatrixKind,
        sigma: f64,
    ) -> Result<Self> {
        check_square("stiffness matrix", kmat.dims())?;
        let n = kmat.dims().0;
        check_dims(b_kind_label(b_kind), n, bmat.dims())?;
        check_dims("auxiliary matrix", n, aux_mat.dims())?;
        solver.clear();
        Ok(Self {
            kmat,
            bmat,
            aux_mat,
            solver,
            b_kind,
            sigma,
            factored: false,
            num_factorizations: 0,
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Set the shift. Always drops the current factorization.
    pub fn set_sigma(&mut self, sigma: f64) {
        self.sigma = sigma;
        self.invalidate();
    }

    pub fn b_kind(&self) -> MatrixKind {
        self.b_kind
    }

    pub fn kmat(&self) -> &M {
        &*self.kmat
    }

    pub fn bmat(&self) -> &M {
        &*self.bmat
    }

    pub fn is_factored(&self) -> bool {
        self.factored
    }

    /// Number of factorizations performed over the operator's lifetime.
    pub fn num_factorizations(&self) -> usize {
        self.num_factorizations
    }

    fn invalidate(&mut self) {
        if self.factored {
            log::debug!("dropping factorization of K - {}*B", self.sigma);
        }
        self.factored = false;
        self.solver.clear();
    }

    /// Give the assembler mutable access to K and B. The factorization is
    /// dropped before `assemble` runs, whether or not it succeeds.
    pub fn reassemble<F>(&mut self, assemble: F) -> Result<()>
    where
        F: FnOnce(&mut M, &mut M) -> Result<()>,
    {
        self.invalidate();
        assemble(&mut *self.kmat, &mut *self.bmat)?;
        let n = self.kmat.dims().0;
        check_square("stiffness matrix", self.kmat.dims())?;
        check_dims(b_kind_label(self.b_kind), n, self.bmat.dims())?;
        check_dims("auxiliary matrix", n, self.aux_mat.dims())
    }

    /// A ← K; A ← A - σB; factor A.
    pub fn factor(&mut self) -> Result<()> {
        self.invalidate();
        self.aux_mat.copy_values_from(&*self.kmat)?;
        self.aux_mat.add_scaled(-self.sigma, &*self.bmat)?;

        if let Err(err) = self.solver.factor(&*self.aux_mat) {
            log::warn!(
                "{} factorization of K - sigma*B failed at sigma = {}: {err}",
                self.solver.name(),
                self.sigma
            );
            return Err(EigenError::Factorization {
                matrix: self.b_kind,
                sigma: self.sigma,
                reason: err.to_string(),
            });
        }
        self.factored = true;
        self.num_factorizations += 1;
        log::debug!(
            "factored K - {}*B with {} ({} factorization(s) so far)",
            self.sigma,
            self.solver.name(),
            self.num_factorizations
        );
        Ok(())
    }

    /// Factor only if no valid factorization exists for the current σ.
    pub fn ensure_factored(&mut self) -> Result<()> {
        if self.factored {
            Ok(())
        } else {
            self.factor()
        }
    }
}

impl<M, S> SpectralOperator for ShiftInvertOperator<'_, M, S>
where
    M: OperatorMatrix,
    S: LinearSolver<M>,
{
    fn size(&self) -> usize {
        self.kmat.dims().0
    }

    fn sigma(&self) -> f64 {
        self.sigma
    }

    fn inner_kind(&self) -> MatrixKind {
        self.b_kind
    }

    /// y solves (K - σB) y = B x.
    fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>> {
        if !self.factored {
            return Err(EigenError::NotFactored);
        }
        let bx = self.bmat.mult(x);
        self.solver.solve(&bx)
    }

    fn mult_b(&self, x: &DVector<f64>) -> DVector<f64> {
        self.bmat.mult(x)
    }

    /// ‖Ku − λBu‖ / ‖Ku‖, falling back to |λ|‖Bu‖ when Ku vanishes.
    fn relative_residual(&self, lambda: f64, u: &DVector<f64>) -> f64 {
        let ku = self.kmat.mult(u);
        let bu = self.bmat.mult(u);
        let scale = ku.norm().max(lambda.abs() * bu.norm());
        let res = (ku - lambda * bu).norm();
        if scale > 0.0 {
            res / scale
        } else {
            res
        }
    }
}

fn b_kind_label(kind: MatrixKind) -> &'static str {
    match kind {
        MatrixKind::Stiffness => "stiffness matrix",
        MatrixKind::Mass => "mass matrix",
        MatrixKind::GeometricStiffness => "geometric stiffness matrix",
    }
}

fn check_square(what: &'static str, dims: (usize, usize)) -> Result<()> {
    check_dims(what, dims.0, dims)
}

fn check_dims(what: &'static str, n: usize, dims: (usize, usize)) -> Result<()> {
    if dims.0 != n {
        return Err(EigenError::DimensionMismatch {
            what,
            expected: n,
            found: dims.0,
        });
    }
    if dims.1 != n {
        return Err(EigenError::DimensionMismatch {
            what,
            expected: n,
            found: dims.1,
        });
    }
    Ok(())
}
