//! Machinery shared by buckling and frequency analysis: one shift-invert
//! operator, one Lanczos solver, and the staleness rules that tie them.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

use crate::config::EigenConfig;
use crate::error::{EigenError, Result};
use crate::lanczos::{Sep, SolveReport, SpectralOperator};
use crate::linear_solver::LinearSolver;
use crate::matrix::{weighted_dot, OperatorMatrix};
use crate::progress::ProgressSink;
use crate::shift_invert::ShiftInvertOperator;
use crate::types::MatrixKind;

pub(crate) struct EigenSession<'a, M, S> {
    pub(crate) op: ShiftInvertOperator<'a, M, S>,
    pub(crate) sep: Sep,
}

impl<'a, M, S> EigenSession<'a, M, S>
where
    M: OperatorMatrix,
    S: LinearSolver<M>,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        kmat: &'a mut M,
        bmat: &'a mut M,
        aux_mat: &'a mut M,
        solver: &'a mut S,
        b_kind: MatrixKind,
        sigma: f64,
        config: EigenConfig,
    ) -> Result<Self> {
        let sep = Sep::new(config)?;
        let op = ShiftInvertOperator::new(kmat, bmat, aux_mat, solver, b_kind, sigma)?;
        Ok(Self { op, sep })
    }

    pub(crate) fn size(&self) -> usize {
        self.op.kmat().dims().0
    }

    pub(crate) fn sigma(&self) -> f64 {
        self.op.sigma()
    }

    pub(crate) fn set_sigma(&mut self, sigma: f64) {
        if sigma != self.op.sigma() {
            log::debug!("shift moved from {} to {sigma}", self.op.sigma());
        }
        self.op.set_sigma(sigma);
    }

    /// Factor if needed, then run Lanczos.
    pub(crate) fn run(&mut self, progress: Option<&mut dyn ProgressSink>) -> Result<SolveReport> {
        self.op.ensure_factored()?;
        self.sep.solve(&mut self.op, progress)
    }

    /// Eigenpairs exist and were computed at the current shift.
    pub(crate) fn ensure_current(&self) -> Result<()> {
        match self.sep.solved_sigma() {
            None => Err(EigenError::NotSolved),
            Some(solved_at) if solved_at != self.op.sigma() => Err(EigenError::Stale {
                solved_at,
                current: self.op.sigma(),
            }),
            Some(_) => Ok(()),
        }
    }

    pub(crate) fn extract_eigenvalue(&self, n: usize) -> Result<(f64, f64)> {
        self.ensure_current()?;
        self.sep.extract_eigenvalue(n)
    }

    pub(crate) fn extract_eigenvector(&self, n: usize, out: &mut DVector<f64>) -> Result<f64> {
        self.ensure_current()?;
        let (u, error) = self.sep.extract_eigenvector(n)?;
        if out.len() != u.len() {
            return Err(EigenError::DimensionMismatch {
                what: "eigenvector output",
                expected: u.len(),
                found: out.len(),
            });
        }
        out.copy_from(u);
        Ok(error)
    }

    pub(crate) fn extract_frequency_hz(&self, n: usize) -> Result<f64> {
        let (lambda, _) = self.extract_eigenvalue(n)?;
        Ok(lambda.max(0.0).sqrt() / (2.0 * PI))
    }

    /// Recompute and log the residual of a converged pair.
    pub(crate) fn check_eigenvector(&self, n: usize) -> Result<f64> {
        self.ensure_current()?;
        let (lambda, _) = self.sep.extract_eigenvalue(n)?;
        let (u, _) = self.sep.extract_eigenvector(n)?;
        let residual = self.op.relative_residual(lambda, u);
        let b_norm = weighted_dot(self.op.bmat(), u, u);
        log::info!(
            "eigenpair {n}: lambda = {lambda:.10e}, ||K u - lambda B u|| / ||K u|| = {residual:.4e}, \
             u^T B u = {b_norm:.6}"
        );
        Ok(residual)
    }

    pub(crate) fn check_orthogonality(&self) -> Result<f64> {
        self.ensure_current()?;
        let max_off = self.sep.check_orthogonality(&self.op);
        log::info!(
            "max |u_i^T B u_j| over {} retained vector(s): {max_off:.4e}",
            self.sep.num_retained()
        );
        Ok(max_off)
    }

    pub(crate) fn print_orthogonality(&self) -> Result<DMatrix<f64>> {
        self.ensure_current()?;
        let gram = self.sep.orthogonality_matrix(&self.op);
        log::info!("B-inner products of retained eigenvectors:");
        for i in 0..gram.nrows() {
            let row: Vec<String> = gram.row(i).iter().map(|v| format!("{v:11.3e}")).collect();
            log::info!("{:3}: {}", i, row.join(" "));
        }
        Ok(gram)
    }

    /// (λ, u, uᵀBu) for a converged, current pair.
    pub(crate) fn sensitivity_pair(&self, n: usize) -> Result<(f64, &DVector<f64>, f64)> {
        self.ensure_current()?;
        let (lambda, u) = self.sep.converged_eigenpair(n)?;
        let u_b_u = weighted_dot(self.op.bmat(), u, u);
        Ok((lambda, u, u_b_u))
    }
}
