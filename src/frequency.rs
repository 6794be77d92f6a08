//! Natural frequency analysis: K u = λ M u with λ = ω².

use nalgebra::{DMatrix, DVector};

use crate::analysis::EigenSession;
use crate::config::EigenConfig;
use crate::error::{EigenError, Result};
use crate::lanczos::SolveReport;
use crate::linear_solver::LinearSolver;
use crate::model::StructuralModel;
use crate::progress::ProgressSink;
use crate::sensitivity::rayleigh_quotient_sensitivity;
use crate::types::{AnalysisState, MatrixKind};

/// Modal analysis of a [`StructuralModel`].
///
/// K, M and the auxiliary matrix are borrowed from the caller and must come
/// from the model's own allocation so they share one sparsity pattern.
pub struct FrequencyAnalysis<'a, Mdl, S>
where
    Mdl: StructuralModel,
{
    model: &'a mut Mdl,
    session: EigenSession<'a, Mdl::Matrix, S>,
    state: AnalysisState,
    assembled: bool,
}

impl<'a, Mdl, S> FrequencyAnalysis<'a, Mdl, S>
where
    Mdl: StructuralModel,
    S: LinearSolver<Mdl::Matrix>,
{
    pub fn new(
        model: &'a mut Mdl,
        sigma: f64,
        kmat: &'a mut Mdl::Matrix,
        mmat: &'a mut Mdl::Matrix,
        aux_mat: &'a mut Mdl::Matrix,
        solver: &'a mut S,
        config: EigenConfig,
    ) -> Result<Self> {
        let session =
            EigenSession::new(kmat, mmat, aux_mat, solver, MatrixKind::Mass, sigma, config)?;
        let n = session.size();
        if n != model.num_dofs() {
            return Err(EigenError::DimensionMismatch {
                what: "stiffness matrix vs model dofs",
                expected: model.num_dofs(),
                found: n,
            });
        }
        Ok(Self {
            model,
            session,
            state: AnalysisState::Constructed,
            assembled: false,
        })
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn model(&self) -> &Mdl {
        &*self.model
    }

    pub fn sigma(&self) -> f64 {
        self.session.sigma()
    }

    /// Move the shift. Drops the factorization; existing eigenpairs become
    /// stale until the next solve.
    pub fn set_sigma(&mut self, sigma: f64) {
        self.session.set_sigma(sigma);
        self.state = AnalysisState::Constructed;
    }

    /// Change the design. K and M are reassembled by the next solve and all
    /// eigenpairs are discarded.
    pub fn set_design_vars(&mut self, x: &[f64]) -> Result<()> {
        self.model.set_design_vars(x)?;
        self.assembled = false;
        self.session.sep.reset();
        self.state = AnalysisState::Constructed;
        Ok(())
    }

    pub fn solve(&mut self, progress: Option<&mut dyn ProgressSink>) -> Result<SolveReport> {
        match self.try_solve(progress) {
            Ok(report) => {
                // A partial result stays extractable, so it is not a failure.
                self.state = if report.status.is_converged() {
                    AnalysisState::Converged
                } else {
                    AnalysisState::Factored
                };
                Ok(report)
            }
            Err(err) => {
                self.state = AnalysisState::Failed;
                Err(err)
            }
        }
    }

    fn try_solve(&mut self, progress: Option<&mut dyn ProgressSink>) -> Result<SolveReport> {
        if !self.assembled {
            let model = &*self.model;
            self.session.op.reassemble(|k, m| {
                model.assemble_matrix(MatrixKind::Stiffness, k)?;
                model.assemble_matrix(MatrixKind::Mass, m)
            })?;
            self.assembled = true;
        }
        self.session.op.ensure_factored()?;
        self.state = AnalysisState::Factored;
        self.session.run(progress)
    }

    pub fn num_converged(&self) -> usize {
        self.session.sep.num_converged()
    }

    /// (λₙ, residual error). λ is ω² in rad²/s².
    pub fn extract_eigenvalue(&self, n: usize) -> Result<(f64, f64)> {
        self.session.extract_eigenvalue(n)
    }

    /// Copy the M-normalized mode shape into `out` and return its error.
    pub fn extract_eigenvector(&self, n: usize, out: &mut DVector<f64>) -> Result<f64> {
        self.session.extract_eigenvector(n, out)
    }

    /// √λₙ / 2π
    pub fn extract_frequency_hz(&self, n: usize) -> Result<f64> {
        self.session.extract_frequency_hz(n)
    }

    pub fn check_eigenvector(&self, n: usize) -> Result<f64> {
        self.session.check_eigenvector(n)
    }

    pub fn check_orthogonality(&self) -> Result<f64> {
        self.session.check_orthogonality()
    }

    pub fn print_orthogonality(&self) -> Result<DMatrix<f64>> {
        self.session.print_orthogonality()
    }

    /// dλₙ/dxₖ for every design variable.
    pub fn eval_eigen_dv_sens(&self, n: usize, out: &mut [f64]) -> Result<()> {
        let num_dvs = self.model.num_design_vars();
        if out.len() != num_dvs {
            return Err(EigenError::DesignVarLength {
                expected: num_dvs,
                found: out.len(),
            });
        }
        let (lambda, u, u_m_u) = self.session.sensitivity_pair(n)?;
        rayleigh_quotient_sensitivity(&*self.model, MatrixKind::Mass, lambda, u, u_m_u, None, out)
    }
}
