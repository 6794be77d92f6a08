//! Linearized buckling analysis: K u = λ G u, λ the load factor.
//!
//! G is the geometric stiffness at the equilibrium path for the reference
//! load. The path is computed once by the model and reused across shifts;
//! only a design change forces a new path.

use nalgebra::{DMatrix, DVector};

use crate::analysis::EigenSession;
use crate::config::EigenConfig;
use crate::error::{EigenError, Result};
use crate::lanczos::SolveReport;
use crate::linear_solver::LinearSolver;
use crate::model::PathDependentModel;
use crate::progress::ProgressSink;
use crate::sensitivity::{path_adjoint_sensitivity, rayleigh_quotient_sensitivity};
use crate::types::{AnalysisState, MatrixKind};

pub struct BucklingAnalysis<'a, Mdl, S>
where
    Mdl: PathDependentModel,
{
    model: &'a mut Mdl,
    load_case: usize,
    session: EigenSession<'a, Mdl::Matrix, S>,
    path: Option<DVector<f64>>,
    state: AnalysisState,
    assembled: bool,
}

impl<'a, Mdl, S> BucklingAnalysis<'a, Mdl, S>
where
    Mdl: PathDependentModel,
    S: LinearSolver<Mdl::Matrix>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: &'a mut Mdl,
        load_case: usize,
        sigma: f64,
        kmat: &'a mut Mdl::Matrix,
        gmat: &'a mut Mdl::Matrix,
        aux_mat: &'a mut Mdl::Matrix,
        solver: &'a mut S,
        config: EigenConfig,
    ) -> Result<Self> {
        let session = EigenSession::new(
            kmat,
            gmat,
            aux_mat,
            solver,
            MatrixKind::GeometricStiffness,
            sigma,
            config,
        )?;
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
            load_case,
            session,
            path: None,
            state: AnalysisState::Constructed,
            assembled: false,
        })
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn load_case(&self) -> usize {
        self.load_case
    }

    pub fn model(&self) -> &Mdl {
        &*self.model
    }

    /// Equilibrium path of the last solve, if one has been computed.
    pub fn path(&self) -> Option<&DVector<f64>> {
        self.path.as_ref()
    }

    pub fn sigma(&self) -> f64 {
        self.session.sigma()
    }

    /// Move the shift. The path and assembled matrices are kept; the next
    /// solve only re-factors.
    pub fn set_sigma(&mut self, sigma: f64) {
        self.session.set_sigma(sigma);
        self.state = if self.path.is_some() {
            AnalysisState::PathSolved
        } else {
            AnalysisState::Constructed
        };
    }

    /// Change the design. Path, matrices and eigenpairs are all dropped.
    pub fn set_design_vars(&mut self, x: &[f64]) -> Result<()> {
        self.model.set_design_vars(x)?;
        self.path = None;
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
        if self.path.is_none() {
            let path = self.model.solve_equilibrium_path(self.load_case)?;
            if path.len() != self.model.num_dofs() {
                return Err(EigenError::DimensionMismatch {
                    what: "equilibrium path",
                    expected: self.model.num_dofs(),
                    found: path.len(),
                });
            }
            log::debug!(
                "equilibrium path for load case {}: |u| = {:.4e}",
                self.load_case,
                path.norm()
            );
            self.path = Some(path);
            self.assembled = false;
        }
        self.state = AnalysisState::PathSolved;

        if !self.assembled {
            let model = &*self.model;
            let path = self
                .path
                .as_ref()
                .ok_or_else(|| EigenError::Model("equilibrium path unavailable".into()))?;
            self.session.op.reassemble(|k, g| {
                model.assemble_matrix(MatrixKind::Stiffness, k)?;
                model.assemble_geometric_stiffness(path, g)
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

    /// (λₙ, residual error). λ multiplies the reference load.
    pub fn extract_eigenvalue(&self, n: usize) -> Result<(f64, f64)> {
        self.session.extract_eigenvalue(n)
    }

    /// Copy the G-normalized buckling mode into `out` and return its error.
    pub fn extract_eigenvector(&self, n: usize, out: &mut DVector<f64>) -> Result<f64> {
        self.session.extract_eigenvector(n, out)
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

    /// Total dλₙ/dxₖ, including the path-dependence of G.
    pub fn eval_eigen_dv_sens(&self, n: usize, out: &mut [f64]) -> Result<()> {
        let num_dvs = self.model.num_design_vars();
        if out.len() != num_dvs {
            return Err(EigenError::DesignVarLength {
                expected: num_dvs,
                found: out.len(),
            });
        }
        let (lambda, u, u_g_u) = self.session.sensitivity_pair(n)?;
        let path = self.path.as_ref().ok_or(EigenError::NotSolved)?;
        let model = &*self.model;

        rayleigh_quotient_sensitivity(
            model,
            MatrixKind::GeometricStiffness,
            lambda,
            u,
            u_g_u,
            Some(path),
            out,
        )?;
        path_adjoint_sensitivity(model, self.load_case, lambda, u, u_g_u, path, out)?;
        Ok(())
    }
}
