//! Factorization backends for the shifted matrix K - σB.
//!
//! A backend factors once and then serves any number of solves, which is what
//! lets the Lanczos iteration amortize the factorization over every step.

use nalgebra::{DMatrix, DVector, Dyn, LU};

#[cfg(feature = "sprs-backend")]
use sprs::{CsMat, FillInReduction, SymmetryCheck};
#[cfg(feature = "sprs-backend")]
use sprs_ldl::{Ldl, LdlNumeric};

use crate::error::{EigenError, Result};
use crate::matrix::OperatorMatrix;
use crate::types::PIVOT_TOL;

/// A direct solver for one matrix type.
pub trait LinearSolver<M: OperatorMatrix> {
    /// Human-readable backend name, used in log lines.
    fn name(&self) -> &'static str;

    /// Factor `a`, replacing any previous factorization. A singular or
    /// numerically singular matrix is an error; no regularization is applied.
    fn factor(&mut self, a: &M) -> Result<()>;

    /// Solve with the current factorization.
    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>>;

    fn is_factored(&self) -> bool;

    /// Drop the current factorization.
    fn clear(&mut self);
}

/// Ratio of smallest to largest pivot magnitude, or `None` for an empty set.
fn pivot_ratio(pivots: impl Iterator<Item = f64>) -> Option<(usize, f64)> {
    let mut max = 0.0_f64;
    let mut min = f64::INFINITY;
    let mut min_idx = 0;
    let mut count = 0;
    for (i, p) in pivots.enumerate() {
        let p = p.abs();
        if p < min {
            min = p;
            min_idx = i;
        }
        max = max.max(p);
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let ratio = if max > 0.0 { min / max } else { 0.0 };
    Some((min_idx, ratio))
}

/// Dense LU with partial pivoting. Works for any storage via `to_dense`, and
/// handles the indefinite shifted matrices that appear when σ lies inside the
/// spectrum.
#[derive(Default)]
pub struct DenseLuSolver {
    lu: Option<LU<f64, Dyn, Dyn>>,
}

impl DenseLuSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn factor_dense(&mut self, a: DMatrix<f64>) -> Result<()> {
        self.lu = None;
        let (rows, cols) = a.shape();
        if rows != cols {
            return Err(EigenError::DimensionMismatch {
                what: "shifted matrix columns",
                expected: rows,
                found: cols,
            });
        }
        let lu = a.lu();
        if !lu.is_invertible() {
            return Err(EigenError::LinearSolve("exact zero pivot in LU".into()));
        }
        let u = lu.u();
        if let Some((idx, ratio)) = pivot_ratio(u.diagonal().iter().copied()) {
            if ratio <= PIVOT_TOL {
                return Err(EigenError::LinearSolve(format!(
                    "pivot {idx} is numerically zero (relative magnitude {ratio:.3e})"
                )));
            }
        }
        self.lu = Some(lu);
        Ok(())
    }
}

impl<M: OperatorMatrix> LinearSolver<M> for DenseLuSolver {
    fn name(&self) -> &'static str {
        "nalgebra-LU"
    }

    fn factor(&mut self, a: &M) -> Result<()> {
        self.factor_dense(a.to_dense())
    }

    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let lu = self.lu.as_ref().ok_or(EigenError::NotFactored)?;
        lu.solve(rhs)
            .ok_or_else(|| EigenError::LinearSolve("LU solve returned no solution".into()))
    }

    fn is_factored(&self) -> bool {
        self.lu.is_some()
    }

    fn clear(&mut self) {
        self.lu = None;
    }
}

/// Sparse LDLᵀ from `sprs-ldl` with reverse Cuthill-McKee ordering.
///
/// No pivoting is performed, so the shifted matrix must admit an LDLᵀ
/// factorization in the chosen ordering. A zero pivot is reported as an error.
#[cfg(feature = "sprs-backend")]
#[derive(Default)]
pub struct SprsLdlSolver {
    ldl: Option<LdlNumeric<f64, usize>>,
}

#[cfg(feature = "sprs-backend")]
impl SprsLdlSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "sprs-backend")]
impl std::fmt::Debug for SprsLdlSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SprsLdlSolver(factored: {})", self.ldl.is_some())
    }
}

#[cfg(feature = "sprs-backend")]
impl LinearSolver<CsMat<f64>> for SprsLdlSolver {
    fn name(&self) -> &'static str {
        "sprs-LDL"
    }

    fn factor(&mut self, a: &CsMat<f64>) -> Result<()> {
        self.ldl = None;
        let ldl = Ldl::new()
            .fill_in_reduction(FillInReduction::ReverseCuthillMcKee)
            .check_symmetry(SymmetryCheck::DontCheckSymmetry)
            .numeric(a.view())?;
        if let Some((idx, ratio)) = pivot_ratio(ldl.d().iter().copied()) {
            if ratio <= PIVOT_TOL {
                return Err(EigenError::LinearSolve(format!(
                    "LDL pivot {idx} is numerically zero (relative magnitude {ratio:.3e})"
                )));
            }
        }
        self.ldl = Some(ldl);
        Ok(())
    }

    fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let ldl = self.ldl.as_ref().ok_or(EigenError::NotFactored)?;
        Ok(DVector::from_vec(ldl.solve(rhs.as_slice())))
    }

    fn is_factored(&self) -> bool {
        self.ldl.is_some()
    }

    fn clear(&mut self) {
        self.ldl = None;
    }
}
