//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

use crate::types::MatrixKind;

/// Unified error type for the eigen-analysis pipeline.
///
/// Non-convergence of a solve is not represented here: it is reported through
/// [`SolveStatus`](crate::types::SolveStatus) on an `Ok` report.
#[derive(Debug, Error)]
pub enum EigenError {
    /// Matrices or vectors that must share a dimension do not.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// Two matrices combined by copy/axpy do not share a sparsity pattern.
    #[error("sparsity pattern of the {0} matrix does not match its target")]
    SparsityMismatch(&'static str),

    /// The shifted matrix K - sigma*B could not be factored.
    #[error("factorization of K - sigma*B ({matrix}) failed at sigma = {sigma}: {reason}")]
    Factorization {
        matrix: MatrixKind,
        sigma: f64,
        reason: String,
    },

    /// A triangular solve with an existing factorization failed.
    #[error("linear solve failed: {0}")]
    LinearSolve(String),

    /// The shift-invert operator was applied before being factored.
    #[error("operator applied before the shifted matrix was factored")]
    NotFactored,

    /// Extraction or sensitivity requested before any solve completed.
    #[error("no eigenpairs available: solve has not completed")]
    NotSolved,

    /// Eigenpair index beyond the converged count.
    #[error("eigenpair index {index} out of range: {converged} pair(s) converged")]
    OutOfRange { index: usize, converged: usize },

    /// Sensitivities requested for a retained pair that missed the tolerance.
    #[error("eigenpair {index} is not converged: error {error:.3e} exceeds tolerance {tol:.3e}")]
    NotConverged { index: usize, error: f64, tol: f64 },

    /// The shift changed since the eigenpairs were computed.
    #[error("eigenpairs are stale: sigma changed from {solved_at} to {current} without a new solve")]
    Stale { solved_at: f64, current: f64 },

    /// A B-weighted norm came out non-positive.
    #[error("inner product weighted by the {0} matrix is not positive")]
    IndefiniteInnerProduct(MatrixKind),

    /// Output buffer for design-variable sensitivities has the wrong length.
    #[error("design variable buffer has length {found}, model has {expected} design variables")]
    DesignVarLength { expected: usize, found: usize },

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by the external model / assembler.
    #[error("model error: {0}")]
    Model(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sprs-backend")]
    #[error("sparse linear algebra error: {0}")]
    Linalg(#[from] sprs::errors::LinalgError),
}

pub type Result<T> = std::result::Result<T, EigenError>;
