//! Type aliases, constants, and core enums for the eigen-analysis library.

use std::fmt;

use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

// Type aliases for the hexahedral element blocks
pub type NodeCoords = SMatrix<f64, 8, 3>;
pub type Matrix6 = SMatrix<f64, 6, 6>;
pub type Matrix6x24 = SMatrix<f64, 6, 24>;
pub type Matrix3x24 = SMatrix<f64, 3, 24>;
pub type Matrix3x8 = SMatrix<f64, 3, 8>;
pub type Matrix24x24 = SMatrix<f64, 24, 24>;

// Core constants
pub const DOF_PER_NODE: usize = 3;

// f64 representation of 1/sqrt(3) Gauss point coordinate for 2×2×2 quadrature
pub const GAUSS_G: f64 = 0.577_350_269_189_625_8;
pub const MIN_DET_J: f64 = 1e-12;

/// Default size of the Krylov subspace.
pub const DEFAULT_MAX_LANCZOS_VECS: usize = 40;

/// Default number of requested eigenpairs.
pub const DEFAULT_NUM_EIGVALS: usize = 5;

/// Default relative residual tolerance.
pub const DEFAULT_EIG_TOL: f64 = 1e-8;

/// Seed used for the Lanczos start vector when none is configured.
pub const DEFAULT_LANCZOS_SEED: u64 = 0x5eed_1a2c;

/// Relative size of β (against the largest |α| seen) below which the
/// Krylov space is treated as invariant.
pub const LANCZOS_BREAKDOWN_TOL: f64 = 1e-12;

/// Ritz values of the transformed operator smaller than this map to
/// eigenvalues at infinity and are discarded.
pub const MIN_RITZ_MAGNITUDE: f64 = 1e-14;

/// Offset of the inverse-iteration shift from a Ritz value, relative to the
/// largest entry of the tridiagonal.
pub const INVERSE_ITERATION_SHIFT: f64 = 4.0 * f64::EPSILON;

/// Inverse-iteration sweeps applied to each Ritz vector of the tridiagonal.
pub const INVERSE_ITERATION_STEPS: usize = 2;

/// Relative pivot magnitude below which a dense LU factorization is reported
/// as singular.
pub const PIVOT_TOL: f64 = 1e-13;

/// Eigenvalues (ω², rad²/s²) below this are treated as rigid-body modes.
pub const RIGID_BODY_LAMBDA_THRESHOLD: f64 = 100.0;

/// Which operator matrix of the pencil a quantity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatrixKind {
    Stiffness,
    Mass,
    GeometricStiffness,
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixKind::Stiffness => write!(f, "stiffness"),
            MatrixKind::Mass => write!(f, "mass"),
            MatrixKind::GeometricStiffness => write!(f, "geometric stiffness"),
        }
    }
}

/// Lifecycle of an analysis object.
///
/// Frequency analysis skips `PathSolved`. A solve that converges only part
/// of the requested pairs leaves the analysis `Factored`; `Failed` follows an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisState {
    Constructed,
    PathSolved,
    Factored,
    Converged,
    Failed,
}

/// Outcome flag of a Lanczos solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Every requested eigenpair met the tolerance.
    Converged,
    /// Only the leading `found` of `requested` pairs met the tolerance.
    NotConverged { found: usize, requested: usize },
}

impl SolveStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveStatus::Converged)
    }
}
