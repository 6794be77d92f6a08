//! Generalized eigenvalue analysis for finite-element structures.
//!
//! Linearized buckling (K u = λ G u) and natural frequencies (K u = ω² M u)
//! are solved with shift-invert Lanczos and full re-orthogonalization.
//! Converged eigenpairs feed analytic design sensitivities, including the
//! adjoint term for a geometric stiffness that depends on an equilibrium
//! path.
//!
//! Models plug in through [`StructuralModel`] and [`PathDependentModel`];
//! matrix storage through [`OperatorMatrix`]; factorizations through
//! [`LinearSolver`]. Two reference models ship with the crate: a free-free
//! hexahedral bar ([`HexBarModel`]) and a pinned frame column
//! ([`ColumnModel`]).
//!
//! # Example
//!
//! ```
//! use fem_eigen::{
//!     BeamMaterial, BucklingAnalysis, ColumnModel, CrossSection, DenseLuSolver, EigenConfig,
//! };
//!
//! let material = BeamMaterial { e: 200e9, nu: 0.3, rho: 7800.0 };
//! let section = CrossSection::rectangular(0.01, 0.01);
//! let mut model = ColumnModel::new(1.0, 10, material, section, 1000.0).unwrap();
//! let euler = model.euler_load();
//!
//! let mut k = model.allocate_matrix();
//! let mut g = model.allocate_matrix();
//! let mut aux = model.allocate_matrix();
//! let mut solver = DenseLuSolver::new();
//! let config = EigenConfig::new(20, 2, 1e-8);
//!
//! let mut analysis =
//!     BucklingAnalysis::new(&mut model, 0, 1.0, &mut k, &mut g, &mut aux, &mut solver, config)
//!         .unwrap();
//! analysis.solve(None).unwrap();
//! let (load_factor, _error) = analysis.extract_eigenvalue(0).unwrap();
//! assert!((load_factor * 1000.0 - euler).abs() < 0.01 * euler);
//! ```

pub mod assembly;
pub mod bar;
pub mod beam;
pub mod buckling;
pub mod column;
pub mod config;
pub mod dense;
pub mod element;
pub mod error;
pub mod frequency;
pub mod lanczos;
pub mod linear_solver;
pub mod matrix;
pub mod mesh;
pub mod model;
pub mod progress;
pub mod sensitivity;
pub mod shift_invert;
pub mod types;

pub(crate) mod analysis;

pub use assembly::GlobalAssembly;
pub use bar::{BarGeometry, HexBarModel};
pub use beam::CrossSection;
pub use buckling::BucklingAnalysis;
pub use column::{BeamMaterial, ColumnModel};
pub use config::EigenConfig;
pub use dense::{dense_generalized_eigen, dense_natural_frequencies};
pub use element::SolidMaterial;
pub use error::{EigenError, Result};
pub use frequency::FrequencyAnalysis;
pub use lanczos::{shift_distance_order, RitzEstimate, Sep, SolveReport, SpectralOperator};
pub use linear_solver::{DenseLuSolver, LinearSolver};
pub use matrix::{weighted_dot, OperatorMatrix};
pub use model::{PathDependentModel, StructuralModel};
pub use progress::{LogSink, ProgressSink};
pub use sensitivity::{path_adjoint_sensitivity, rayleigh_quotient_sensitivity};
pub use shift_invert::ShiftInvertOperator;
pub use types::{AnalysisState, MatrixKind, SolveStatus};

#[cfg(feature = "sprs-backend")]
pub use linear_solver::SprsLdlSolver;
