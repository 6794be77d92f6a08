use approx::assert_relative_eq;
use nalgebra::DVector;

use fem_eigen::{
    AnalysisState, BeamMaterial, BucklingAnalysis, ColumnModel, CrossSection, DenseLuSolver,
    EigenConfig, EigenError, FrequencyAnalysis, StructuralModel,
};

const LENGTH: f64 = 1.0;
const NUM_ELEMENTS: usize = 10;
const END_LOAD: f64 = 1000.0;

fn steel() -> BeamMaterial {
    BeamMaterial {
        e: 200e9,
        nu: 0.3,
        rho: 7850.0,
    }
}

fn steel_column() -> ColumnModel {
    ColumnModel::new(
        LENGTH,
        NUM_ELEMENTS,
        steel(),
        CrossSection::rectangular(0.01, 0.01),
        END_LOAD,
    )
    .unwrap()
}

fn config() -> EigenConfig {
    EigenConfig::new(30, 2, 1e-10)
}

#[test]
fn first_load_factor_matches_euler_load() {
    let mut model = steel_column();
    let euler = model.euler_load();
    let mut k = model.allocate_matrix();
    let mut g = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    let mut analysis =
        BucklingAnalysis::new(&mut model, 0, 1.0, &mut k, &mut g, &mut aux, &mut solver, config())
            .unwrap();
    assert_eq!(analysis.state(), AnalysisState::Constructed);
    assert!(analysis.path().is_none());

    let report = analysis.solve(None).unwrap();
    assert!(report.status.is_converged());
    assert_eq!(analysis.state(), AnalysisState::Converged);

    let (first, error) = analysis.extract_eigenvalue(0).unwrap();
    assert!(error <= 1e-10);
    assert_relative_eq!(first * END_LOAD, euler, max_relative = 0.01);

    // Second pinned mode carries four times the load.
    let (second, _) = analysis.extract_eigenvalue(1).unwrap();
    assert_relative_eq!(second / first, 4.0, max_relative = 0.02);

    assert!(analysis.check_eigenvector(0).unwrap() <= 1e-10);
    assert!(analysis.check_orthogonality().unwrap() < 1e-8);
    let gram = analysis.print_orthogonality().unwrap();
    assert_relative_eq!(gram[(0, 0)], 1.0, epsilon = 1e-10);
}

#[test]
fn shift_change_reuses_the_equilibrium_path() {
    let mut model = steel_column();
    let mut k = model.allocate_matrix();
    let mut g = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    let mut analysis =
        BucklingAnalysis::new(&mut model, 0, 1.0, &mut k, &mut g, &mut aux, &mut solver, config())
            .unwrap();
    analysis.solve(None).unwrap();
    let (at_one, _) = analysis.extract_eigenvalue(0).unwrap();
    let path = analysis.path().cloned().unwrap();

    analysis.set_sigma(2.0);
    assert_eq!(analysis.state(), AnalysisState::PathSolved);
    assert!(matches!(
        analysis.extract_eigenvalue(0),
        Err(EigenError::Stale { .. })
    ));

    analysis.solve(None).unwrap();
    let (at_two, _) = analysis.extract_eigenvalue(0).unwrap();
    assert_relative_eq!(at_one, at_two, max_relative = 1e-9);
    assert_eq!(analysis.path().unwrap(), &path);

    let x = vec![1.0; NUM_ELEMENTS];
    analysis.set_design_vars(&x).unwrap();
    assert_eq!(analysis.state(), AnalysisState::Constructed);
    assert!(analysis.path().is_none());
    assert!(matches!(
        analysis.extract_eigenvalue(0),
        Err(EigenError::NotSolved)
    ));
}

#[test]
fn undefined_load_case_fails_the_solve() {
    let mut model = steel_column();
    let mut k = model.allocate_matrix();
    let mut g = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    let mut analysis =
        BucklingAnalysis::new(&mut model, 4, 1.0, &mut k, &mut g, &mut aux, &mut solver, config())
            .unwrap();
    assert!(matches!(analysis.solve(None), Err(EigenError::Model(_))));
    assert_eq!(analysis.state(), AnalysisState::Failed);
}

#[test]
fn partial_result_keeps_the_analysis_usable() {
    let mut model = steel_column();
    let mut k = model.allocate_matrix();
    let mut g = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    // Three vectors cannot resolve three pairs to this tolerance.
    let config = EigenConfig::new(3, 3, 1e-300);
    let mut analysis =
        BucklingAnalysis::new(&mut model, 0, 1.0, &mut k, &mut g, &mut aux, &mut solver, config)
            .unwrap();

    let report = analysis.solve(None).unwrap();
    assert!(!report.status.is_converged());
    assert_eq!(analysis.state(), AnalysisState::Factored);
    assert_eq!(analysis.num_converged(), report.num_converged);
    for i in 0..report.num_converged {
        assert!(analysis.extract_eigenvalue(i).is_ok());
    }
    assert!(matches!(
        analysis.extract_eigenvalue(report.num_converged),
        Err(EigenError::OutOfRange { .. })
    ));
}

#[test]
fn buckling_sensitivities_match_finite_differences() {
    let mut model = steel_column();
    let x0 = model.design_vars();
    let mut k = model.allocate_matrix();
    let mut g = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    let mut analysis =
        BucklingAnalysis::new(&mut model, 0, 1.0, &mut k, &mut g, &mut aux, &mut solver, config())
            .unwrap();

    analysis.solve(None).unwrap();
    let (lambda, _) = analysis.extract_eigenvalue(0).unwrap();
    let mut sens = vec![0.0; NUM_ELEMENTS];
    analysis.eval_eigen_dv_sens(0, &mut sens).unwrap();

    // The column is statically determinate, so the axial force and G do not
    // depend on the section: λ is homogeneous of degree one in the scales.
    let total: f64 = sens.iter().sum();
    assert_relative_eq!(total, lambda, max_relative = 1e-7);
    // Mid-span elements carry the most bending energy.
    assert!(sens[NUM_ELEMENTS / 2] > sens[0]);

    let delta = 1e-4;
    for dv in [0, 4, 7] {
        let mut x = x0.clone();
        x[dv] = x0[dv] + delta;
        analysis.set_design_vars(&x).unwrap();
        analysis.solve(None).unwrap();
        let (plus, _) = analysis.extract_eigenvalue(0).unwrap();

        x[dv] = x0[dv] - delta;
        analysis.set_design_vars(&x).unwrap();
        analysis.solve(None).unwrap();
        let (minus, _) = analysis.extract_eigenvalue(0).unwrap();

        let fd = (plus - minus) / (2.0 * delta);
        assert_relative_eq!(sens[dv], fd, max_relative = 1e-5);
    }
}

#[test]
fn column_frequency_matches_pinned_beam_theory() {
    let mut model = steel_column();
    let section = CrossSection::rectangular(0.01, 0.01);
    let material = steel();
    let omega = std::f64::consts::PI.powi(2) / (LENGTH * LENGTH)
        * (material.e * section.i_bend / (material.rho * section.area)).sqrt();
    let expected = omega * omega;

    let n = model.num_dofs();
    let mut k = model.allocate_matrix();
    let mut m = model.allocate_matrix();
    let mut aux = model.allocate_matrix();
    let mut solver = DenseLuSolver::new();
    let mut analysis = FrequencyAnalysis::new(
        &mut model,
        0.5 * expected,
        &mut k,
        &mut m,
        &mut aux,
        &mut solver,
        EigenConfig::new(n, 1, 1e-10),
    )
    .unwrap();
    analysis.solve(None).unwrap();

    let (lambda, _) = analysis.extract_eigenvalue(0).unwrap();
    assert_relative_eq!(lambda, expected, max_relative = 0.01);

    let mut mode = DVector::zeros(n);
    analysis.extract_eigenvector(0, &mut mode).unwrap();
    // Pinned ends stay put.
    let scale = mode.amax();
    assert!(mode[1].abs() <= 1e-12 * scale);
    assert!(mode[NUM_ELEMENTS * 3 + 1].abs() <= 1e-12 * scale);
}
