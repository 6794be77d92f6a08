//! Symmetric eigensolver: Lanczos with full B-orthogonalization.
//!
//! The operator C = (K - σB)⁻¹B is self-adjoint in the B-inner product, so a
//! Lanczos recurrence in that inner product yields a real symmetric
//! tridiagonal T whose eigenvalues μ approximate those of C. Eigenvalues of
//! the pencil closest to σ become the largest |μ|, and map back through
//! λ = σ + 1/μ.
//!
//! Every new Lanczos vector is orthogonalized against the whole basis (two
//! passes of classical Gram-Schmidt). Local three-term orthogonalization alone
//! loses orthogonality quickly in a B-weighted inner product and produces
//! duplicate Ritz values.

use std::cmp::Ordering;

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::EigenConfig;
use crate::error::{EigenError, Result};
use crate::progress::ProgressSink;
use crate::types::{
    MatrixKind, SolveStatus, DEFAULT_LANCZOS_SEED, INVERSE_ITERATION_SHIFT,
    INVERSE_ITERATION_STEPS, LANCZOS_BREAKDOWN_TOL, MIN_RITZ_MAGNITUDE,
};

/// What the Lanczos iteration needs from a spectral transformation.
pub trait SpectralOperator {
    /// Problem dimension.
    fn size(&self) -> usize;

    /// Shift the transformation is built around.
    fn sigma(&self) -> f64;

    /// Matrix defining the inner product.
    fn inner_kind(&self) -> MatrixKind;

    /// y = C x.
    fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>>;

    /// y = B x.
    fn mult_b(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Normalized residual of (λ, u) for the original pencil.
    fn relative_residual(&self, lambda: f64, u: &DVector<f64>) -> f64;
}

/// Ordering of eigenvalues by distance from the shift; equidistant values
/// put the smaller eigenvalue first.
pub fn shift_distance_order(a: f64, b: f64, sigma: f64) -> Ordering {
    (a - sigma)
        .abs()
        .total_cmp(&(b - sigma).abs())
        .then_with(|| a.total_cmp(&b))
}

/// One retained Ritz pair, converged or not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RitzEstimate {
    pub eigenvalue: f64,
    pub error: f64,
}

/// Summary of one Lanczos solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub sigma: f64,
    pub num_converged: usize,
    pub requested: usize,
    /// Number of Lanczos vectors generated.
    pub subspace_size: usize,
    /// Applications of the shift-invert operator, including the start vector.
    pub operator_applications: usize,
    /// True if the Krylov space became invariant before the vector limit.
    pub invariant_subspace: bool,
    /// Retained pairs in extraction order, closest to σ first.
    pub ritz: Vec<RitzEstimate>,
}

impl SolveReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct RitzPair {
    eigenvalue: f64,
    vector: DVector<f64>,
    error: f64,
}

/// Lanczos solver state: configuration plus the eigenpairs of the last solve.
pub struct Sep {
    config: EigenConfig,
    pairs: Vec<RitzPair>,
    num_converged: usize,
    solved_sigma: Option<f64>,
}

impl Sep {
    pub fn new(config: EigenConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pairs: Vec::new(),
            num_converged: 0,
            solved_sigma: None,
        })
    }

    pub fn config(&self) -> &EigenConfig {
        &self.config
    }

    pub fn num_converged(&self) -> usize {
        self.num_converged
    }

    /// Shift used by the last completed solve.
    pub fn solved_sigma(&self) -> Option<f64> {
        self.solved_sigma
    }

    /// Discard all eigenpairs.
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.num_converged = 0;
        self.solved_sigma = None;
    }

    /// Run the Lanczos iteration against a factored operator.
    pub fn solve<O>(
        &mut self,
        op: &mut O,
        mut progress: Option<&mut dyn ProgressSink>,
    ) -> Result<SolveReport>
    where
        O: SpectralOperator + ?Sized,
    {
        self.reset();

        let n = op.size();
        let sigma = op.sigma();
        let max_vecs = self.config.max_lanczos_vecs.min(n);
        let nev = self.config.num_eigvals.min(max_vecs);
        let tol = self.config.eig_tol;
        if n == 0 {
            return Err(EigenError::DimensionMismatch {
                what: "operator size",
                expected: 1,
                found: 0,
            });
        }

        // Start vector passed once through the operator so that it carries no
        // component in the null space of B.
        let mut rng = StdRng::seed_from_u64(self.config.seed.unwrap_or(DEFAULT_LANCZOS_SEED));
        let seed = DVector::from_fn(n, |_, _| rng.gen::<f64>() - 0.5);
        let mut v = op.apply(&seed)?;
        let mut applications = 1;
        let mut bv = op.mult_b(&v);
        let vbv = v.dot(&bv);
        if !(vbv.is_finite() && vbv > 0.0) {
            return Err(EigenError::IndefiniteInnerProduct(op.inner_kind()));
        }
        let norm = vbv.sqrt();
        v /= norm;
        bv /= norm;

        let mut basis: Vec<DVector<f64>> = Vec::with_capacity(max_vecs);
        // Cached B*v products, so reorthogonalization needs no extra mat-vecs
        let mut b_basis: Vec<DVector<f64>> = Vec::with_capacity(max_vecs);
        let mut alpha: Vec<f64> = Vec::with_capacity(max_vecs);
        let mut beta: Vec<f64> = Vec::with_capacity(max_vecs);
        let mut alpha_scale = 0.0_f64;
        let mut invariant = false;
        let mut accepted: Option<Vec<RitzPair>> = None;

        for j in 0..max_vecs {
            basis.push(v.clone());
            b_basis.push(bv.clone());

            let mut w = op.apply(&v)?;
            applications += 1;

            let alpha_j = w.dot(&bv);
            alpha.push(alpha_j);
            alpha_scale = alpha_scale.max(alpha_j.abs());

            w.axpy(-alpha_j, &v, 1.0);
            if j > 0 {
                w.axpy(-beta[j - 1], &basis[j - 1], 1.0);
            }
            for _ in 0..2 {
                for (vk, bvk) in basis.iter().zip(b_basis.iter()) {
                    let coeff = w.dot(bvk);
                    w.axpy(-coeff, vk, 1.0);
                }
            }

            let bw = op.mult_b(&w);
            let wbw = w.dot(&bw);
            let floor = LANCZOS_BREAKDOWN_TOL * alpha_scale.max(f64::MIN_POSITIVE);
            if wbw < -(floor * floor) {
                return Err(EigenError::IndefiniteInnerProduct(op.inner_kind()));
            }
            let beta_j = wbw.max(0.0).sqrt();

            if beta_j <= floor {
                invariant = true;
                log::debug!("Lanczos step {}: invariant subspace (beta = {beta_j:.3e})", j + 1);
                if let Some(sink) = progress.as_deref_mut() {
                    sink.print(&format!(
                        "Lanczos {:4}: invariant subspace, beta = {:10.4e}",
                        j + 1,
                        beta_j
                    ));
                }
                break;
            }

            v = w / beta_j;
            bv = bw / beta_j;
            beta.push(beta_j);

            if j + 1 < nev {
                continue;
            }

            let estimate = ritz_estimate(&alpha, &beta[..j], beta_j, sigma, nev);
            log::debug!(
                "Lanczos step {}: alpha = {alpha_j:.6e}, beta = {beta_j:.6e}, estimate = {estimate:.3e}",
                j + 1
            );
            if let Some(sink) = progress.as_deref_mut() {
                sink.print(&format!(
                    "Lanczos {:4}: beta = {:10.4e}  residual estimate = {:10.4e}",
                    j + 1,
                    beta_j,
                    estimate
                ));
            }

            if estimate <= tol {
                let pairs = extract_ritz_pairs(
                    &*op,
                    &alpha,
                    &beta[..j],
                    &basis,
                    Some((&v, beta_j)),
                    nev,
                )?;
                if leading_converged(&pairs, tol) >= nev {
                    accepted = Some(pairs);
                    break;
                }
            }
        }

        let subspace_size = alpha.len();
        let pairs = match accepted {
            Some(pairs) => pairs,
            None => {
                let off = &beta[..subspace_size - 1];
                let next = if invariant {
                    None
                } else {
                    beta.get(subspace_size - 1).map(|&b| (&v, b))
                };
                extract_ritz_pairs(&*op, &alpha, off, &basis, next, nev)?
            }
        };

        self.num_converged = leading_converged(&pairs, tol);
        self.pairs = pairs;
        self.solved_sigma = Some(sigma);

        let status = if self.num_converged >= nev && nev == self.config.num_eigvals {
            SolveStatus::Converged
        } else {
            SolveStatus::NotConverged {
                found: self.num_converged,
                requested: self.config.num_eigvals,
            }
        };

        let report = SolveReport {
            status,
            sigma,
            num_converged: self.num_converged,
            requested: self.config.num_eigvals,
            subspace_size,
            operator_applications: applications,
            invariant_subspace: invariant,
            ritz: self
                .pairs
                .iter()
                .map(|p| RitzEstimate {
                    eigenvalue: p.eigenvalue,
                    error: p.error,
                })
                .collect(),
        };

        match status {
            SolveStatus::Converged => log::info!(
                "Lanczos converged {} eigenpair(s) near sigma = {sigma} with {subspace_size} vector(s)",
                self.num_converged
            ),
            SolveStatus::NotConverged { found, requested } => log::warn!(
                "Lanczos converged {found} of {requested} eigenpair(s) near sigma = {sigma} \
                 after {subspace_size} vector(s)"
            ),
        }
        if let Some(sink) = progress.as_deref_mut() {
            for (i, p) in report.ritz.iter().enumerate() {
                sink.print(&format!(
                    "Eigenvalue {:3}: {:18.10e}  error = {:10.4e}",
                    i, p.eigenvalue, p.error
                ));
            }
        }

        Ok(report)
    }

    fn converged_pair(&self, n: usize) -> Result<&RitzPair> {
        if self.solved_sigma.is_none() {
            return Err(EigenError::NotSolved);
        }
        if n >= self.num_converged {
            return Err(EigenError::OutOfRange {
                index: n,
                converged: self.num_converged,
            });
        }
        Ok(&self.pairs[n])
    }

    /// Number of retained Ritz pairs, converged or not.
    pub fn num_retained(&self) -> usize {
        self.pairs.len()
    }

    /// Converged pair for derivative evaluation. A retained pair that missed
    /// the tolerance is reported as `NotConverged` rather than out of range.
    pub fn converged_eigenpair(&self, n: usize) -> Result<(f64, &DVector<f64>)> {
        if self.solved_sigma.is_some() && n >= self.num_converged {
            if let Some(pair) = self.pairs.get(n) {
                return Err(EigenError::NotConverged {
                    index: n,
                    error: pair.error,
                    tol: self.config.eig_tol,
                });
            }
        }
        let pair = self.converged_pair(n)?;
        Ok((pair.eigenvalue, &pair.vector))
    }

    /// (λₙ, error) for a converged pair.
    pub fn extract_eigenvalue(&self, n: usize) -> Result<(f64, f64)> {
        let pair = self.converged_pair(n)?;
        Ok((pair.eigenvalue, pair.error))
    }

    /// (uₙ, error) for a converged pair. uₙ is B-normalized.
    pub fn extract_eigenvector(&self, n: usize) -> Result<(&DVector<f64>, f64)> {
        let pair = self.converged_pair(n)?;
        Ok((&pair.vector, pair.error))
    }

    /// Matrix of B-inner products uᵢᵀBuⱼ over all retained vectors.
    pub fn orthogonality_matrix<O>(&self, op: &O) -> DMatrix<f64>
    where
        O: SpectralOperator + ?Sized,
    {
        let m = self.pairs.len();
        let b_vecs: Vec<DVector<f64>> = self.pairs.iter().map(|p| op.mult_b(&p.vector)).collect();
        DMatrix::from_fn(m, m, |i, j| self.pairs[i].vector.dot(&b_vecs[j]))
    }

    /// Largest |uᵢᵀBuⱼ|, i ≠ j, over the retained vectors.
    pub fn check_orthogonality<O>(&self, op: &O) -> f64
    where
        O: SpectralOperator + ?Sized,
    {
        let gram = self.orthogonality_matrix(op);
        let mut max_off = 0.0_f64;
        for i in 0..gram.nrows() {
            for j in 0..gram.ncols() {
                if i != j {
                    max_off = max_off.max(gram[(i, j)].abs());
                }
            }
        }
        max_off
    }
}

fn tridiagonal(alpha: &[f64], off: &[f64]) -> DMatrix<f64> {
    let m = alpha.len();
    let mut t = DMatrix::zeros(m, m);
    for i in 0..m {
        t[(i, i)] = alpha[i];
        if i + 1 < m {
            t[(i, i + 1)] = off[i];
            t[(i + 1, i)] = off[i];
        }
    }
    t
}

/// Indices of the Ritz values whose λ lie closest to σ, in extraction order.
fn select_nearest(theta: &DVector<f64>, sigma: f64, nev: usize) -> Vec<usize> {
    let theta_max = theta.amax();
    let mut idx: Vec<usize> = (0..theta.len())
        .filter(|&i| theta[i].abs() > MIN_RITZ_MAGNITUDE * theta_max.max(f64::MIN_POSITIVE))
        .collect();
    idx.sort_by(|&a, &b| shift_distance_order(sigma + 1.0 / theta[a], sigma + 1.0 / theta[b], sigma));
    idx.truncate(nev);
    idx
}

/// Ritz values of T and eigenvectors of the ones nearest σ.
struct TridiagonalRitz {
    theta: DVector<f64>,
    chosen: Vec<usize>,
    vectors: Vec<DVector<f64>>,
}

/// Eigen-decomposition of the Lanczos tridiagonal.
///
/// `SymmetricEigen` gives accurate values but its vectors can mix across
/// well separated eigenvalues. Each chosen vector is refined by inverse
/// iteration on T - θI and orthogonalized against the ones refined before it.
fn tridiagonal_ritz(alpha: &[f64], off: &[f64], sigma: f64, nev: usize) -> TridiagonalRitz {
    let t = tridiagonal(alpha, off);
    let eig = SymmetricEigen::new(t.clone());
    let chosen = select_nearest(&eig.eigenvalues, sigma, nev);

    let scale = t.amax().max(f64::MIN_POSITIVE);
    let mut vectors: Vec<DVector<f64>> = Vec::with_capacity(chosen.len());
    for &i in &chosen {
        let start = eig.eigenvectors.column(i).into_owned();
        let s = refine_tridiagonal_vector(&t, eig.eigenvalues[i], start, scale, &vectors);
        vectors.push(s);
    }
    TridiagonalRitz {
        theta: eig.eigenvalues,
        chosen,
        vectors,
    }
}

fn refine_tridiagonal_vector(
    t: &DMatrix<f64>,
    theta: f64,
    start: DVector<f64>,
    scale: f64,
    previous: &[DVector<f64>],
) -> DVector<f64> {
    let mut shifted = t.clone();
    let target = theta + INVERSE_ITERATION_SHIFT * scale;
    for k in 0..shifted.nrows() {
        shifted[(k, k)] -= target;
    }
    let lu = shifted.lu();

    let mut s = start;
    for _ in 0..INVERSE_ITERATION_STEPS {
        let Some(y) = lu.solve(&s) else { break };
        let norm = y.norm();
        if !norm.is_finite() || norm == 0.0 {
            break;
        }
        s = y / norm;
    }

    for p in previous {
        let c = p.dot(&s);
        s.axpy(-c, p, 1.0);
    }
    let norm = s.norm();
    if norm > 0.0 {
        s /= norm;
    }
    s
}

/// Largest of β·|sₘᵢ|/|μᵢ| over the pairs that would be extracted.
fn ritz_estimate(alpha: &[f64], off: &[f64], beta_last: f64, sigma: f64, nev: usize) -> f64 {
    let ritz = tridiagonal_ritz(alpha, off, sigma, nev);
    let m = alpha.len();
    if ritz.chosen.len() < nev {
        return f64::INFINITY;
    }
    ritz.chosen
        .iter()
        .zip(&ritz.vectors)
        .map(|(&i, s)| beta_last * s[m - 1].abs() / ritz.theta[i].abs())
        .fold(0.0, f64::max)
}

/// Ritz pairs nearest σ with true residual errors.
///
/// With `next = Some((v, β))` each vector is corrected by the next Lanczos
/// vector, u = V s + (β sₘ / μ) v, which equals C(V s)/μ without another solve.
fn extract_ritz_pairs<O>(
    op: &O,
    alpha: &[f64],
    off: &[f64],
    basis: &[DVector<f64>],
    next: Option<(&DVector<f64>, f64)>,
    nev: usize,
) -> Result<Vec<RitzPair>>
where
    O: SpectralOperator + ?Sized,
{
    let sigma = op.sigma();
    let m = alpha.len();
    let ritz = tridiagonal_ritz(alpha, off, sigma, nev);

    let mut pairs = Vec::with_capacity(ritz.chosen.len());
    for (&i, s) in ritz.chosen.iter().zip(&ritz.vectors) {
        let theta = ritz.theta[i];
        let mut u = DVector::zeros(op.size());
        for (k, vk) in basis.iter().enumerate().take(m) {
            u.axpy(s[k], vk, 1.0);
        }
        if let Some((v_next, beta_last)) = next {
            u.axpy(beta_last * s[m - 1] / theta, v_next, 1.0);
        }

        let ubu = u.dot(&op.mult_b(&u));
        if !(ubu.is_finite() && ubu > 0.0) {
            return Err(EigenError::IndefiniteInnerProduct(op.inner_kind()));
        }
        u /= ubu.sqrt();

        let eigenvalue = sigma + 1.0 / theta;
        let error = op.relative_residual(eigenvalue, &u);
        pairs.push(RitzPair {
            eigenvalue,
            vector: u,
            error,
        });
    }
    Ok(pairs)
}

fn leading_converged(pairs: &[RitzPair], tol: f64) -> usize {
    pairs.iter().take_while(|p| p.error <= tol).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shift-invert of a diagonal pencil, solved exactly.
    struct DiagonalPencil {
        k: Vec<f64>,
        b: Vec<f64>,
        sigma: f64,
    }

    impl SpectralOperator for DiagonalPencil {
        fn size(&self) -> usize {
            self.k.len()
        }

        fn sigma(&self) -> f64 {
            self.sigma
        }

        fn inner_kind(&self) -> MatrixKind {
            MatrixKind::Mass
        }

        fn apply(&mut self, x: &DVector<f64>) -> Result<DVector<f64>> {
            Ok(DVector::from_fn(x.len(), |i, _| {
                self.b[i] * x[i] / (self.k[i] - self.sigma * self.b[i])
            }))
        }

        fn mult_b(&self, x: &DVector<f64>) -> DVector<f64> {
            DVector::from_fn(x.len(), |i, _| self.b[i] * x[i])
        }

        fn relative_residual(&self, lambda: f64, u: &DVector<f64>) -> f64 {
            let ku = DVector::from_fn(u.len(), |i, _| self.k[i] * u[i]);
            let r = DVector::from_fn(u.len(), |i, _| (self.k[i] - lambda * self.b[i]) * u[i]);
            r.norm() / ku.norm()
        }
    }

    #[test]
    fn distance_order_breaks_ties_toward_smaller_value() {
        assert_eq!(shift_distance_order(1.0, 3.0, 2.0), Ordering::Less);
        assert_eq!(shift_distance_order(3.0, 1.0, 2.0), Ordering::Greater);
        assert_eq!(shift_distance_order(2.1, 1.0, 2.0), Ordering::Less);
    }

    #[test]
    fn finds_eigenvalues_nearest_shift() {
        let mut op = DiagonalPencil {
            k: (1..=12).map(|i| i as f64).collect(),
            b: vec![1.0; 12],
            sigma: 6.2,
        };
        let mut sep = Sep::new(EigenConfig::new(12, 3, 1e-10)).unwrap();
        let report = sep.solve(&mut op, None).unwrap();
        assert!(report.status.is_converged());

        let expected = [6.0, 7.0, 5.0];
        for (n, want) in expected.iter().enumerate() {
            let (lambda, err) = sep.extract_eigenvalue(n).unwrap();
            assert!((lambda - want).abs() < 1e-9, "pair {n}: {lambda} != {want}");
            assert!(err <= 1e-10);
        }
        assert!(sep.check_orthogonality(&op) < 1e-9);
    }

    #[test]
    fn weighted_inner_product_normalizes_vectors() {
        let mut op = DiagonalPencil {
            k: vec![2.0, 6.0, 12.0, 20.0],
            b: vec![1.0, 2.0, 3.0, 4.0],
            sigma: 2.6,
        };
        let mut sep = Sep::new(EigenConfig::new(4, 2, 1e-10)).unwrap();
        sep.solve(&mut op, None).unwrap();
        for n in 0..sep.num_converged() {
            let (u, _) = sep.extract_eigenvector(n).unwrap();
            let ubu = u.dot(&op.mult_b(u));
            assert!((ubu - 1.0).abs() < 1e-10);
        }
        let (lambda, _) = sep.extract_eigenvalue(0).unwrap();
        assert!((lambda - 3.0).abs() < 1e-9);
    }

    #[test]
    fn extraction_before_solve_fails() {
        let sep = Sep::new(EigenConfig::default()).unwrap();
        assert!(matches!(sep.extract_eigenvalue(0), Err(EigenError::NotSolved)));
    }

    #[test]
    fn small_subspace_reports_partial_result() {
        let mut op = DiagonalPencil {
            k: (1..=30).map(|i| i as f64).collect(),
            b: vec![1.0; 30],
            sigma: 15.5,
        };
        let mut sep = Sep::new(EigenConfig::new(4, 4, 1e-12)).unwrap();
        let report = sep.solve(&mut op, None).unwrap();
        assert!(!report.status.is_converged());
        assert_eq!(report.ritz.len(), 4);
        assert_eq!(report.subspace_size, 4);
        assert!(matches!(
            sep.extract_eigenvalue(report.num_converged),
            Err(EigenError::OutOfRange { .. })
        ));
    }

    #[test]
    fn progress_sink_receives_lines() {
        let mut op = DiagonalPencil {
            k: (1..=8).map(|i| i as f64).collect(),
            b: vec![1.0; 8],
            sigma: 0.5,
        };
        let mut lines: Vec<String> = Vec::new();
        let mut sep = Sep::new(EigenConfig::new(8, 2, 1e-10)).unwrap();
        sep.solve(&mut op, Some(&mut lines)).unwrap();
        assert!(lines.iter().any(|l| l.starts_with("Lanczos")));
        assert!(lines.iter().any(|l| l.starts_with("Eigenvalue")));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut op = DiagonalPencil {
            k: vec![1.0, 2.0, 3.0],
            b: vec![1.0; 3],
            sigma: 1.9,
        };
        let mut sep = Sep::new(EigenConfig::new(3, 2, 1e-10)).unwrap();
        let report = sep.solve(&mut op, None).unwrap();
        let json = report.to_json().unwrap();
        let back: SolveReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ritz.len(), report.ritz.len());
        assert_eq!(back.status, report.status);
    }

    #[test]
    fn tridiagonal_ritz_vectors_satisfy_their_eigen_equation() {
        let alpha: Vec<f64> = (0..12)
            .map(|i| -5.0 + 1.25 * i as f64 + 0.3 * (i as f64).sin())
            .collect();
        let off: Vec<f64> = (0..11).map(|i| 0.8 + 0.05 * i as f64).collect();
        let t = tridiagonal(&alpha, &off);
        let scale = t.amax();

        let ritz = tridiagonal_ritz(&alpha, &off, 0.0, 12);
        assert!(!ritz.chosen.is_empty());
        for (&i, s) in ritz.chosen.iter().zip(&ritz.vectors) {
            let r = &t * s - s * ritz.theta[i];
            assert!(r.norm() <= 1e-12 * scale, "residual {:e} for θ = {}", r.norm(), ritz.theta[i]);
            assert!((s.norm() - 1.0).abs() < 1e-12);
        }
        for a in 0..ritz.vectors.len() {
            for b in 0..a {
                assert!(ritz.vectors[a].dot(&ritz.vectors[b]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn full_krylov_space_converges_every_requested_pair() {
        let mut op = DiagonalPencil {
            k: (1..=12).map(|i| i as f64).collect(),
            b: vec![1.0; 12],
            sigma: 6.2,
        };
        let mut sep = Sep::new(EigenConfig::new(12, 3, 1e-10)).unwrap();
        let report = sep.solve(&mut op, None).unwrap();
        assert_eq!(report.num_converged, 3);
        for estimate in report.ritz.iter().take(3) {
            assert!(estimate.error <= 1e-10, "error {:e}", estimate.error);
        }
    }
}
