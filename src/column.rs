//! Pinned-pinned column under an axial end load, built from frame elements.
//!
//! The column runs along x from node 0 to node `num_elements`. Node 0 is
//! pinned (u = w = 0), the top node is on a roller (w = 0) and carries the
//! reference compressive load P of the selected load case. The design
//! variables scale each element's section (area and second moment together).

use nalgebra::{DMatrix, DVector};

use crate::beam::{
    axial_force, compute_element_geometric_stiffness, compute_element_mass,
    compute_element_stiffness, geometric_stiffness_pattern, shear_modulus, CrossSection, Matrix6,
    DOF_PER_ELEMENT_1D, DOF_PER_NODE_1D,
};
use crate::error::{EigenError, Result};
use crate::model::{PathDependentModel, StructuralModel};
use crate::types::{MatrixKind, PIVOT_TOL};

/// Material constants of the column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamMaterial {
    pub e: f64,
    pub nu: f64,
    pub rho: f64,
}

#[derive(Debug, Clone)]
pub struct ColumnModel {
    length: f64,
    num_elements: usize,
    material: BeamMaterial,
    section: CrossSection,
    scale: Vec<f64>,
    load_cases: Vec<f64>,
    constrained: Vec<usize>,
}

impl ColumnModel {
    /// Uniform column with every section scale set to 1 and a single load
    /// case of compressive magnitude `end_load`.
    pub fn new(
        length: f64,
        num_elements: usize,
        material: BeamMaterial,
        section: CrossSection,
        end_load: f64,
    ) -> Result<Self> {
        if num_elements == 0 {
            return Err(EigenError::Model("column needs at least one element".into()));
        }
        if !(length > 0.0 && material.e > 0.0 && section.area > 0.0 && section.i_bend > 0.0) {
            return Err(EigenError::Model(
                "column length, modulus and section must be positive".into(),
            ));
        }
        let top = num_elements * DOF_PER_NODE_1D;
        Ok(Self {
            length,
            num_elements,
            material,
            section,
            scale: vec![1.0; num_elements],
            load_cases: vec![end_load],
            constrained: vec![0, 1, top + 1],
        })
    }

    /// Register another compressive end load; returns its load case index.
    pub fn add_load_case(&mut self, end_load: f64) -> usize {
        self.load_cases.push(end_load);
        self.load_cases.len() - 1
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn element_length(&self) -> f64 {
        self.length / self.num_elements as f64
    }

    /// π² E I / L² for the unscaled section, ignoring shear deformation.
    pub fn euler_load(&self) -> f64 {
        std::f64::consts::PI.powi(2) * self.material.e * self.section.i_bend
            / (self.length * self.length)
    }

    /// Zero-filled dense matrix of the model's dimension.
    pub fn allocate_matrix(&self) -> DMatrix<f64> {
        let n = self.num_dofs();
        DMatrix::zeros(n, n)
    }

    fn end_load(&self, load_case: usize) -> Result<f64> {
        self.load_cases.get(load_case).copied().ok_or_else(|| {
            EigenError::Model(format!(
                "load case {load_case} not defined ({} available)",
                self.load_cases.len()
            ))
        })
    }

    fn element_dofs(e: usize) -> std::ops::Range<usize> {
        let start = e * DOF_PER_NODE_1D;
        start..start + DOF_PER_ELEMENT_1D
    }

    /// Element slice of `v` with constrained entries zeroed.
    fn gather(&self, e: usize, v: &DVector<f64>) -> [f64; DOF_PER_ELEMENT_1D] {
        let mut out = [0.0; DOF_PER_ELEMENT_1D];
        for (local, global) in Self::element_dofs(e).enumerate() {
            if !self.constrained.contains(&global) {
                out[local] = v[global];
            }
        }
        out
    }

    fn quadratic_form(
        m: &Matrix6,
        psi: &[f64; DOF_PER_ELEMENT_1D],
        phi: &[f64; DOF_PER_ELEMENT_1D],
    ) -> f64 {
        let mut sum = 0.0;
        for i in 0..DOF_PER_ELEMENT_1D {
            for j in 0..DOF_PER_ELEMENT_1D {
                sum += psi[i] * m[(i, j)] * phi[j];
            }
        }
        sum
    }

    fn section(&self, e: usize) -> CrossSection {
        self.section.scaled(self.scale[e])
    }

    fn shear_modulus(&self) -> f64 {
        shear_modulus(self.material.e, self.material.nu)
    }

    fn element_stiffness(&self, e: usize) -> Matrix6 {
        compute_element_stiffness(
            self.element_length(),
            self.material.e,
            self.shear_modulus(),
            &self.section(e),
        )
    }

    fn element_mass(&self, e: usize) -> Matrix6 {
        compute_element_mass(
            self.element_length(),
            self.material.rho,
            self.material.e,
            self.shear_modulus(),
            &self.section(e),
        )
    }

    /// Element stiffness per unit section scale.
    fn unit_element_stiffness(&self) -> Matrix6 {
        compute_element_stiffness(
            self.element_length(),
            self.material.e,
            self.shear_modulus(),
            &self.section,
        )
    }

    fn element_axial_force(&self, e: usize, path: &DVector<f64>) -> f64 {
        let u = self.gather(e, path);
        axial_force(self.element_length(), self.material.e, &self.section(e), &u)
    }

    fn scatter(&self, out: &mut DMatrix<f64>, e: usize, local: &Matrix6) {
        let dofs = Self::element_dofs(e);
        for (i, gi) in dofs.clone().enumerate() {
            for (j, gj) in dofs.clone().enumerate() {
                out[(gi, gj)] += local[(i, j)];
            }
        }
    }

    /// Zero constrained rows and columns, placing `diag` on the diagonal.
    fn apply_constraints(&self, out: &mut DMatrix<f64>, diag: f64) {
        for &c in &self.constrained {
            out.row_mut(c).fill(0.0);
            out.column_mut(c).fill(0.0);
            out[(c, c)] = diag;
        }
    }

    fn check_square(&self, out: &DMatrix<f64>) -> Result<()> {
        let n = self.num_dofs();
        if out.shape() != (n, n) {
            return Err(EigenError::DimensionMismatch {
                what: "column matrix",
                expected: n,
                found: out.nrows(),
            });
        }
        Ok(())
    }

    fn check_vector(&self, what: &'static str, v: &DVector<f64>) -> Result<()> {
        if v.len() != self.num_dofs() {
            return Err(EigenError::DimensionMismatch {
                what,
                expected: self.num_dofs(),
                found: v.len(),
            });
        }
        Ok(())
    }

    fn constrained_stiffness(&self) -> DMatrix<f64> {
        let mut k = self.allocate_matrix();
        for e in 0..self.num_elements {
            self.scatter(&mut k, e, &self.element_stiffness(e));
        }
        self.apply_constraints(&mut k, 1.0);
        k
    }

    fn solve_constrained(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let mut rhs = rhs.clone();
        for &c in &self.constrained {
            rhs[c] = 0.0;
        }
        let lu = self.constrained_stiffness().lu();
        let u = lu.u();
        let diag = u.diagonal().map(f64::abs);
        if diag.min() <= PIVOT_TOL * diag.max() {
            return Err(EigenError::LinearSolve("column stiffness is singular".into()));
        }
        lu.solve(&rhs)
            .ok_or_else(|| EigenError::LinearSolve("column stiffness solve failed".into()))
    }
}

impl StructuralModel for ColumnModel {
    type Matrix = DMatrix<f64>;

    fn num_dofs(&self) -> usize {
        (self.num_elements + 1) * DOF_PER_NODE_1D
    }

    fn num_design_vars(&self) -> usize {
        self.num_elements
    }

    fn design_vars(&self) -> Vec<f64> {
        self.scale.clone()
    }

    fn set_design_vars(&mut self, x: &[f64]) -> Result<()> {
        if x.len() != self.num_elements {
            return Err(EigenError::DesignVarLength {
                expected: self.num_elements,
                found: x.len(),
            });
        }
        if x.iter().any(|t| t.is_nan() || *t <= 0.0) {
            return Err(EigenError::Model("section scales must be positive".into()));
        }
        self.scale.copy_from_slice(x);
        Ok(())
    }

    fn assemble_matrix(&self, kind: MatrixKind, out: &mut DMatrix<f64>) -> Result<()> {
        self.check_square(out)?;
        out.fill(0.0);
        match kind {
            MatrixKind::Stiffness => {
                for e in 0..self.num_elements {
                    self.scatter(out, e, &self.element_stiffness(e));
                }
                self.apply_constraints(out, 1.0);
            }
            MatrixKind::Mass => {
                for e in 0..self.num_elements {
                    self.scatter(out, e, &self.element_mass(e));
                }
                self.apply_constraints(out, 0.0);
            }
            MatrixKind::GeometricStiffness => {
                return Err(EigenError::Model(
                    "geometric stiffness needs an equilibrium path".into(),
                ));
            }
        }
        Ok(())
    }

    fn add_matrix_dv_sens_inner_product(
        &self,
        kind: MatrixKind,
        scale: f64,
        psi: &DVector<f64>,
        phi: &DVector<f64>,
        path: Option<&DVector<f64>>,
        out: &mut [f64],
    ) -> Result<()> {
        if out.len() != self.num_elements {
            return Err(EigenError::DesignVarLength {
                expected: self.num_elements,
                found: out.len(),
            });
        }
        self.check_vector("sensitivity left vector", psi)?;
        self.check_vector("sensitivity right vector", phi)?;

        for (e, slot) in out.iter_mut().enumerate() {
            let t = self.scale[e];
            let pe = self.gather(e, psi);
            let fe = self.gather(e, phi);
            // Each element matrix is linear in its own section scale.
            let local = match kind {
                MatrixKind::Stiffness => self.element_stiffness(e) / t,
                MatrixKind::Mass => self.element_mass(e) / t,
                MatrixKind::GeometricStiffness => {
                    let path = path.ok_or_else(|| {
                        EigenError::Model("geometric stiffness needs an equilibrium path".into())
                    })?;
                    let n = self.element_axial_force(e, path);
                    compute_element_geometric_stiffness(self.element_length(), -n) / t
                }
            };
            *slot += scale * Self::quadratic_form(&local, &pe, &fe);
        }
        Ok(())
    }
}

impl PathDependentModel for ColumnModel {
    fn solve_equilibrium_path(&mut self, load_case: usize) -> Result<DVector<f64>> {
        let p = self.end_load(load_case)?;
        let mut f = DVector::zeros(self.num_dofs());
        f[self.num_elements * DOF_PER_NODE_1D] = -p;
        self.solve_constrained(&f)
    }

    /// G = −K_σ, positive semi-definite under compression.
    fn assemble_geometric_stiffness(
        &self,
        path: &DVector<f64>,
        out: &mut DMatrix<f64>,
    ) -> Result<()> {
        self.check_square(out)?;
        self.check_vector("equilibrium path", path)?;
        out.fill(0.0);
        for e in 0..self.num_elements {
            let n = self.element_axial_force(e, path);
            let ge = compute_element_geometric_stiffness(self.element_length(), -n);
            self.scatter(out, e, &ge);
        }
        self.apply_constraints(out, 0.0);
        Ok(())
    }

    fn geometric_stiffness_path_sens_product(
        &self,
        psi: &DVector<f64>,
        phi: &DVector<f64>,
        path: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        self.check_vector("equilibrium path", path)?;
        let le = self.element_length();
        let mut g = DVector::zeros(self.num_dofs());
        for e in 0..self.num_elements {
            let q = Self::quadratic_form(
                &geometric_stiffness_pattern(le),
                &self.gather(e, psi),
                &self.gather(e, phi),
            );
            // ψᵀG_eφ = −N q / (30 L) with dN/du2 = −dN/du1 = EA/L
            let ea_over_l = self.material.e * self.section(e).area / le;
            let d = -ea_over_l * q / (30.0 * le);
            let start = e * DOF_PER_NODE_1D;
            g[start] -= d;
            g[start + DOF_PER_NODE_1D] += d;
        }
        for &c in &self.constrained {
            g[c] = 0.0;
        }
        Ok(g)
    }

    fn solve_tangent_adjoint(
        &self,
        path: &DVector<f64>,
        rhs: &DVector<f64>,
    ) -> Result<DVector<f64>> {
        self.check_vector("equilibrium path", path)?;
        self.check_vector("adjoint right-hand side", rhs)?;
        // Linear statics: Kₜ = K, symmetric.
        self.solve_constrained(rhs)
    }

    fn add_residual_dv_sens_product(
        &self,
        load_case: usize,
        path: &DVector<f64>,
        adjoint: &DVector<f64>,
        scale: f64,
        out: &mut [f64],
    ) -> Result<()> {
        self.end_load(load_case)?;
        if out.len() != self.num_elements {
            return Err(EigenError::DesignVarLength {
                expected: self.num_elements,
                found: out.len(),
            });
        }
        self.check_vector("equilibrium path", path)?;
        self.check_vector("adjoint vector", adjoint)?;
        // R = K(x) p − f, f independent of the design.
        let k_unit = self.unit_element_stiffness();
        for (e, slot) in out.iter_mut().enumerate() {
            let q =
                Self::quadratic_form(&k_unit, &self.gather(e, adjoint), &self.gather(e, path));
            *slot += scale * q;
        }
        Ok(())
    }
}
