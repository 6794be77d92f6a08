//! Planar Timoshenko frame element with consistent geometric stiffness.
//!
//! 3 DOF per node:
//! - u: axial displacement
//! - w: transverse displacement
//! - θ: rotation (bending)
//!
//! ## Element DOF ordering
//! ```text
//! Node 1: [u1, w1, θ1]
//! Node 2: [u2, w2, θ2]
//! Element DOFs: [u1, w1, θ1, u2, w2, θ2]
//! ```
//!
//! Stiffness and mass are linear in a uniform scale of the section (area and
//! second moment scaled together), since the shear parameter φ depends only
//! on I/A. The geometric stiffness uses cubic transverse interpolation and is
//! linear in the axial force.

use nalgebra::SMatrix;

pub type Matrix6 = SMatrix<f64, 6, 6>;

/// DOFs per node for the frame element (axial + transverse + rotation).
pub const DOF_PER_NODE_1D: usize = 3;

/// DOFs per element (2 nodes × 3 DOF/node).
pub const DOF_PER_ELEMENT_1D: usize = 6;

/// G = E / (2 (1 + ν))
#[inline]
pub fn shear_modulus(e: f64, nu: f64) -> f64 {
    e / (2.0 * (1.0 + nu))
}

/// I = b h³ / 12
#[inline]
pub fn second_moment_of_area_rect(b: f64, h: f64) -> f64 {
    b * h * h * h / 12.0
}

/// Cross-section properties for a frame element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    /// Cross-sectional area (m²)
    pub area: f64,
    /// Second moment of area about bending axis (m⁴)
    pub i_bend: f64,
    /// Shear correction factor
    pub kappa: f64,
}

impl CrossSection {
    /// Rectangular section of width `b` and height `h`.
    pub fn rectangular(b: f64, h: f64) -> Self {
        Self {
            area: b * h,
            i_bend: second_moment_of_area_rect(b, h),
            kappa: 5.0 / 6.0,
        }
    }

    /// Area and second moment multiplied by `t`.
    pub fn scaled(&self, t: f64) -> Self {
        Self {
            area: self.area * t,
            i_bend: self.i_bend * t,
            kappa: self.kappa,
        }
    }

    fn shear_parameter(&self, le: f64, e: f64, g: f64) -> f64 {
        12.0 * e * self.i_bend / (self.kappa * g * self.area * le * le)
    }
}

/// Timoshenko frame element stiffness matrix (6×6).
pub fn compute_element_stiffness(le: f64, e: f64, g: f64, cs: &CrossSection) -> Matrix6 {
    let i = cs.i_bend;
    let k_axial = e * cs.area / le;

    let phi = cs.shear_parameter(le, e, g);
    let denom = (1.0 + phi) * le * le * le;

    let k11 = 12.0 * e * i / denom;
    let k12 = 6.0 * e * i * le / denom;
    let k22 = (4.0 + phi) * e * i * le * le / denom;
    let k23 = (2.0 - phi) * e * i * le * le / denom;

    #[rustfmt::skip]
    let k = Matrix6::from_row_slice(&[
        // u1       w1       θ1       u2       w2       θ2
        k_axial,   0.0,     0.0,    -k_axial,  0.0,     0.0,    // u1
        0.0,       k11,     k12,     0.0,     -k11,     k12,    // w1
        0.0,       k12,     k22,     0.0,     -k12,     k23,    // θ1
       -k_axial,   0.0,     0.0,     k_axial,  0.0,     0.0,    // u2
        0.0,      -k11,    -k12,     0.0,      k11,    -k12,    // w2
        0.0,       k12,     k23,     0.0,     -k12,     k22,    // θ2
    ]);

    k
}

/// Timoshenko frame element consistent mass matrix (6×6), translational
/// inertia plus rotary inertia.
pub fn compute_element_mass(le: f64, rho: f64, e: f64, g: f64, cs: &CrossSection) -> Matrix6 {
    let i = cs.i_bend;
    let phi = cs.shear_parameter(le, e, g);
    let phi2 = phi * phi;
    let one_plus_phi2 = (1.0 + phi) * (1.0 + phi);

    let m = rho * cs.area * le;
    let ma_11 = m / 3.0;
    let ma_12 = m / 6.0;

    // Przemieniecki, "Theory of Matrix Structural Analysis"
    let coeff = m / (one_plus_phi2 * 420.0);
    let m_11 = coeff * (156.0 + 294.0 * phi + 140.0 * phi2);
    let m_13 = coeff * (54.0 + 126.0 * phi + 70.0 * phi2);
    let m_12 = coeff * le * (22.0 + 38.5 * phi + 17.5 * phi2);
    let m_14 = -coeff * le * (13.0 + 31.5 * phi + 17.5 * phi2);
    let m_22 = coeff * le * le * (4.0 + 7.0 * phi + 3.5 * phi2);
    let m_24 = -coeff * le * le * (3.0 + 7.0 * phi + 3.5 * phi2);

    let r_coeff = rho * i / (one_plus_phi2 * le * 30.0);
    let r_11 = r_coeff * 36.0;
    let r_12 = r_coeff * le * (3.0 - 15.0 * phi);
    let r_22 = r_coeff * le * le * (4.0 + 5.0 * phi + 10.0 * phi2);
    let r_24 = r_coeff * le * le * (-1.0 - 5.0 * phi + 5.0 * phi2);

    let m_ww_11 = m_11 + r_11;
    let m_wt_11 = m_12 + r_12;
    let m_ww_12 = m_13 - r_11;
    let m_wt_12 = m_14 + r_12;
    let m_tt_11 = m_22 + r_22;
    let m_tt_12 = m_24 + r_24;

    #[rustfmt::skip]
    let mass = Matrix6::from_row_slice(&[
        // u1       w1         θ1         u2       w2         θ2
        ma_11,     0.0,       0.0,       ma_12,    0.0,       0.0,       // u1
        0.0,       m_ww_11,   m_wt_11,   0.0,      m_ww_12,   m_wt_12,   // w1
        0.0,       m_wt_11,   m_tt_11,   0.0,     -m_wt_12,   m_tt_12,   // θ1
        ma_12,     0.0,       0.0,       ma_11,    0.0,       0.0,       // u2
        0.0,       m_ww_12,  -m_wt_12,   0.0,      m_ww_11,  -m_wt_11,   // w2
        0.0,       m_wt_12,   m_tt_12,   0.0,     -m_wt_11,   m_tt_11,   // θ2
    ]);

    mass
}

/// Geometric stiffness pattern S with K_σ = N/(30 L) · S.
///
/// S is positive semi-definite; rigid transverse translation is its null
/// space on the bending DOFs, and axial DOFs do not participate.
pub fn geometric_stiffness_pattern(le: f64) -> Matrix6 {
    let l = le;
    let l2 = le * le;

    #[rustfmt::skip]
    let s = Matrix6::from_row_slice(&[
        // u1   w1        θ1         u2   w2        θ2
        0.0,    0.0,      0.0,       0.0, 0.0,      0.0,       // u1
        0.0,    36.0,     3.0 * l,   0.0, -36.0,    3.0 * l,   // w1
        0.0,    3.0 * l,  4.0 * l2,  0.0, -3.0 * l, -l2,       // θ1
        0.0,    0.0,      0.0,       0.0, 0.0,      0.0,       // u2
        0.0,    -36.0,    -3.0 * l,  0.0, 36.0,     -3.0 * l,  // w2
        0.0,    3.0 * l,  -l2,       0.0, -3.0 * l, 4.0 * l2,  // θ2
    ]);

    s
}

/// Stress stiffness for axial force `n` (tension positive).
pub fn compute_element_geometric_stiffness(le: f64, n: f64) -> Matrix6 {
    geometric_stiffness_pattern(le) * (n / (30.0 * le))
}

/// Axial force N = EA (u2 − u1) / L from the element displacement vector.
#[inline]
pub fn axial_force(le: f64, e: f64, cs: &CrossSection, u: &[f64; DOF_PER_ELEMENT_1D]) -> f64 {
    e * cs.area * (u[3] - u[0]) / le
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::SVector;

    const TOL: f64 = 1e-10;

    fn get_test_params() -> (f64, f64, f64, f64, CrossSection) {
        let le = 0.1; // 100mm element
        let e = 200e9; // Steel, 200 GPa
        let nu = 0.3;
        let rho = 7850.0;
        let g = shear_modulus(e, nu);
        let cs = CrossSection::rectangular(0.02, 0.03);
        (le, e, g, rho, cs)
    }

    fn assert_symmetric(m: &Matrix6, tol: f64) {
        for row in 0..6 {
            for col in 0..6 {
                assert!(
                    (m[(row, col)] - m[(col, row)]).abs() <= tol,
                    "not symmetric at ({row}, {col}): {} vs {}",
                    m[(row, col)],
                    m[(col, row)]
                );
            }
        }
    }

    #[test]
    fn element_matrices_are_symmetric() {
        let (le, e, g, rho, cs) = get_test_params();
        assert_symmetric(&compute_element_stiffness(le, e, g, &cs), TOL * e);
        assert_symmetric(&compute_element_mass(le, rho, e, g, &cs), TOL);
        assert_symmetric(&compute_element_geometric_stiffness(le, -1.0e4), TOL);
    }

    #[test]
    fn stiffness_and_mass_scale_linearly_with_section() {
        let (le, e, g, rho, cs) = get_test_params();
        let t = 1.7;
        let k1 = compute_element_stiffness(le, e, g, &cs);
        let kt = compute_element_stiffness(le, e, g, &cs.scaled(t));
        let m1 = compute_element_mass(le, rho, e, g, &cs);
        let mt = compute_element_mass(le, rho, e, g, &cs.scaled(t));
        assert!((kt - k1 * t).amax() <= 1e-12 * kt.amax());
        assert!((mt - m1 * t).amax() <= 1e-12 * mt.amax());
    }

    #[test]
    fn axial_stiffness_is_correct() {
        let (le, e, g, _, cs) = get_test_params();
        let ke = compute_element_stiffness(le, e, g, &cs);
        let expected_axial = e * cs.area / le;
        assert!((ke[(0, 0)] - expected_axial).abs() / expected_axial < 1e-12);
    }

    #[test]
    fn total_axial_mass_is_conserved() {
        let (le, e, g, rho, cs) = get_test_params();
        let me = compute_element_mass(le, rho, e, g, &cs);
        let axial_mass = me[(0, 0)] + me[(0, 3)] + me[(3, 0)] + me[(3, 3)];
        let expected_mass = rho * cs.area * le;
        assert!((axial_mass - expected_mass).abs() / expected_mass < 1e-12);
    }

    #[test]
    fn geometric_stiffness_ignores_rigid_translation() {
        let le = 0.25;
        let s = geometric_stiffness_pattern(le);
        let rigid = SVector::<f64, 6>::from_row_slice(&[0.3, 1.0, 0.0, 0.3, 1.0, 0.0]);
        assert!((s * rigid).amax() < 1e-12);

        // Rigid rotation w = θ x has energy ∫ θ² dx = L θ²; S carries 30 L.
        let theta = 0.01;
        let rot = SVector::<f64, 6>::from_row_slice(&[0.0, 0.0, theta, 0.0, theta * le, theta]);
        let energy = (rot.transpose() * s * rot)[(0, 0)];
        assert!((energy - 30.0 * le * le * theta * theta).abs() < 1e-12);
    }

    #[test]
    fn axial_force_sign() {
        let (le, e, _, _, cs) = get_test_params();
        let shortened = [0.0, 0.0, 0.0, -1e-6, 0.0, 0.0];
        assert!(axial_force(le, e, &cs, &shortened) < 0.0);
    }

    #[test]
    fn shear_modulus_calculation() {
        let g = shear_modulus(200e9, 0.3);
        assert!((g - 200e9 / 2.6).abs() < 1e3);
    }
}
