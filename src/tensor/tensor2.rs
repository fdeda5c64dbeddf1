use super::{IDENTITY2, MANDEL_FACTOR, MANDEL_TO_IJ, SQRT_2, SQRT_2_BY_3, SQRT_3, SQRT_3_BY_2};
use crate::StrError;
use nalgebra::{Matrix3, SVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Holds the tolerance to accept a 3×3 matrix as symmetric
const SYMMETRY_TOL: f64 = 1e-14;

/// Implements a symmetric second-order tensor (e.g., stress or strain) in Mandel representation
///
/// The six independent components are stored as:
///
/// ```text
/// {T} = [T00, T11, T22, √2 T01, √2 T12, √2 T02]
/// ```
///
/// Thus, the double contraction `a : b` equals the dot product of the Mandel vectors and the
/// Euclidean norm of the Mandel vector equals the Frobenius norm of the tensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor2 {
    vec: SVector<f64, 6>,
}

impl Tensor2 {
    /// Allocates a new tensor with all components equal to zero
    pub fn new() -> Self {
        Tensor2 { vec: SVector::zeros() }
    }

    /// Allocates the second-order identity tensor
    pub fn identity() -> Self {
        Tensor2::from_mandel(&IDENTITY2)
    }

    /// Allocates a new tensor from its Mandel components
    pub fn from_mandel(components: &[f64; 6]) -> Self {
        Tensor2 {
            vec: SVector::from_column_slice(components),
        }
    }

    /// Allocates a new tensor from the first six entries of a slice with Mandel components
    ///
    /// # Panics
    ///
    /// A panic will occur if the slice has less than six entries.
    pub fn from_slice(components: &[f64]) -> Self {
        Tensor2 {
            vec: SVector::from_column_slice(&components[..6]),
        }
    }

    /// Allocates a new tensor from a Mandel vector
    pub fn from_vector(vec: SVector<f64, 6>) -> Self {
        Tensor2 { vec }
    }

    /// Allocates a new tensor from a symmetric 3×3 matrix
    pub fn from_matrix(mat: &[[f64; 3]; 3]) -> Result<Self, StrError> {
        for i in 0..3 {
            for j in (i + 1)..3 {
                if f64::abs(mat[i][j] - mat[j][i]) > SYMMETRY_TOL * (1.0 + f64::abs(mat[i][j])) {
                    return Err("matrix must be symmetric");
                }
            }
        }
        let mut vec = SVector::zeros();
        for m in 0..6 {
            let (i, j) = MANDEL_TO_IJ[m];
            vec[m] = MANDEL_FACTOR[m] * mat[i][j];
        }
        Ok(Tensor2 { vec })
    }

    /// Allocates a new strain tensor from Voigt components with engineering shear strains
    ///
    /// ```text
    /// voigt = [ε00, ε11, ε22, γ01, γ12, γ02]  with  γij = 2 εij
    /// ```
    pub fn from_voigt_strain(voigt: &[f64; 6]) -> Self {
        let mut vec = SVector::zeros();
        for m in 0..6 {
            vec[m] = if m < 3 { voigt[m] } else { voigt[m] / SQRT_2 };
        }
        Tensor2 { vec }
    }

    /// Allocates a new stress tensor from Voigt components
    ///
    /// ```text
    /// voigt = [σ00, σ11, σ22, σ01, σ12, σ02]
    /// ```
    pub fn from_voigt_stress(voigt: &[f64; 6]) -> Self {
        let mut vec = SVector::zeros();
        for m in 0..6 {
            vec[m] = MANDEL_FACTOR[m] * voigt[m];
        }
        Tensor2 { vec }
    }

    /// Allocates a diagonal tensor given its octahedral invariants
    ///
    /// # Input
    ///
    /// * `distance` -- distance along the space diagonal: `tr(T) / √3`
    /// * `radius` -- norm of the deviator: `‖dev(T)‖`
    /// * `lode` -- Lode invariant `cos(3θ)` in `[-1, 1]`
    pub fn new_from_octahedral(distance: f64, radius: f64, lode: f64) -> Result<Self, StrError> {
        if lode < -1.0 || lode > 1.0 {
            return Err("lode invariant must be in [-1, 1]");
        }
        if radius < 0.0 {
            return Err("radius must be ≥ 0.0");
        }
        let theta = f64::acos(lode) / 3.0;
        let two_pi_by_3 = 2.0 * std::f64::consts::PI / 3.0;
        let mean = distance / SQRT_3;
        let scale = SQRT_2_BY_3 * radius;
        let mut vec = SVector::zeros();
        vec[0] = mean + scale * f64::cos(theta);
        vec[1] = mean + scale * f64::cos(theta - two_pi_by_3);
        vec[2] = mean + scale * f64::cos(theta + two_pi_by_3);
        Ok(Tensor2 { vec })
    }

    /// Returns an access to the Mandel vector
    pub fn vector(&self) -> &SVector<f64, 6> {
        &self.vec
    }

    /// Returns a mutable access to the Mandel vector
    pub fn vector_mut(&mut self) -> &mut SVector<f64, 6> {
        &mut self.vec
    }

    /// Returns the Mandel components as a slice
    pub fn as_slice(&self) -> &[f64] {
        self.vec.as_slice()
    }

    /// Returns the (i, j) component of the physical tensor
    pub fn get(&self, i: usize, j: usize) -> f64 {
        for m in 0..6 {
            let (a, b) = MANDEL_TO_IJ[m];
            if (a == i && b == j) || (a == j && b == i) {
                return self.vec[m] / MANDEL_FACTOR[m];
            }
        }
        panic!("index out of bounds");
    }

    /// Returns the physical tensor as a 3×3 matrix
    pub fn as_matrix(&self) -> Matrix3<f64> {
        let mut mat = Matrix3::zeros();
        for m in 0..6 {
            let (i, j) = MANDEL_TO_IJ[m];
            let value = self.vec[m] / MANDEL_FACTOR[m];
            mat[(i, j)] = value;
            mat[(j, i)] = value;
        }
        mat
    }

    /// Returns the Voigt components with engineering shear strains
    pub fn to_voigt_strain(&self) -> [f64; 6] {
        let mut voigt = [0.0; 6];
        for m in 0..6 {
            voigt[m] = if m < 3 { self.vec[m] } else { self.vec[m] * SQRT_2 };
        }
        voigt
    }

    /// Returns the Voigt components of a stress tensor
    pub fn to_voigt_stress(&self) -> [f64; 6] {
        let mut voigt = [0.0; 6];
        for m in 0..6 {
            voigt[m] = self.vec[m] / MANDEL_FACTOR[m];
        }
        voigt
    }

    /// Sets all components to zero
    pub fn clear(&mut self) {
        self.vec.fill(0.0);
    }

    /// Sets this tensor equal to another one multiplied by a scalar
    ///
    /// ```text
    /// self := α other
    /// ```
    pub fn set_tensor(&mut self, alpha: f64, other: &Tensor2) {
        self.vec.copy_from(&other.vec);
        self.vec *= alpha;
    }

    /// Adds another tensor multiplied by a scalar
    ///
    /// ```text
    /// self += α other
    /// ```
    pub fn add_tensor(&mut self, alpha: f64, other: &Tensor2) {
        self.vec.axpy(alpha, &other.vec, 1.0);
    }

    /// Returns the trace
    pub fn trace(&self) -> f64 {
        self.vec[0] + self.vec[1] + self.vec[2]
    }

    /// Returns the deviatoric part
    ///
    /// ```text
    /// dev(T) = T - (tr(T) / 3) I
    /// ```
    pub fn deviator(&self) -> Tensor2 {
        let mean = self.trace() / 3.0;
        let mut dev = *self;
        for m in 0..3 {
            dev.vec[m] -= mean;
        }
        dev
    }

    /// Returns the Frobenius norm
    pub fn norm(&self) -> f64 {
        self.vec.norm()
    }

    /// Returns the norm of the deviatoric part
    pub fn deviator_norm(&self) -> f64 {
        self.deviator().norm()
    }

    /// Returns the mean stress invariant (positive in tension)
    ///
    /// ```text
    /// σm = tr(σ) / 3
    /// ```
    pub fn invariant_sigma_m(&self) -> f64 {
        self.trace() / 3.0
    }

    /// Returns the deviatoric stress invariant (von Mises equivalent stress)
    ///
    /// ```text
    /// σd = √(3/2) ‖dev(σ)‖
    /// ```
    pub fn invariant_sigma_d(&self) -> f64 {
        SQRT_3_BY_2 * self.deviator_norm()
    }

    /// Returns the volumetric strain invariant
    ///
    /// ```text
    /// εv = tr(ε)
    /// ```
    pub fn invariant_eps_v(&self) -> f64 {
        self.trace()
    }

    /// Returns the deviatoric strain invariant
    ///
    /// ```text
    /// εd = √(2/3) ‖dev(ε)‖
    /// ```
    pub fn invariant_eps_d(&self) -> f64 {
        SQRT_2_BY_3 * self.deviator_norm()
    }

    /// Indicates whether all components are finite
    pub fn is_finite(&self) -> bool {
        self.vec.iter().all(|x| x.is_finite())
    }
}

impl Default for Tensor2 {
    fn default() -> Self {
        Tensor2::new()
    }
}

impl Add for Tensor2 {
    type Output = Tensor2;
    fn add(self, other: Tensor2) -> Tensor2 {
        Tensor2 { vec: self.vec + other.vec }
    }
}

impl Sub for Tensor2 {
    type Output = Tensor2;
    fn sub(self, other: Tensor2) -> Tensor2 {
        Tensor2 { vec: self.vec - other.vec }
    }
}

impl Mul<f64> for Tensor2 {
    type Output = Tensor2;
    fn mul(self, alpha: f64) -> Tensor2 {
        Tensor2 { vec: self.vec * alpha }
    }
}

impl Mul<Tensor2> for f64 {
    type Output = Tensor2;
    fn mul(self, tensor: Tensor2) -> Tensor2 {
        Tensor2 { vec: tensor.vec * self }
    }
}

impl Neg for Tensor2 {
    type Output = Tensor2;
    fn neg(self) -> Tensor2 {
        Tensor2 { vec: -self.vec }
    }
}

impl AddAssign for Tensor2 {
    fn add_assign(&mut self, other: Tensor2) {
        self.vec += other.vec;
    }
}

impl SubAssign for Tensor2 {
    fn sub_assign(&mut self, other: Tensor2) {
        self.vec -= other.vec;
    }
}

impl fmt::Display for Tensor2 {
    /// Returns a nicely formatted string representing the physical 3×3 tensor
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mat = self.as_matrix();
        for i in 0..3 {
            let row = [mat[(i, 0)], mat[(i, 1)], mat[(i, 2)]];
            match f.precision() {
                Some(v) => write!(f, "[{:.3$} {:.3$} {:.3$}]", row[0], row[1], row[2], v)?,
                None => write!(f, "[{} {} {}]", row[0], row[1], row[2])?,
            }
            if i < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Tensor2;
    use crate::tensor::{SQRT_2, SQRT_3};
    use approx::assert_abs_diff_eq;

    #[test]
    fn from_matrix_captures_errors() {
        let mat = [[1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        assert_eq!(Tensor2::from_matrix(&mat).err(), Some("matrix must be symmetric"));
    }

    #[test]
    fn from_matrix_and_as_matrix_work() {
        let mat = [[1.0, 4.0, 6.0], [4.0, 2.0, 5.0], [6.0, 5.0, 3.0]];
        let tt = Tensor2::from_matrix(&mat).unwrap();
        let v = tt.vector();
        assert_eq!(v[0], 1.0);
        assert_eq!(v[1], 2.0);
        assert_eq!(v[2], 3.0);
        assert_abs_diff_eq!(v[3], 4.0 * SQRT_2, epsilon = 1e-15);
        assert_abs_diff_eq!(v[4], 5.0 * SQRT_2, epsilon = 1e-15);
        assert_abs_diff_eq!(v[5], 6.0 * SQRT_2, epsilon = 1e-15);
        let back = tt.as_matrix();
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(back[(i, j)], mat[i][j], epsilon = 1e-14);
                assert_abs_diff_eq!(tt.get(i, j), mat[i][j], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn double_contraction_equals_matrix_contraction() {
        let a = Tensor2::from_matrix(&[[1.0, 4.0, 6.0], [4.0, 2.0, 5.0], [6.0, 5.0, 3.0]]).unwrap();
        let b = Tensor2::from_matrix(&[[-1.0, 0.5, 2.0], [0.5, 3.0, -1.0], [2.0, -1.0, 0.0]]).unwrap();
        let ma = a.as_matrix();
        let mb = b.as_matrix();
        let reference = ma.component_mul(&mb).sum();
        assert_abs_diff_eq!(a.vector().dot(b.vector()), reference, epsilon = 1e-13);
        assert_abs_diff_eq!(a.norm(), ma.norm(), epsilon = 1e-13);
    }

    #[test]
    fn voigt_conversions_work() {
        let strain = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let eps = Tensor2::from_voigt_strain(&strain);
        assert_abs_diff_eq!(eps.get(0, 1), 0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(eps.get(1, 2), 0.25, epsilon = 1e-15);
        let back = eps.to_voigt_strain();
        for m in 0..6 {
            assert_abs_diff_eq!(back[m], strain[m], epsilon = 1e-15);
        }
        let stress = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        let sig = Tensor2::from_voigt_stress(&stress);
        assert_abs_diff_eq!(sig.get(0, 2), 60.0, epsilon = 1e-13);
        let back = sig.to_voigt_stress();
        for m in 0..6 {
            assert_abs_diff_eq!(back[m], stress[m], epsilon = 1e-13);
        }
    }

    #[test]
    fn invariants_work() {
        let sig = Tensor2::from_matrix(&[[3.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]]).unwrap();
        assert_abs_diff_eq!(sig.invariant_sigma_m(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(sig.invariant_sigma_d(), 3.0, epsilon = 1e-14);
        assert_abs_diff_eq!(sig.deviator().trace(), 0.0, epsilon = 1e-15);
        let eps = Tensor2::from_matrix(&[[1.0, 0.0, 0.0], [0.0, -0.5, 0.0], [0.0, 0.0, -0.5]]).unwrap();
        assert_abs_diff_eq!(eps.invariant_eps_v(), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(eps.invariant_eps_d(), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn new_from_octahedral_works() {
        for lode in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            let tt = Tensor2::new_from_octahedral(2.0 * SQRT_3, 3.0, lode).unwrap();
            assert_abs_diff_eq!(tt.invariant_sigma_m(), 2.0, epsilon = 1e-14);
            assert_abs_diff_eq!(tt.deviator_norm(), 3.0, epsilon = 1e-14);
        }
        assert_eq!(
            Tensor2::new_from_octahedral(1.0, 1.0, 1.5).err(),
            Some("lode invariant must be in [-1, 1]")
        );
    }

    #[test]
    fn arithmetic_works() {
        let a = Tensor2::from_mandel(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Tensor2::from_mandel(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let c = a + b * 2.0 - a;
        assert_eq!(c.as_slice(), &[12.0, 10.0, 8.0, 6.0, 4.0, 2.0]);
        let mut d = Tensor2::new();
        d.set_tensor(0.5, &c);
        d.add_tensor(-1.0, &b);
        assert_eq!(d.norm(), 0.0);
        d += a;
        d -= 2.0 * a;
        assert_eq!(d, -a);
    }

    #[test]
    fn display_works() {
        let tt = Tensor2::from_matrix(&[[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 3.0]]).unwrap();
        assert_eq!(format!("{:.1}", tt), "[1.0 0.0 0.0]\n[0.0 2.0 0.0]\n[0.0 0.0 3.0]");
    }
}
