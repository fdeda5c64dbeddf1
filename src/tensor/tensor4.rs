use super::{MANDEL_FACTOR, P_SYMDEV};
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

/// Implements a fourth-order tensor with minor symmetries in Mandel representation (6×6 matrix)
///
/// The Mandel representation makes `σ = D : ε` a plain matrix-vector product of the Mandel vectors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor4 {
    mat: SMatrix<f64, 6, 6>,
}

impl Tensor4 {
    /// Allocates a new tensor with all components equal to zero
    pub fn new() -> Self {
        Tensor4 { mat: SMatrix::zeros() }
    }

    /// Allocates the symmetric fourth-order identity tensor
    pub fn identity() -> Self {
        Tensor4 {
            mat: SMatrix::identity(),
        }
    }

    /// Allocates the symmetric-deviatoric projector
    pub fn new_sym_dev() -> Self {
        let mut mat = SMatrix::zeros();
        for i in 0..6 {
            for j in 0..6 {
                mat[(i, j)] = P_SYMDEV[i][j];
            }
        }
        Tensor4 { mat }
    }

    /// Allocates a new tensor from its Mandel matrix
    pub fn from_matrix(mat: SMatrix<f64, 6, 6>) -> Self {
        Tensor4 { mat }
    }

    /// Returns an access to the Mandel matrix
    pub fn matrix(&self) -> &SMatrix<f64, 6, 6> {
        &self.mat
    }

    /// Returns a mutable access to the Mandel matrix
    pub fn matrix_mut(&mut self) -> &mut SMatrix<f64, 6, 6> {
        &mut self.mat
    }

    /// Returns the (i, j) component of the Mandel matrix
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.mat[(i, j)]
    }

    /// Sets all components to zero
    pub fn clear(&mut self) {
        self.mat.fill(0.0);
    }

    /// Sets this tensor equal to another one multiplied by a scalar
    ///
    /// ```text
    /// self := α other
    /// ```
    pub fn set_tensor(&mut self, alpha: f64, other: &Tensor4) {
        self.mat.copy_from(&other.mat);
        self.mat *= alpha;
    }

    /// Adds another tensor multiplied by a scalar
    ///
    /// ```text
    /// self += α other
    /// ```
    pub fn add_tensor(&mut self, alpha: f64, other: &Tensor4) {
        self.mat += other.mat * alpha;
    }

    /// Returns the stiffness matrix in Voigt notation (engineering shear strains)
    ///
    /// ```text
    /// {σ} = [D] {ε}  with  {σ} = [σ00, σ11, σ22, σ01, σ12, σ02]  and  {ε} = [ε00, ε11, ε22, γ01, γ12, γ02]
    /// ```
    pub fn to_voigt_matrix(&self) -> [[f64; 6]; 6] {
        let mut voigt = [[0.0; 6]; 6];
        for i in 0..6 {
            for j in 0..6 {
                voigt[i][j] = self.mat[(i, j)] / (MANDEL_FACTOR[i] * MANDEL_FACTOR[j]);
            }
        }
        voigt
    }

    /// Indicates whether the Mandel matrix is symmetric (major symmetry) within a tolerance
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..6 {
            for j in (i + 1)..6 {
                if f64::abs(self.mat[(i, j)] - self.mat[(j, i)]) > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Indicates whether all components are finite
    pub fn is_finite(&self) -> bool {
        self.mat.iter().all(|x| x.is_finite())
    }
}

impl Default for Tensor4 {
    fn default() -> Self {
        Tensor4::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
