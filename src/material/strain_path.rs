use super::{LocalState, NDMaterial};
use crate::tensor::{Tensor2, IDENTITY2, SQRT_2_BY_3, SQRT_3};
use crate::StrError;

/// Holds a sequence of total strains driving a material point
///
/// The strains may be given directly or computed from stresses using linear elasticity
/// (e.g., to generate a path with prescribed octahedral invariants).
#[derive(Clone, Debug)]
pub struct StrainPath {
    /// Holds the total strains
    pub strains: Vec<Tensor2>,

    /// Holds the stresses that generated the strains via linear elasticity (if given)
    pub stresses: Vec<Tensor2>,

    /// Holds the bulk and shear moduli used to compute strains from stresses
    compliance: Option<(f64, f64)>,
}

impl StrainPath {
    /// Allocates an empty path
    pub fn new() -> Self {
        StrainPath {
            strains: Vec::new(),
            stresses: Vec::new(),
            compliance: None,
        }
    }

    /// Allocates an empty path able to compute strains from stresses
    ///
    /// # Input
    ///
    /// * `young` -- Young's modulus to calculate strain from stress
    /// * `poisson` -- Poisson's coefficient to calculate strain from stress
    pub fn with_elasticity(young: f64, poisson: f64) -> Result<Self, StrError> {
        if young <= 0.0 {
            return Err("Young's modulus must be > 0.0");
        }
        if poisson <= -1.0 || poisson >= 0.5 {
            return Err("Poisson's coefficient must be in (-1.0, 0.5)");
        }
        let kk = young / (3.0 * (1.0 - 2.0 * poisson));
        let gg = young / (2.0 * (1.0 + poisson));
        Ok(StrainPath {
            strains: Vec::new(),
            stresses: Vec::new(),
            compliance: Some((kk, gg)),
        })
    }

    /// Generates a new linear path from octahedral invariants
    ///
    /// # Input
    ///
    /// * `young` -- Young's modulus to calculate strain from stress
    /// * `poisson` -- Poisson's coefficient to calculate strain from stress
    /// * `n_increments` -- number of increments
    /// * `sigma_m_0` -- the first sigma_m
    /// * `sigma_d_0` -- the first sigma_d
    /// * `dsigma_m` -- the increment of sigma_m
    /// * `dsigma_d` -- the increment of sigma_d
    /// * `lode` -- the lode invariant in -1 ≤ lode ≤ 1
    #[allow(clippy::too_many_arguments)]
    pub fn new_linear_oct(
        young: f64,
        poisson: f64,
        n_increments: usize,
        sigma_m_0: f64,
        sigma_d_0: f64,
        dsigma_m: f64,
        dsigma_d: f64,
        lode: f64,
    ) -> Result<Self, StrError> {
        let mut path = StrainPath::with_elasticity(young, poisson)?;
        path.push_stress_oct(sigma_m_0, sigma_d_0, lode)?;
        for i in 0..n_increments {
            let m = (i + 1) as f64;
            path.push_stress_oct(sigma_m_0 + m * dsigma_m, sigma_d_0 + m * dsigma_d, lode)?;
        }
        Ok(path)
    }

    /// Pushes a new total strain
    pub fn push_strain(&mut self, strain: &Tensor2) -> &mut Self {
        self.strains.push(*strain);
        self
    }

    /// Pushes a new total strain given its Voigt components (engineering shear strains)
    pub fn push_voigt(&mut self, voigt: &[f64; 6]) -> &mut Self {
        self.strains.push(Tensor2::from_voigt_strain(voigt));
        self
    }

    /// Pushes a stress and the corresponding elastic strain
    ///
    /// ```text
    /// ε = σm / (3 K) I + dev(σ) / (2 G)
    /// ```
    pub fn push_stress(&mut self, stress: &Tensor2) -> Result<&mut Self, StrError> {
        let (kk, gg) = self
            .compliance
            .ok_or("elastic constants are required to compute strains from stresses")?;
        let mut strain = stress.deviator() * (1.0 / (2.0 * gg));
        let eps_m = stress.invariant_sigma_m() / (3.0 * kk);
        for i in 0..3 {
            strain.vector_mut()[i] += eps_m * IDENTITY2[i];
        }
        self.stresses.push(*stress);
        self.strains.push(strain);
        Ok(self)
    }

    /// Pushes a stress computed from the octahedral invariants and the corresponding elastic strain
    ///
    /// # Input
    ///
    /// * `sigma_m` -- mean stress invariant `σm = ⅓ trace(σ)`
    /// * `sigma_d` -- deviatoric stress (von Mises) invariant `σd = √(3/2) ‖s‖`
    /// * `lode` -- Lode invariant in `-1 ≤ lode ≤ 1`
    pub fn push_stress_oct(&mut self, sigma_m: f64, sigma_d: f64, lode: f64) -> Result<&mut Self, StrError> {
        let distance = sigma_m * SQRT_3;
        let radius = sigma_d * SQRT_2_BY_3;
        let stress = Tensor2::new_from_octahedral(distance, radius, lode)?;
        self.push_stress(&stress)
    }

    /// Drives a material point through the path, committing every step
    ///
    /// Returns the history of states, starting with the state before the first strain.
    pub fn follow(&self, material: &mut dyn NDMaterial) -> Result<Vec<LocalState>, StrError> {
        let mut history = Vec::with_capacity(self.strains.len() + 1);
        history.push(LocalState::from_material(material));
        for strain in &self.strains {
            material.set_trial_strain(strain)?;
            material.commit_state()?;
            history.push(LocalState::from_material(material));
        }
        Ok(history)
    }
}

impl Default for StrainPath {
    fn default() -> Self {
        StrainPath::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
