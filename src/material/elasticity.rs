use crate::tensor::{t4_ddot_t2_update, Tensor2, Tensor4, IDENTITY2, P_SYMDEV};
use crate::StrError;
use std::fmt;

/// Defines the elasticity law
pub trait Elasticity: Clone + fmt::Debug + Send + 'static {
    /// Name of the law (used in the configuration identifier)
    const NAME: &'static str;

    /// Indicates that the modulus does not depend on the stress state
    fn constant_modulus(&self) -> bool {
        false
    }

    /// Calculates the elastic rigidity modulus Dₑ(σ)
    fn modulus(&self, dde: &mut Tensor4, sigma: &Tensor2) -> Result<(), StrError>;

    /// Calculates the elastic trial stress
    ///
    /// ```text
    /// σ_trial = σ + Dₑ(σ) : Δε
    /// ```
    fn trial_stress(&self, sigma_trial: &mut Tensor2, delta_strain: &Tensor2, sigma: &Tensor2) -> Result<(), StrError> {
        let mut dde = Tensor4::new();
        self.modulus(&mut dde, sigma)?;
        sigma_trial.set_tensor(1.0, sigma);
        t4_ddot_t2_update(sigma_trial, 1.0, &dde, delta_strain, 1.0);
        Ok(())
    }
}

/// Implements linear isotropic elasticity
#[derive(Clone, Copy, Debug)]
pub struct LinearIsotropic {
    /// Young's modulus
    young: f64,

    /// Poisson's coefficient
    poisson: f64,

    /// Constant modulus
    dde: Tensor4,
}

/// Implements isotropic elasticity with a pressure-dependent Young's modulus
///
/// ```text
/// E = e_ref · (max(p, p_min) / p_ref)ⁿ   with   p = -σm
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PressureDependentIsotropic {
    e_ref: f64,
    p_ref: f64,
    n: f64,
    poisson: f64,
    p_min: f64,
}

/// Calculates the isotropic modulus D = 2G Psymdev + K I ⊗ I
fn calc_isotropic_modulus(dde: &mut Tensor4, young: f64, poisson: f64) {
    let kk = young / (3.0 * (1.0 - 2.0 * poisson));
    let gg = young / (2.0 * (1.0 + poisson));
    let mat = dde.matrix_mut();
    for i in 0..6 {
        for j in 0..6 {
            mat[(i, j)] = 2.0 * gg * P_SYMDEV[i][j] + kk * IDENTITY2[i] * IDENTITY2[j];
        }
    }
}

/// Checks the elastic constants
fn check_constants(young: f64, poisson: f64) -> Result<(), StrError> {
    if young <= 0.0 {
        return Err("Young's modulus must be > 0.0");
    }
    if poisson <= -1.0 || poisson >= 0.5 {
        return Err("Poisson's coefficient must be in (-1.0, 0.5)");
    }
    Ok(())
}

impl LinearIsotropic {
    /// Allocates a new instance
    pub fn new(young: f64, poisson: f64) -> Result<Self, StrError> {
        check_constants(young, poisson)?;
        let mut dde = Tensor4::new();
        calc_isotropic_modulus(&mut dde, young, poisson);
        Ok(LinearIsotropic { young, poisson, dde })
    }

    /// Returns the bulk and shear moduli
    pub fn bulk_shear(&self) -> (f64, f64) {
        let kk = self.young / (3.0 * (1.0 - 2.0 * self.poisson));
        let gg = self.young / (2.0 * (1.0 + self.poisson));
        (kk, gg)
    }

    /// Returns an access to the constant modulus
    pub fn get_modulus(&self) -> &Tensor4 {
        &self.dde
    }
}

impl PressureDependentIsotropic {
    /// Allocates a new instance
    pub fn new(e_ref: f64, p_ref: f64, n: f64, poisson: f64, p_min: f64) -> Result<Self, StrError> {
        check_constants(e_ref, poisson)?;
        if p_ref <= 0.0 {
            return Err("reference pressure must be > 0.0");
        }
        if p_min <= 0.0 {
            return Err("cut-off pressure must be > 0.0");
        }
        if n < 0.0 {
            return Err("pressure exponent must be ≥ 0.0");
        }
        Ok(PressureDependentIsotropic {
            e_ref,
            p_ref,
            n,
            poisson,
            p_min,
        })
    }

    /// Returns the Young's modulus at the given stress state
    pub fn young(&self, sigma: &Tensor2) -> f64 {
        let p = f64::max(-sigma.invariant_sigma_m(), self.p_min);
        self.e_ref * f64::powf(p / self.p_ref, self.n)
    }
}

impl Elasticity for LinearIsotropic {
    const NAME: &'static str = "LinearIsotropic";

    fn constant_modulus(&self) -> bool {
        true
    }

    fn modulus(&self, dde: &mut Tensor4, _sigma: &Tensor2) -> Result<(), StrError> {
        dde.set_tensor(1.0, &self.dde);
        Ok(())
    }
}

impl Elasticity for PressureDependentIsotropic {
    const NAME: &'static str = "PressureDependentIsotropic";

    fn modulus(&self, dde: &mut Tensor4, sigma: &Tensor2) -> Result<(), StrError> {
        let young = self.young(sigma);
        if !young.is_finite() {
            return Err("pressure-dependent Young's modulus is not finite");
        }
        calc_isotropic_modulus(dde, young, self.poisson);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
