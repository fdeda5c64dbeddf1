use super::InternalValue;
use crate::tensor::{Tensor2, SQRT_2_BY_3, TWO_BY_3};
use crate::StrError;
use std::fmt;

/// Defines the evolution law of an internal variable
///
/// The rate is taken with respect to the plastic multiplier, i.e., `Δz = Δλ · rate(z, m, σ)`.
pub trait HardeningLaw<V: InternalValue>: Clone + fmt::Debug + Send + 'static {
    /// Name of the law (used in the configuration identifier)
    const NAME: &'static str;

    /// Computes the rate of the internal value
    ///
    /// # Input
    ///
    /// * `current` -- current value of the internal variable
    /// * `m` -- plastic flow direction
    /// * `sigma` -- current stress
    fn rate(&self, current: &V, m: &Tensor2, sigma: &Tensor2) -> V;
}

/// Implements a law that keeps the internal value constant
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHardening;

/// Implements linear hardening of a scalar variable driven by the equivalent plastic strain
///
/// ```text
/// rate = √(2/3) H ‖m‖
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LinearHardeningScalar {
    /// Hardening modulus
    pub hh: f64,
}

/// Implements saturating (Voce) hardening of a scalar variable
///
/// ```text
/// rate = √(2/3) H (R∞ - R) ‖m‖
/// ```
///
/// Note: here H is dimensionless (H · Δε̄ₚ is the fraction of the remaining gap that is closed).
#[derive(Clone, Copy, Debug)]
pub struct VoceHardeningScalar {
    /// Saturation rate
    pub hh: f64,

    /// Saturation value
    pub r_inf: f64,
}

/// Implements linear kinematic (Prager) hardening of a tensor variable
///
/// ```text
/// rate = (2/3) H dev(m)
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LinearHardeningTensor {
    /// Hardening modulus
    pub hh: f64,
}

/// Implements Armstrong-Frederick kinematic hardening with dynamic recovery
///
/// ```text
/// rate = (2/3) hₐ dev(m) - cᵣ √(2/3) ‖m‖ α
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ArmstrongFrederick {
    /// Kinematic hardening modulus
    pub ha: f64,

    /// Dynamic recovery coefficient
    pub cr: f64,
}

impl LinearHardeningScalar {
    /// Allocates a new instance
    pub fn new(hh: f64) -> Self {
        LinearHardeningScalar { hh }
    }
}

impl VoceHardeningScalar {
    /// Allocates a new instance
    pub fn new(hh: f64, r_inf: f64) -> Result<Self, StrError> {
        if hh < 0.0 {
            return Err("Voce saturation rate must be ≥ 0.0");
        }
        Ok(VoceHardeningScalar { hh, r_inf })
    }
}

impl LinearHardeningTensor {
    /// Allocates a new instance
    pub fn new(hh: f64) -> Self {
        LinearHardeningTensor { hh }
    }
}

impl ArmstrongFrederick {
    /// Allocates a new instance
    pub fn new(ha: f64, cr: f64) -> Result<Self, StrError> {
        if cr < 0.0 {
            return Err("dynamic recovery coefficient must be ≥ 0.0");
        }
        Ok(ArmstrongFrederick { ha, cr })
    }
}

impl<V: InternalValue> HardeningLaw<V> for NoHardening {
    const NAME: &'static str = "NoHardening";

    fn rate(&self, _current: &V, _m: &Tensor2, _sigma: &Tensor2) -> V {
        V::zero()
    }
}

impl HardeningLaw<f64> for LinearHardeningScalar {
    const NAME: &'static str = "LinearHardeningScalar";

    fn rate(&self, _current: &f64, m: &Tensor2, _sigma: &Tensor2) -> f64 {
        SQRT_2_BY_3 * self.hh * m.norm()
    }
}

impl HardeningLaw<f64> for VoceHardeningScalar {
    const NAME: &'static str = "VoceHardeningScalar";

    fn rate(&self, current: &f64, m: &Tensor2, _sigma: &Tensor2) -> f64 {
        SQRT_2_BY_3 * self.hh * (self.r_inf - current) * m.norm()
    }
}

impl HardeningLaw<Tensor2> for LinearHardeningTensor {
    const NAME: &'static str = "LinearHardeningTensor";

    fn rate(&self, _current: &Tensor2, m: &Tensor2, _sigma: &Tensor2) -> Tensor2 {
        m.deviator() * (TWO_BY_3 * self.hh)
    }
}

impl HardeningLaw<Tensor2> for ArmstrongFrederick {
    const NAME: &'static str = "ArmstrongFrederick";

    fn rate(&self, current: &Tensor2, m: &Tensor2, _sigma: &Tensor2) -> Tensor2 {
        let mut rate = m.deviator() * (TWO_BY_3 * self.ha);
        rate.add_tensor(-self.cr * SQRT_2_BY_3 * m.norm(), current);
        rate
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
