use super::{ValueKind, VariableLayout, BACK_STRESS, VON_MISES_RADIUS};
use crate::tensor::{Tensor2, IDENTITY2, MANDEL_DIM, ONE_BY_3, SQRT_2_BY_3};
use crate::StrError;
use std::fmt;

/// Holds the smallest norm of the relative deviatoric stress allowing the computation of the normal
pub(crate) const NORM_XI_MIN: f64 = 1e-14;

/// Defines the yield function f(σ, z)
///
/// Sign convention: f ≤ 0 is admissible and f > 0 is inadmissible. The internal values z are
/// the flattened values of all internal variables according to the layout given to `bind`.
pub trait YieldFunction: Clone + fmt::Debug + Send + 'static {
    /// Name of the yield function (used in the configuration identifier)
    const NAME: &'static str;

    /// Resolves the internal variables needed by this function
    ///
    /// Returns an error if a required variable is missing or has an incompatible value type.
    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError>;

    /// Calculates the yield function value
    fn value(&self, sigma: &Tensor2, z: &[f64]) -> Result<f64, StrError>;

    /// Calculates the derivative of the yield function w.r.t the stress
    fn df_dsigma(&self, df_dsigma: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError>;

    /// Calculates the derivative of the yield function w.r.t all (flattened) internal values
    fn df_dz(&self, df_dz: &mut [f64], sigma: &Tensor2, z: &[f64]) -> Result<(), StrError>;

    /// Calculates the derivative of the yield function w.r.t the internal variable at `index`
    ///
    /// The result has as many components as the value type of the variable.
    fn df_dz_variable(
        &self,
        layout: &VariableLayout,
        index: usize,
        sigma: &Tensor2,
        z: &[f64],
    ) -> Result<Vec<f64>, StrError> {
        let entry = layout.entries().get(index).ok_or("index of internal variable is out of bounds")?;
        let mut df_dz = vec![0.0; layout.n_values()];
        self.df_dz(&mut df_dz, sigma, z)?;
        Ok(df_dz[entry.offset..(entry.offset + entry.len)].to_vec())
    }

    /// Calculates the stress at the apex of the yield surface, where the normal is undefined
    ///
    /// Returns None if the yield surface has no apex (the default).
    fn apex_stress(&self, _z: &[f64]) -> Result<Option<Tensor2>, StrError> {
        Ok(None)
    }
}

/// Implements the von Mises yield function with isotropic and (optional) kinematic hardening
///
/// ```text
/// f = ‖ξ‖ - √(2/3) R   with   ξ = dev(σ - α)
/// ```
///
/// R is the VonMisesRadius variable (in von Mises stress units) and α is the optional BackStress.
#[derive(Clone, Copy, Debug, Default)]
pub struct VonMisesYield {
    radius: Option<usize>,
    back_stress: Option<usize>,
}

/// Implements the Drucker-Prager yield function with isotropic and (optional) kinematic hardening
///
/// ```text
/// f = ‖ξ‖ - √(2/3) (R + η p)   with   ξ = dev(σ - α)   and   p = -σm
/// ```
///
/// If η > 0, the cone has its apex at ξ = 0 and σm = R / η.
#[derive(Clone, Copy, Debug)]
pub struct DruckerPragerYield {
    eta: f64,
    radius: Option<usize>,
    back_stress: Option<usize>,
}

/// Calculates the relative deviatoric stress ξ = dev(σ - α)
pub(crate) fn relative_deviator(sigma: &Tensor2, z: &[f64], back_stress: Option<usize>) -> Tensor2 {
    let mut xi = *sigma;
    if let Some(offset) = back_stress {
        for i in 0..MANDEL_DIM {
            xi.vector_mut()[i] -= z[offset + i];
        }
    }
    xi.deviator()
}

/// Calculates the unit normal n = ξ / ‖ξ‖ and returns ‖ξ‖
pub(crate) fn unit_normal(n: &mut Tensor2, xi: &Tensor2) -> Result<f64, StrError> {
    let norm = xi.norm();
    if norm < NORM_XI_MIN {
        return Err("cannot compute the normal to the yield surface due to singularity");
    }
    n.set_tensor(1.0 / norm, xi);
    Ok(norm)
}

/// Returns the offset of the radius or an error if the function was not bound
fn radius_offset(radius: Option<usize>) -> Result<usize, StrError> {
    radius.ok_or("yield function must be bound to the internal variables first")
}

impl VonMisesYield {
    /// Allocates a new (unbound) instance
    pub fn new() -> Self {
        VonMisesYield {
            radius: None,
            back_stress: None,
        }
    }
}

impl DruckerPragerYield {
    /// Allocates a new (unbound) instance
    pub fn new(eta: f64) -> Result<Self, StrError> {
        if eta < 0.0 {
            return Err("pressure sensitivity eta must be ≥ 0.0");
        }
        Ok(DruckerPragerYield {
            eta,
            radius: None,
            back_stress: None,
        })
    }
}

impl YieldFunction for VonMisesYield {
    const NAME: &'static str = "VonMisesYield";

    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError> {
        self.radius = Some(layout.require(VON_MISES_RADIUS, ValueKind::Scalar)?);
        self.back_stress = layout.optional(BACK_STRESS, ValueKind::Tensor)?;
        Ok(())
    }

    fn value(&self, sigma: &Tensor2, z: &[f64]) -> Result<f64, StrError> {
        let r = z[radius_offset(self.radius)?];
        let xi = relative_deviator(sigma, z, self.back_stress);
        Ok(xi.norm() - SQRT_2_BY_3 * r)
    }

    fn df_dsigma(&self, df_dsigma: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        unit_normal(df_dsigma, &xi)?;
        Ok(())
    }

    fn df_dz(&self, df_dz: &mut [f64], sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let r_offset = radius_offset(self.radius)?;
        df_dz.iter_mut().for_each(|v| *v = 0.0);
        df_dz[r_offset] = -SQRT_2_BY_3;
        if let Some(offset) = self.back_stress {
            let mut n = Tensor2::new();
            let xi = relative_deviator(sigma, z, self.back_stress);
            unit_normal(&mut n, &xi)?;
            for i in 0..MANDEL_DIM {
                df_dz[offset + i] = -n.vector()[i];
            }
        }
        Ok(())
    }
}

impl YieldFunction for DruckerPragerYield {
    const NAME: &'static str = "DruckerPragerYield";

    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError> {
        self.radius = Some(layout.require(VON_MISES_RADIUS, ValueKind::Scalar)?);
        self.back_stress = layout.optional(BACK_STRESS, ValueKind::Tensor)?;
        Ok(())
    }

    fn value(&self, sigma: &Tensor2, z: &[f64]) -> Result<f64, StrError> {
        let r = z[radius_offset(self.radius)?];
        let p = -sigma.invariant_sigma_m();
        let xi = relative_deviator(sigma, z, self.back_stress);
        Ok(xi.norm() - SQRT_2_BY_3 * (r + self.eta * p))
    }

    fn df_dsigma(&self, df_dsigma: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        unit_normal(df_dsigma, &xi)?;
        let c = SQRT_2_BY_3 * self.eta * ONE_BY_3;
        for i in 0..MANDEL_DIM {
            df_dsigma.vector_mut()[i] += c * IDENTITY2[i];
        }
        Ok(())
    }

    fn df_dz(&self, df_dz: &mut [f64], sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let r_offset = radius_offset(self.radius)?;
        df_dz.iter_mut().for_each(|v| *v = 0.0);
        df_dz[r_offset] = -SQRT_2_BY_3;
        if let Some(offset) = self.back_stress {
            let mut n = Tensor2::new();
            let xi = relative_deviator(sigma, z, self.back_stress);
            unit_normal(&mut n, &xi)?;
            for i in 0..MANDEL_DIM {
                df_dz[offset + i] = -n.vector()[i];
            }
        }
        Ok(())
    }

    fn apex_stress(&self, z: &[f64]) -> Result<Option<Tensor2>, StrError> {
        if self.eta <= 0.0 {
            return Ok(None);
        }
        let r = z[radius_offset(self.radius)?];
        let mut apex = match self.back_stress {
            Some(offset) => Tensor2::from_slice(&z[offset..(offset + MANDEL_DIM)]).deviator(),
            None => Tensor2::new(),
        };
        let sigma_m = r / self.eta;
        for i in 0..MANDEL_DIM {
            apex.vector_mut()[i] += sigma_m * IDENTITY2[i];
        }
        Ok(Some(apex))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
