use super::{numerical_jacobian, relative_deviator, unit_normal, ValueKind, VariableLayout, BACK_STRESS};
use crate::tensor::{t2_dyad_t2_update, Tensor2, Tensor4, IDENTITY2, MANDEL_DIM, ONE_BY_3, SQRT_2_BY_3};
use crate::StrError;
use nalgebra::DMatrix;
use std::fmt;

/// Defines the direction of the plastic strain rate m(σ, z)
///
/// The direction does not need to be normalized; the integrator carries its scale into the
/// consistency equations.
pub trait FlowDirection: Clone + fmt::Debug + Send + 'static {
    /// Name of the flow rule (used in the configuration identifier)
    const NAME: &'static str;

    /// Resolves the internal variables needed by this flow rule
    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError>;

    /// Calculates the plastic flow direction
    fn direction(&self, m: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError>;

    /// Calculates the derivative of the flow direction w.r.t the stress
    ///
    /// The default implementation uses central differences.
    fn dm_dsigma(&self, dm_dsigma: &mut Tensor4, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let mut jac = DMatrix::zeros(MANDEL_DIM, MANDEL_DIM);
        let mut m = Tensor2::new();
        numerical_jacobian(&mut jac, sigma.as_slice(), |out, x| {
            let s = Tensor2::from_slice(x);
            self.direction(&mut m, &s, z)?;
            out.copy_from_slice(m.as_slice());
            Ok(())
        })?;
        let mat = dm_dsigma.matrix_mut();
        for i in 0..MANDEL_DIM {
            for j in 0..MANDEL_DIM {
                mat[(i, j)] = jac[(i, j)];
            }
        }
        Ok(())
    }

    /// Calculates the derivative of the flow direction w.r.t the (flattened) internal values
    ///
    /// The output matrix is (6 × n_values). The default implementation uses central differences.
    fn dm_dz(&self, dm_dz: &mut DMatrix<f64>, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let mut m = Tensor2::new();
        numerical_jacobian(dm_dz, z, |out, x| {
            self.direction(&mut m, sigma, x)?;
            out.copy_from_slice(m.as_slice());
            Ok(())
        })
    }

    /// Finds the plastic multiplier Δλ and the direction m such that Δλ m = Δεₚ at the apex of the yield surface
    ///
    /// At the apex, m may be any direction of the cone of normals to the plastic potential.
    /// Returns None if Δεₚ is not in this cone (the default).
    fn apex_direction(&self, _m: &mut Tensor2, _deps_p: &Tensor2) -> Result<Option<f64>, StrError> {
        Ok(None)
    }
}

/// Implements the associated von Mises flow rule (unit deviatoric normal)
///
/// ```text
/// m = ξ / ‖ξ‖   with   ξ = dev(σ - α)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct VonMisesFlow {
    back_stress: Option<usize>,
}

/// Implements the Drucker-Prager flow rule (non-associated if eta_g ≠ eta)
///
/// ```text
/// m = ξ / ‖ξ‖ + (√(2/3) η_g / 3) I
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DruckerPragerFlow {
    eta_g: f64,
    back_stress: Option<usize>,
}

/// Calculates d(ξ/‖ξ‖)/dσ = (Psymdev - n ⊗ n) / ‖ξ‖
fn calc_dn_dxi(dn_dxi: &mut Tensor4, n: &Tensor2, norm_xi: f64) {
    *dn_dxi = Tensor4::new_sym_dev();
    t2_dyad_t2_update(dn_dxi, -1.0, n, n);
    let mat = dn_dxi.matrix_mut();
    *mat /= norm_xi;
}

/// Calculates dm/dz for flow rules depending on z through ξ only
fn calc_dm_dz_via_back_stress(
    dm_dz: &mut DMatrix<f64>,
    sigma: &Tensor2,
    z: &[f64],
    back_stress: Option<usize>,
) -> Result<(), StrError> {
    dm_dz.fill(0.0);
    if let Some(offset) = back_stress {
        let xi = relative_deviator(sigma, z, back_stress);
        let mut n = Tensor2::new();
        let norm_xi = unit_normal(&mut n, &xi)?;
        let mut dn_dxi = Tensor4::new();
        calc_dn_dxi(&mut dn_dxi, &n, norm_xi);
        for i in 0..MANDEL_DIM {
            for j in 0..MANDEL_DIM {
                dm_dz[(i, offset + j)] = -dn_dxi.get(i, j);
            }
        }
    }
    Ok(())
}

impl VonMisesFlow {
    /// Allocates a new (unbound) instance
    pub fn new() -> Self {
        VonMisesFlow { back_stress: None }
    }
}

impl DruckerPragerFlow {
    /// Allocates a new (unbound) instance
    pub fn new(eta_g: f64) -> Result<Self, StrError> {
        if eta_g < 0.0 {
            return Err("dilatancy coefficient eta_g must be ≥ 0.0");
        }
        Ok(DruckerPragerFlow {
            eta_g,
            back_stress: None,
        })
    }
}

impl FlowDirection for VonMisesFlow {
    const NAME: &'static str = "VonMisesFlow";

    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError> {
        self.back_stress = layout.optional(BACK_STRESS, ValueKind::Tensor)?;
        Ok(())
    }

    fn direction(&self, m: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        unit_normal(m, &xi)?;
        Ok(())
    }

    fn dm_dsigma(&self, dm_dsigma: &mut Tensor4, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        let mut n = Tensor2::new();
        let norm_xi = unit_normal(&mut n, &xi)?;
        calc_dn_dxi(dm_dsigma, &n, norm_xi);
        Ok(())
    }

    fn dm_dz(&self, dm_dz: &mut DMatrix<f64>, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        calc_dm_dz_via_back_stress(dm_dz, sigma, z, self.back_stress)
    }
}

impl FlowDirection for DruckerPragerFlow {
    const NAME: &'static str = "DruckerPragerFlow";

    fn bind(&mut self, layout: &VariableLayout) -> Result<(), StrError> {
        self.back_stress = layout.optional(BACK_STRESS, ValueKind::Tensor)?;
        Ok(())
    }

    fn direction(&self, m: &mut Tensor2, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        unit_normal(m, &xi)?;
        let c = SQRT_2_BY_3 * self.eta_g * ONE_BY_3;
        for i in 0..MANDEL_DIM {
            m.vector_mut()[i] += c * IDENTITY2[i];
        }
        Ok(())
    }

    fn dm_dsigma(&self, dm_dsigma: &mut Tensor4, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        let xi = relative_deviator(sigma, z, self.back_stress);
        let mut n = Tensor2::new();
        let norm_xi = unit_normal(&mut n, &xi)?;
        calc_dn_dxi(dm_dsigma, &n, norm_xi);
        Ok(())
    }

    fn dm_dz(&self, dm_dz: &mut DMatrix<f64>, sigma: &Tensor2, z: &[f64]) -> Result<(), StrError> {
        calc_dm_dz_via_back_stress(dm_dz, sigma, z, self.back_stress)
    }

    /// Splits Δεₚ into Δλ = tr(Δεₚ) / (√(2/3) η_g) and m = Δεₚ / Δλ, requiring ‖dev(m)‖ ≤ 1
    fn apex_direction(&self, m: &mut Tensor2, deps_p: &Tensor2) -> Result<Option<f64>, StrError> {
        let dilatancy = SQRT_2_BY_3 * self.eta_g;
        if dilatancy <= 0.0 {
            return Ok(None);
        }
        let lambda = deps_p.trace() / dilatancy;
        if !(lambda > 0.0) || deps_p.deviator_norm() > lambda {
            return Ok(None);
        }
        m.set_tensor(1.0 / lambda, deps_p);
        Ok(Some(lambda))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
