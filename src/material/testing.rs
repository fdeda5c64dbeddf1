use super::{Elasticity, FlowDirection, InternalVariable, InternalVariableSet, LinearHardeningScalar};
use super::{LinearHardeningTensor, LinearIsotropic, ReturnMapping, VonMisesFlow, VonMisesYield, YieldFunction};
use crate::tensor::{Tensor2, Tensor4, MANDEL_DIM};

/// Internal variables of the sample von Mises model: radius and back stress
pub(crate) type SampleVariables = (
    InternalVariable<f64, LinearHardeningScalar>,
    InternalVariable<Tensor2, LinearHardeningTensor>,
);

/// Allocates the building blocks of a von Mises model with linear isotropic and kinematic hardening
///
/// Uses E = 1500 and ν = 0.25. The yield function and flow rule are already bound.
pub(crate) fn sample_von_mises(z0: f64, hh: f64, hk: f64) -> (LinearIsotropic, VonMisesYield, VonMisesFlow, SampleVariables) {
    let ela = LinearIsotropic::new(1500.0, 0.25).unwrap();
    let vars = (
        InternalVariable::von_mises_radius(z0, LinearHardeningScalar::new(hh)),
        InternalVariable::back_stress(LinearHardeningTensor::new(hk)),
    );
    let layout = vars.layout();
    let mut yf = VonMisesYield::new();
    let mut flow = VonMisesFlow::new();
    yf.bind(&layout).unwrap();
    flow.bind(&layout).unwrap();
    (ela, yf, flow, vars)
}

/// Returns a strain increment with all components non-zero
pub(crate) fn sample_strain_increment() -> Tensor2 {
    Tensor2::from_mandel(&[0.004, -0.006, 0.001, 0.005, -0.002, 0.003])
}

/// Compares the tangent returned by the stress update with central differences of the stress
///
/// The comparison is relative: |Dnum - D| ≤ tol max(1, |Dnum|).
pub(crate) fn check_tangent<E, Y, F, S>(
    rm: &ReturnMapping<E, Y, F, S>,
    sigma0: &Tensor2,
    z0: &[f64],
    delta_strain: &Tensor2,
    tol: f64,
) where
    E: Elasticity,
    Y: YieldFunction,
    F: FlowDirection,
    S: InternalVariableSet,
{
    let h = 1e-6;
    let out = rm.integrate(sigma0, z0, delta_strain).unwrap();
    let mut num = Tensor4::new();
    for j in 0..MANDEL_DIM {
        let mut plus = *delta_strain;
        plus.vector_mut()[j] += h;
        let mut minus = *delta_strain;
        minus.vector_mut()[j] -= h;
        let sigma_plus = rm.integrate(sigma0, z0, &plus).unwrap().stress;
        let sigma_minus = rm.integrate(sigma0, z0, &minus).unwrap().stress;
        for i in 0..MANDEL_DIM {
            num.matrix_mut()[(i, j)] = (sigma_plus.vector()[i] - sigma_minus.vector()[i]) / (2.0 * h);
        }
    }
    for i in 0..MANDEL_DIM {
        for j in 0..MANDEL_DIM {
            let (a, b) = (out.tangent.get(i, j), num.get(i, j));
            assert!(
                f64::abs(a - b) <= tol * f64::max(1.0, f64::abs(b)),
                "tangent[{}][{}] = {} differs from the numerical value {}",
                i,
                j,
                a,
                b
            );
        }
    }
}
