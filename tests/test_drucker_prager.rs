use approx::assert_abs_diff_eq;
use epmat::base::{IntegrationMethod, Settings, TangentType};
use epmat::material::{DruckerPragerFlow, DruckerPragerYield, InternalVariable, LinearHardeningScalar};
use epmat::material::{LinearIsotropic, MaterialPoint, NoHardening};
use epmat::tensor::{Tensor2, SQRT_2_BY_3};
use epmat::StrError;

// Drucker-Prager plasticity with non-associated flow
//
// TEST GOAL
//
// Verifies that the plastic strain increment follows the plastic potential (dilatancy given by
// eta_g instead of eta) and that the consistent tangent is non-symmetric only if the flow is
// non-associated. Also verifies that trial stresses beyond the apex of the cone (hydrostatic
// tension) are mapped to the apex by all integration methods.
//
// CONFIGURATION AND PARAMETERS
//
// * Young: E = 1500, Poisson: ν = 0.25
// * Cohesion-like radius z0 = 9.0 with linear hardening H = 100
// * Friction-like coefficient η = 0.6 and dilatancy-like coefficient η_g = 0.3

const YOUNG: f64 = 1500.0;
const POISSON: f64 = 0.25;
const Z_INI: f64 = 9.0;
const HH: f64 = 100.0;
const ETA: f64 = 0.6;

/// Runs one stress update from zero stress and returns (σ, Δλ, R, symmetric tangent flag)
fn update(eta_g: f64, strain: &Tensor2) -> Result<(Tensor2, f64, f64, bool), StrError> {
    let elasticity = LinearIsotropic::new(YOUNG, POISSON)?;
    let variables = (InternalVariable::von_mises_radius(Z_INI, LinearHardeningScalar::new(HH)),);
    let yield_function = DruckerPragerYield::new(ETA)?;
    let flow = DruckerPragerFlow::new(eta_g)?;
    let mut point = MaterialPoint::new(elasticity, yield_function, flow, variables, &Settings::new())?;
    point.set_trial_strain(strain)?;
    assert!(f64::abs(point.yield_value()) <= 1e-8);
    let symmetric = point.tangent().is_symmetric(1e-6);
    Ok((*point.stress(), point.last_lambda(), point.internal_values()[0], symmetric))
}

#[test]
fn test_drucker_prager_plastic_strain() -> Result<(), StrError> {
    let eta_g = 0.3;
    let strain = Tensor2::from_mandel(&[0.004, -0.006, 0.001, 0.005, -0.002, 0.003]);
    let (sigma, lambda, radius, symmetric) = update(eta_g, &strain)?;
    assert!(lambda > 0.0);
    assert!(!symmetric);

    // elastic strain
    let kk = YOUNG / (3.0 * (1.0 - 2.0 * POISSON));
    let gg = YOUNG / (2.0 * (1.0 + POISSON));
    let mut eps_e = sigma.deviator() * (1.0 / (2.0 * gg));
    for i in 0..3 {
        eps_e.vector_mut()[i] += sigma.invariant_sigma_m() / (3.0 * kk);
    }

    // plastic strain: Δεp = Δλ (n + √(2/3) η_g I / 3)
    let eps_p = strain - eps_e;
    assert_abs_diff_eq!(eps_p.deviator().norm(), lambda, epsilon = 1e-12);
    assert_abs_diff_eq!(eps_p.trace(), lambda * SQRT_2_BY_3 * eta_g, epsilon = 1e-12);

    // yield surface: ‖s‖ = √(2/3) (R + η p)
    let p = -sigma.invariant_sigma_m();
    assert_abs_diff_eq!(sigma.deviator().norm(), SQRT_2_BY_3 * (radius + ETA * p), epsilon = 1e-8);

    // hardening: ΔR = Δλ √(2/3) H ‖m‖
    let norm_m = f64::sqrt(1.0 + (SQRT_2_BY_3 * eta_g).powi(2) / 3.0);
    assert_abs_diff_eq!(radius, Z_INI + lambda * SQRT_2_BY_3 * HH * norm_m, epsilon = 1e-10);
    Ok(())
}

#[test]
fn test_drucker_prager_associated_flow() -> Result<(), StrError> {
    let strain = Tensor2::from_mandel(&[0.004, -0.006, 0.001, 0.005, -0.002, 0.003]);
    let (_, lambda, _, symmetric) = update(ETA, &strain)?;
    assert!(lambda > 0.0);
    assert!(symmetric);
    Ok(())
}

#[test]
fn test_drucker_prager_apex() -> Result<(), StrError> {
    let kk = YOUNG / (3.0 * (1.0 - 2.0 * POISSON));
    let sigma_m_apex = Z_INI / ETA;
    let strains = [
        Tensor2::from_mandel(&[0.01, 0.01, 0.01, 1e-5, 0.0, 0.0]),
        Tensor2::from_mandel(&[0.02, 0.02, 0.02, 1e-5, 0.0, 0.0]),
        Tensor2::from_mandel(&[0.02, 0.02, 0.02, 0.0, 0.0, 0.0]),
    ];
    for method in [
        IntegrationMethod::BackwardEuler,
        IntegrationMethod::ForwardEuler,
        IntegrationMethod::ModifiedEuler,
    ] {
        for tangent in [TangentType::Algorithmic, TangentType::Continuum] {
            let mut settings = Settings::new();
            settings.method = method;
            settings.tangent = tangent;
            for strain in &strains {
                let mut point = MaterialPoint::new(
                    LinearIsotropic::new(YOUNG, POISSON)?,
                    DruckerPragerYield::new(ETA)?,
                    DruckerPragerFlow::new(ETA)?,
                    (InternalVariable::von_mises_radius(Z_INI, NoHardening),),
                    &settings,
                )?;
                point.set_trial_strain(strain)?;
                assert!(!point.is_elastic());

                // σ = (R / η) I
                assert_abs_diff_eq!(point.stress().deviator_norm(), 0.0, epsilon = 1e-10);
                assert_abs_diff_eq!(point.stress().invariant_sigma_m(), sigma_m_apex, epsilon = 1e-10);
                assert!(f64::abs(point.yield_value()) <= 1e-8);

                // volumetric plastic strain: Δλ √(2/3) η = tr(ε) - σm / K
                let lambda = (strain.trace() - sigma_m_apex / kk) / (SQRT_2_BY_3 * ETA);
                assert_abs_diff_eq!(point.last_lambda(), lambda, epsilon = 1e-10);

                // the apex stress does not change with the strain
                assert!(point.tangent().matrix().amax() <= 1e-6);
                point.commit_state()?;

                // further tension stays at the apex
                point.set_trial_strain(&(*strain * 1.5))?;
                assert!(!point.is_elastic());
                assert_abs_diff_eq!(point.stress().deviator_norm(), 0.0, epsilon = 1e-10);
                assert_abs_diff_eq!(point.stress().invariant_sigma_m(), sigma_m_apex, epsilon = 1e-10);

                // compression unloads elastically from the apex
                point.set_trial_strain(&(*strain * 0.5))?;
                assert!(point.is_elastic());
                let expected = sigma_m_apex - kk * 0.5 * strain.trace();
                assert_abs_diff_eq!(point.stress().invariant_sigma_m(), expected, epsilon = 1e-10);
            }
        }
    }
    Ok(())
}

#[test]
fn test_drucker_prager_apex_with_hardening() -> Result<(), StrError> {
    let strain = Tensor2::from_mandel(&[0.02, 0.02, 0.02, 1e-5, 0.0, 0.0]);
    let (sigma, lambda, radius, _) = update(ETA, &strain)?;
    assert!(lambda > 0.0);
    assert!(radius > Z_INI);

    // the apex moves with the radius
    assert_abs_diff_eq!(sigma.deviator_norm(), 0.0, epsilon = 1e-10);
    assert_abs_diff_eq!(sigma.invariant_sigma_m(), radius / ETA, epsilon = 1e-8);
    Ok(())
}
