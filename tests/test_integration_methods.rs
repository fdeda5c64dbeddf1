use approx::assert_abs_diff_eq;
use epmat::base::{IntegrationMethod, ParamElasticity, ParamPlasticity, ParamSolid, Settings, TangentType};
use epmat::material::{allocate_nd_material, LocalState, NDMaterial, StrainPath};
use epmat::tensor::Tensor2;
use epmat::StrError;

// Comparison of the integration methods
//
// TEST GOAL
//
// Verifies that BackwardEuler, ForwardEuler, and ModifiedEuler give the same response (within the
// accuracy of each method) along a non-proportional strain path and that all converged states
// lie on the yield surface.
//
// CONFIGURATION AND PARAMETERS
//
// * Young: E = 1500, Poisson: ν = 0.25
// * von Mises with linear isotropic hardening (H = 100) and Armstrong-Frederick kinematic
//   hardening (hₐ = 300, cᵣ = 10)
// * The path consists of a shear loading followed by a tension loading

const N_STEPS: usize = 10;

fn param() -> ParamSolid {
    ParamSolid {
        elasticity: ParamElasticity::LinearIsotropic {
            young: 1500.0,
            poisson: 0.25,
        },
        plasticity: ParamPlasticity::VonMisesArmstrongFrederick {
            z0: 9.0,
            hh: 100.0,
            ha: 300.0,
            cr: 10.0,
        },
    }
}

fn path() -> StrainPath {
    let mut path = StrainPath::new();
    for i in 0..N_STEPS {
        let t = (i + 1) as f64 / (N_STEPS as f64);
        path.push_voigt(&[0.0, 0.0, 0.0, 0.02 * t, 0.0, 0.0]);
    }
    for i in 0..N_STEPS {
        let t = (i + 1) as f64 / (N_STEPS as f64);
        path.push_voigt(&[0.01 * t, -0.005 * t, -0.005 * t, 0.02, 0.0, 0.0]);
    }
    path
}

fn run(method: IntegrationMethod) -> Result<Vec<LocalState>, StrError> {
    let mut settings = Settings::new();
    settings.method = method;
    settings.max_strain_increment = Some(2e-4);
    settings.max_substeps = 256;
    let mut material = allocate_nd_material(&param(), &settings)?;
    path().follow(material.as_mut())
}

#[test]
fn test_integration_methods_agree() -> Result<(), StrError> {
    let reference = run(IntegrationMethod::BackwardEuler)?;
    assert_eq!(reference.len(), 2 * N_STEPS + 1);
    for method in [IntegrationMethod::ForwardEuler, IntegrationMethod::ModifiedEuler] {
        let history = run(method)?;
        for (state, correct) in history.iter().zip(reference.iter()) {
            if state.elastic {
                assert!(state.yield_value <= 1e-8);
            } else {
                assert!(f64::abs(state.yield_value) <= 1e-8);
            }
            assert_eq!(state.elastic, correct.elastic);
            for i in 0..6 {
                assert_abs_diff_eq!(state.stress.vector()[i], correct.stress.vector()[i], epsilon = 0.1);
            }
            assert_abs_diff_eq!(state.internal_values[0], correct.internal_values[0], epsilon = 0.1);
        }
    }
    Ok(())
}

/// Compares the tangent of a material point with central differences of the stress update
fn check_tangent(material: &mut dyn NDMaterial, strain: &Tensor2, tol: f64) -> Result<(), StrError> {
    let h = 1e-6;
    material.set_trial_strain(strain)?;
    let tangent = *material.tangent();
    let scale = tangent.matrix().amax();
    for j in 0..6 {
        let mut plus = *strain;
        plus.vector_mut()[j] += h;
        material.set_trial_strain(&plus)?;
        let sigma_plus = *material.stress();
        let mut minus = *strain;
        minus.vector_mut()[j] -= h;
        material.set_trial_strain(&minus)?;
        let sigma_minus = *material.stress();
        for i in 0..6 {
            let num = (sigma_plus.vector()[i] - sigma_minus.vector()[i]) / (2.0 * h);
            let ana = tangent.get(i, j);
            assert!(
                f64::abs(num - ana) <= tol * scale,
                "D[{}][{}]: numerical = {}, tangent = {}",
                i,
                j,
                num,
                ana
            );
        }
    }
    material.revert_to_last_commit()
}

#[test]
fn test_integration_methods_tangent() -> Result<(), StrError> {
    let strain = Tensor2::from_mandel(&[0.004, -0.006, 0.001, 0.005, -0.002, 0.003]);
    for method in [IntegrationMethod::BackwardEuler, IntegrationMethod::ForwardEuler] {
        for n_substeps in [1, 4] {
            let mut settings = Settings::new();
            settings.method = method;
            settings.tangent = TangentType::Algorithmic;
            settings.max_strain_increment = Some(strain.norm() / (n_substeps as f64 - 0.5));
            let mut material = allocate_nd_material(&param(), &settings)?;
            check_tangent(material.as_mut(), &strain, 1e-3)?;

            // after a committed plastic step
            material.set_trial_strain(&(strain * 0.5))?;
            material.commit_state()?;
            check_tangent(material.as_mut(), &strain, 1e-3)?;
        }
    }
    Ok(())
}
