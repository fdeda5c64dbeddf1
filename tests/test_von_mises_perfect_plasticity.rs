use approx::assert_abs_diff_eq;
use epmat::base::{IntegrationMethod, ParamElasticity, ParamPlasticity, ParamSolid, Settings};
use epmat::material::allocate_nd_material;
use epmat::tensor::{Tensor2, SQRT_2_BY_3};
use epmat::StrError;

// von Mises perfect plasticity
//
// TEST GOAL
//
// Verifies that a strain increment keeping the predictor inside the yield surface returns the
// elastic predictor and that a larger increment returns a stress on the (unchanged) yield surface.
//
// CONFIGURATION AND PARAMETERS
//
// * Young: E = 1500, Poisson: ν = 0.25 (G = 600, K = 1000)
// * Initial radius: r0 = 9.0 without hardening
// * The strain has volumetric and deviatoric parts

const R0: f64 = 9.0;
const GG: f64 = 600.0;
const KK: f64 = 1000.0;

#[test]
fn test_von_mises_perfect_plasticity() -> Result<(), StrError> {
    let param = ParamSolid {
        elasticity: ParamElasticity::LinearIsotropic {
            young: 1500.0,
            poisson: 0.25,
        },
        plasticity: ParamPlasticity::VonMises {
            z0: R0,
            hh: 0.0,
            hk: 0.0,
        },
    };

    // unit deviatoric direction plus a volumetric part
    let direction = Tensor2::from_mandel(&[1.0, -0.5, -0.5, 0.3, 0.0, -0.2]);
    let unit = direction.deviator() * (1.0 / direction.deviator_norm());
    let volumetric = Tensor2::from_mandel(&[1e-4, 1e-4, 1e-4, 0.0, 0.0, 0.0]);

    // the deviatoric strain reaching the yield surface
    let eps_yield = SQRT_2_BY_3 * R0 / (2.0 * GG);

    for method in [
        IntegrationMethod::BackwardEuler,
        IntegrationMethod::ForwardEuler,
        IntegrationMethod::ModifiedEuler,
    ] {
        let mut settings = Settings::new();
        settings.method = method;
        let mut material = allocate_nd_material(&param, &settings)?;

        // elastic
        let strain = volumetric + unit * (0.9 * eps_yield);
        material.set_trial_strain(&strain)?;
        assert!(material.is_elastic());
        let expected = unit * (2.0 * GG * 0.9 * eps_yield);
        for i in 0..6 {
            assert_abs_diff_eq!(material.stress().deviator().vector()[i], expected.vector()[i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(material.stress().invariant_sigma_m(), 3e-4 * KK, epsilon = 1e-12);
        assert_eq!(material.internal_values()[0], R0);

        // elastoplastic
        let strain = volumetric + unit * (3.0 * eps_yield);
        material.set_trial_strain(&strain)?;
        assert!(!material.is_elastic());
        assert_abs_diff_eq!(material.stress().deviator_norm(), SQRT_2_BY_3 * R0, epsilon = 1e-8);
        assert_abs_diff_eq!(material.stress().invariant_sigma_m(), 3e-4 * KK, epsilon = 1e-10);
        assert_abs_diff_eq!(material.internal_values()[0], R0, epsilon = 1e-14);

        // the plastic deviatoric strain takes the excess
        assert_abs_diff_eq!(material.last_lambda(), 2.0 * eps_yield, epsilon = 1e-10);
        material.commit_state()?;
    }
    Ok(())
}
