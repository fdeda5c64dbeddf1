use epmat::base::{ParamElasticity, ParamPlasticity, ParamSolid, Settings};
use epmat::material::{allocate_nd_material, NDMaterial};
use epmat::tensor::Tensor2;
use proptest::prelude::*;

// Properties of the material point under random strains
//
// The strategies generate strain components in [-0.01, 0.01], i.e., up to about a hundred times
// the yield strain of the sample materials.

fn param(kinematic: bool) -> ParamSolid {
    let plasticity = if kinematic {
        ParamPlasticity::VonMisesArmstrongFrederick {
            z0: 9.0,
            hh: 100.0,
            ha: 300.0,
            cr: 10.0,
        }
    } else {
        ParamPlasticity::VonMisesVoce {
            z0: 9.0,
            hh: 300.0,
            r_inf: 15.0,
        }
    };
    ParamSolid {
        elasticity: ParamElasticity::LinearIsotropic {
            young: 1500.0,
            poisson: 0.25,
        },
        plasticity,
    }
}

fn material(kinematic: bool) -> Box<dyn NDMaterial> {
    allocate_nd_material(&param(kinematic), &Settings::new()).unwrap()
}

fn strain_strategy() -> impl Strategy<Value = Tensor2> {
    prop::array::uniform6(-0.01f64..0.01).prop_map(|c| Tensor2::from_mandel(&c))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn revert_restores_the_committed_state(
        first in strain_strategy(),
        second in strain_strategy(),
        kinematic in any::<bool>())
    {
        let mut point = material(kinematic);
        point.set_trial_strain(&first).unwrap();
        point.commit_state().unwrap();
        let stress = *point.stress();
        let values = point.internal_values();

        point.set_trial_strain(&second).unwrap();
        point.revert_to_last_commit().unwrap();
        prop_assert_eq!(point.stress(), &stress);
        prop_assert_eq!(point.strain(), &first);
        prop_assert_eq!(point.internal_values(), values.clone());

        // reverting again changes nothing
        point.revert_to_last_commit().unwrap();
        prop_assert_eq!(point.stress(), &stress);
        prop_assert_eq!(point.internal_values(), values);
    }

    #[test]
    fn commit_twice_equals_commit_once(first in strain_strategy(), second in strain_strategy()) {
        let mut once = material(true);
        let mut twice = material(true);
        for point in [&mut once, &mut twice] {
            point.set_trial_strain(&first).unwrap();
            point.commit_state().unwrap();
        }
        twice.commit_state().unwrap();
        prop_assert_eq!(once.stress(), twice.stress());
        prop_assert_eq!(once.internal_values(), twice.internal_values());

        // the next update starts from the same state
        once.set_trial_strain(&second).unwrap();
        twice.set_trial_strain(&second).unwrap();
        prop_assert_eq!(once.stress(), twice.stress());
    }

    #[test]
    fn send_and_recv_are_exact(first in strain_strategy(), second in strain_strategy()) {
        let mut point = material(true);
        point.set_trial_strain(&first).unwrap();
        point.commit_state().unwrap();
        let buffer = point.send_self().unwrap();

        let mut other = material(true);
        other.recv_self(&buffer).unwrap();
        prop_assert_eq!(other.stress(), point.stress());
        prop_assert_eq!(other.strain(), point.strain());
        prop_assert_eq!(other.internal_values(), point.internal_values());

        point.set_trial_strain(&second).unwrap();
        other.set_trial_strain(&second).unwrap();
        prop_assert_eq!(other.stress(), point.stress());
        prop_assert_eq!(other.internal_values(), point.internal_values());
    }

    #[test]
    fn copies_are_independent(first in strain_strategy(), second in strain_strategy()) {
        let mut point = material(true);
        point.set_trial_strain(&first).unwrap();
        point.commit_state().unwrap();
        let copy = point.get_copy();
        let stress = *copy.stress();
        let values = copy.internal_values();

        point.set_trial_strain(&second).unwrap();
        point.commit_state().unwrap();
        prop_assert_eq!(copy.stress(), &stress);
        prop_assert_eq!(copy.internal_values(), values);
        prop_assert_eq!(copy.strain(), &first);
    }

    #[test]
    fn radius_grows_under_monotonic_loading(direction in strain_strategy(), kinematic in any::<bool>()) {
        let norm = direction.norm();
        prop_assume!(direction.deviator_norm() > 0.5 * norm);
        let mut point = material(kinematic);
        let mut radius = point.internal_values()[0];
        for k in 1..7 {
            let strain = direction * (0.004 * (k as f64) / norm);
            point.set_trial_strain(&strain).unwrap();
            point.commit_state().unwrap();
            let value = point.internal_values()[0];
            prop_assert!(value >= radius);
            radius = value;
        }
        prop_assert!(radius > 9.0);
    }

    #[test]
    fn updated_stresses_are_admissible(
        first in strain_strategy(),
        second in strain_strategy(),
        kinematic in any::<bool>())
    {
        let mut point = material(kinematic);
        for strain in [&first, &second] {
            point.set_trial_strain(strain).unwrap();
            prop_assert!(point.yield_value() <= 1e-7);
            if !point.is_elastic() {
                prop_assert!(f64::abs(point.yield_value()) <= 1e-7);
                prop_assert!(point.last_lambda() > 0.0);
            }
            point.commit_state().unwrap();
        }
    }

    #[test]
    fn tiny_strains_are_elastic(direction in strain_strategy(), kinematic in any::<bool>()) {
        let strain = direction * 1e-4;
        let mut point = material(kinematic);
        point.set_trial_strain(&strain).unwrap();
        prop_assert!(point.is_elastic());
        prop_assert_eq!(point.last_lambda(), 0.0);

        // σ = K tr(ε) I + 2 G dev(ε)
        let (kk, gg) = (1000.0, 600.0);
        let mut expected = strain.deviator() * (2.0 * gg);
        for i in 0..3 {
            expected.vector_mut()[i] += kk * strain.trace();
        }
        for i in 0..6 {
            prop_assert!(f64::abs(point.stress().vector()[i] - expected.vector()[i]) <= 1e-12);
        }
    }
}
