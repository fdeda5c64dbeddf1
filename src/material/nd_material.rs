use super::{ArmstrongFrederick, DruckerPragerFlow, DruckerPragerYield, Elasticity, FlowDirection, InternalVariable};
use super::{InternalVariableSet, LinearHardeningScalar, LinearHardeningTensor, LinearIsotropic, MaterialPoint};
use super::{PressureDependentIsotropic, VoceHardeningScalar, VonMisesFlow, VonMisesYield, YieldFunction};
use crate::base::{ParamElasticity, ParamPlasticity, ParamSolid, Settings};
use crate::tensor::{Tensor2, Tensor4};
use crate::StrError;

/// Specifies the essential functions of a material point as seen by an element or a section
///
/// This trait is object-safe; thus, material points with different capabilities may be stored
/// together as `Box<dyn NDMaterial>`.
pub trait NDMaterial: Send {
    /// Returns the configuration identifier
    fn config_id(&self) -> &str;

    /// Returns the number of internal values
    fn n_internal_values(&self) -> usize;

    /// Computes the trial state corresponding to the given total strain
    fn set_trial_strain(&mut self, strain: &Tensor2) -> Result<(), StrError>;

    /// Returns the stress (trial, or committed if no trial is pending)
    fn stress(&self) -> &Tensor2;

    /// Returns the strain (trial, or committed if no trial is pending)
    fn strain(&self) -> &Tensor2;

    /// Returns the tangent modulus (trial, or committed if no trial is pending)
    fn tangent(&self) -> &Tensor4;

    /// Returns the (flattened) trial internal values
    fn internal_values(&self) -> Vec<f64>;

    /// Returns the cumulative plastic multiplier of the last stress update
    fn last_lambda(&self) -> f64;

    /// Returns the yield function value at the current state
    fn yield_value(&self) -> f64;

    /// Indicates that the last stress update was elastic
    fn is_elastic(&self) -> bool;

    /// Accepts the trial state
    fn commit_state(&mut self) -> Result<(), StrError>;

    /// Discards the trial state
    fn revert_to_last_commit(&mut self) -> Result<(), StrError>;

    /// Resets the material point to its initial state
    fn revert_to_start(&mut self) -> Result<(), StrError>;

    /// Sets the initial (committed) stress
    fn initialize_stress(&mut self, stress: &Tensor2) -> Result<(), StrError>;

    /// Returns an independent copy
    fn get_copy(&self) -> Box<dyn NDMaterial>;

    /// Serializes the committed state
    fn send_self(&self) -> Result<Vec<u8>, StrError>;

    /// Restores the committed state from a buffer generated by `send_self`
    fn recv_self(&mut self, buffer: &[u8]) -> Result<(), StrError>;
}

impl<E, Y, F, S> NDMaterial for MaterialPoint<E, Y, F, S>
where
    E: Elasticity,
    Y: YieldFunction,
    F: FlowDirection,
    S: InternalVariableSet,
{
    fn config_id(&self) -> &str {
        MaterialPoint::config_id(self)
    }

    fn n_internal_values(&self) -> usize {
        MaterialPoint::n_internal_values(self)
    }

    fn set_trial_strain(&mut self, strain: &Tensor2) -> Result<(), StrError> {
        MaterialPoint::set_trial_strain(self, strain)
    }

    fn stress(&self) -> &Tensor2 {
        MaterialPoint::stress(self)
    }

    fn strain(&self) -> &Tensor2 {
        MaterialPoint::strain(self)
    }

    fn tangent(&self) -> &Tensor4 {
        MaterialPoint::tangent(self)
    }

    fn internal_values(&self) -> Vec<f64> {
        MaterialPoint::internal_values(self)
    }

    fn last_lambda(&self) -> f64 {
        MaterialPoint::last_lambda(self)
    }

    fn yield_value(&self) -> f64 {
        MaterialPoint::yield_value(self)
    }

    fn is_elastic(&self) -> bool {
        MaterialPoint::is_elastic(self)
    }

    fn commit_state(&mut self) -> Result<(), StrError> {
        MaterialPoint::commit_state(self)
    }

    fn revert_to_last_commit(&mut self) -> Result<(), StrError> {
        MaterialPoint::revert_to_last_commit(self)
    }

    fn revert_to_start(&mut self) -> Result<(), StrError> {
        MaterialPoint::revert_to_start(self)
    }

    fn initialize_stress(&mut self, stress: &Tensor2) -> Result<(), StrError> {
        MaterialPoint::initialize_stress(self, stress)
    }

    fn get_copy(&self) -> Box<dyn NDMaterial> {
        Box::new(MaterialPoint::get_copy(self))
    }

    fn send_self(&self) -> Result<Vec<u8>, StrError> {
        MaterialPoint::send_self(self)
    }

    fn recv_self(&mut self, buffer: &[u8]) -> Result<(), StrError> {
        MaterialPoint::recv_self(self, buffer)
    }
}

/// Allocates a material point with one of the available combinations of capabilities
pub fn allocate_nd_material(param: &ParamSolid, settings: &Settings) -> Result<Box<dyn NDMaterial>, StrError> {
    match param.elasticity {
        ParamElasticity::LinearIsotropic { young, poisson } => {
            let elasticity = LinearIsotropic::new(young, poisson)?;
            allocate_with_elasticity(elasticity, &param.plasticity, settings)
        }
        ParamElasticity::PressureDependent {
            e_ref,
            p_ref,
            n,
            poisson,
            p_min,
        } => {
            let elasticity = PressureDependentIsotropic::new(e_ref, p_ref, n, poisson, p_min)?;
            allocate_with_elasticity(elasticity, &param.plasticity, settings)
        }
    }
}

/// Allocates the plasticity part of the material point
fn allocate_with_elasticity<E: Elasticity>(
    elasticity: E,
    plasticity: &ParamPlasticity,
    settings: &Settings,
) -> Result<Box<dyn NDMaterial>, StrError> {
    let material: Box<dyn NDMaterial> = match *plasticity {
        // von Mises with linear isotropic and kinematic hardening
        ParamPlasticity::VonMises { z0, hh, hk } => {
            let variables = (
                InternalVariable::von_mises_radius(z0, LinearHardeningScalar::new(hh)),
                InternalVariable::back_stress(LinearHardeningTensor::new(hk)),
            );
            Box::new(MaterialPoint::new(
                elasticity,
                VonMisesYield::new(),
                VonMisesFlow::new(),
                variables,
                settings,
            )?)
        }

        // von Mises with saturating isotropic hardening
        ParamPlasticity::VonMisesVoce { z0, hh, r_inf } => {
            let variables = (InternalVariable::von_mises_radius(
                z0,
                VoceHardeningScalar::new(hh, r_inf)?,
            ),);
            Box::new(MaterialPoint::new(
                elasticity,
                VonMisesYield::new(),
                VonMisesFlow::new(),
                variables,
                settings,
            )?)
        }

        // von Mises with linear isotropic and Armstrong-Frederick kinematic hardening
        ParamPlasticity::VonMisesArmstrongFrederick { z0, hh, ha, cr } => {
            let variables = (
                InternalVariable::von_mises_radius(z0, LinearHardeningScalar::new(hh)),
                InternalVariable::back_stress(ArmstrongFrederick::new(ha, cr)?),
            );
            Box::new(MaterialPoint::new(
                elasticity,
                VonMisesYield::new(),
                VonMisesFlow::new(),
                variables,
                settings,
            )?)
        }

        // Drucker-Prager with linear isotropic hardening
        ParamPlasticity::DruckerPrager { z0, eta, eta_g, hh } => {
            let variables = (InternalVariable::von_mises_radius(z0, LinearHardeningScalar::new(hh)),);
            Box::new(MaterialPoint::new(
                elasticity,
                DruckerPragerYield::new(eta)?,
                DruckerPragerFlow::new(eta_g)?,
                variables,
                settings,
            )?)
        }
    };
    Ok(material)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{allocate_nd_material, NDMaterial};
    use crate::base::{ParamElasticity, ParamPlasticity, ParamSolid, Settings};
    use crate::tensor::Tensor2;

    fn all_params() -> Vec<ParamSolid> {
        let elasticity = ParamElasticity::LinearIsotropic {
            young: 1500.0,
            poisson: 0.25,
        };
        vec![
            ParamSolid::sample_von_mises(),
            ParamSolid {
                elasticity,
                plasticity: ParamPlasticity::VonMisesVoce {
                    z0: 9.0,
                    hh: 50.0,
                    r_inf: 15.0,
                },
            },
            ParamSolid {
                elasticity,
                plasticity: ParamPlasticity::VonMisesArmstrongFrederick {
                    z0: 9.0,
                    hh: 100.0,
                    ha: 300.0,
                    cr: 10.0,
                },
            },
            ParamSolid::sample_drucker_prager(),
            ParamSolid {
                elasticity: ParamElasticity::PressureDependent {
                    e_ref: 1500.0,
                    p_ref: 100.0,
                    n: 0.5,
                    poisson: 0.25,
                    p_min: 1.0,
                },
                plasticity: ParamPlasticity::VonMises {
                    z0: 9.0,
                    hh: 800.0,
                    hk: 0.0,
                },
            },
        ]
    }

    #[test]
    fn allocate_nd_material_captures_errors() {
        let mut param = ParamSolid::sample_von_mises();
        param.elasticity = ParamElasticity::LinearIsotropic {
            young: -1.0,
            poisson: 0.25,
        };
        assert_eq!(
            allocate_nd_material(&param, &Settings::new()).err(),
            Some("Young's modulus must be > 0.0")
        );
        let mut param = ParamSolid::sample_drucker_prager();
        param.plasticity = ParamPlasticity::DruckerPrager {
            z0: 9.0,
            eta: -0.1,
            eta_g: 0.0,
            hh: 0.0,
        };
        assert_eq!(
            allocate_nd_material(&param, &Settings::new()).err(),
            Some("pressure sensitivity eta must be ≥ 0.0")
        );
        let mut settings = Settings::new();
        settings.yf_tol = 0.0;
        assert_eq!(
            allocate_nd_material(&ParamSolid::sample_von_mises(), &settings).err(),
            Some("cannot allocate material point because settings.validate() failed")
        );
    }

    #[test]
    fn allocate_nd_material_works() {
        let n_values = [7, 1, 7, 1, 7];
        let prefixes = [
            "LinearIsotropic|VonMisesYield|VonMisesFlow|",
            "LinearIsotropic|VonMisesYield|VonMisesFlow|",
            "LinearIsotropic|VonMisesYield|VonMisesFlow|",
            "LinearIsotropic|DruckerPragerYield|DruckerPragerFlow|",
            "PressureDependentIsotropic|VonMisesYield|VonMisesFlow|",
        ];
        for (i, param) in all_params().iter().enumerate() {
            let material = allocate_nd_material(param, &Settings::new()).unwrap();
            assert_eq!(material.n_internal_values(), n_values[i]);
            assert!(material.config_id().starts_with(prefixes[i]));
            assert_eq!(material.internal_values()[0], 9.0);
        }
    }

    #[test]
    fn trait_objects_work() {
        let strain = Tensor2::from_mandel(&[0.004, -0.006, 0.001, 0.005, -0.002, 0.003]);
        let mut materials: Vec<Box<dyn NDMaterial>> = all_params()
            .iter()
            .map(|p| allocate_nd_material(p, &Settings::new()).unwrap())
            .collect();
        for (i, material) in materials.iter_mut().enumerate() {
            // the pressure-dependent modulus needs some confinement to yield
            let p0 = if i == 4 { 100.0 } else { 0.0 };
            material.initialize_stress(&Tensor2::from_mandel(&[-p0, -p0, -p0, 0.0, 0.0, 0.0])).unwrap();
            material.set_trial_strain(&strain).unwrap();
            assert!(!material.is_elastic());
            assert!(material.last_lambda() > 0.0);
            assert!(f64::abs(material.yield_value()) <= 1e-8);
            assert!(material.tangent().is_finite());
            material.commit_state().unwrap();

            // copy
            let mut copy = material.get_copy();
            assert_eq!(copy.stress(), material.stress());
            copy.set_trial_strain(&(strain * 2.0)).unwrap();
            assert_eq!(*material.strain(), strain);

            // serialization
            let buffer = material.send_self().unwrap();
            copy.revert_to_start().unwrap();
            copy.recv_self(&buffer).unwrap();
            assert_eq!(copy.stress(), material.stress());
            assert_eq!(copy.internal_values(), material.internal_values());

            // revert
            material.set_trial_strain(&(strain * 1.5)).unwrap();
            material.revert_to_last_commit().unwrap();
            assert_eq!(*material.strain(), strain);
        }
    }
}
