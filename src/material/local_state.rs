use super::NDMaterial;
use crate::tensor::Tensor2;
use serde::{Deserialize, Serialize};

/// Holds the state of a material point at the end of a stress update (e.g., for plotting)
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LocalState {
    /// Holds the stress tensor σ
    pub stress: Tensor2,

    /// Holds the strain tensor ε
    pub strain: Tensor2,

    /// Holds the (flattened) internal values z
    pub internal_values: Vec<f64>,

    /// Holds the elastic (vs elastoplastic) flag
    pub elastic: bool,

    /// Holds the cumulative algorithmic plastic multiplier (Δλ) of the last update
    pub algo_lambda: f64,

    /// Holds the yield function value f(σ, z)
    pub yield_value: f64,
}

impl LocalState {
    /// Allocates a new instance with zero stress and strain
    pub fn new(n_internal_values: usize) -> Self {
        LocalState {
            stress: Tensor2::new(),
            strain: Tensor2::new(),
            internal_values: vec![0.0; n_internal_values],
            elastic: true,
            algo_lambda: 0.0,
            yield_value: 0.0,
        }
    }

    /// Copies the current (trial or committed) state of a material point
    pub fn from_material(material: &dyn NDMaterial) -> Self {
        LocalState {
            stress: *material.stress(),
            strain: *material.strain(),
            internal_values: material.internal_values(),
            elastic: material.is_elastic(),
            algo_lambda: material.last_lambda(),
            yield_value: material.yield_value(),
        }
    }

    /// Returns the mean stress invariant σm
    pub fn sigma_m(&self) -> f64 {
        self.stress.invariant_sigma_m()
    }

    /// Returns the deviatoric stress invariant σd (von Mises stress)
    pub fn sigma_d(&self) -> f64 {
        self.stress.invariant_sigma_d()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LocalState;
    use crate::base::{ParamSolid, Settings};
    use crate::material::allocate_nd_material;
    use crate::tensor::Tensor2;

    #[test]
    fn new_works() {
        let state = LocalState::new(7);
        assert_eq!(state.internal_values.len(), 7);
        assert_eq!(state.stress, Tensor2::new());
        assert!(state.elastic);
        assert_eq!(state.sigma_m(), 0.0);
        assert_eq!(state.sigma_d(), 0.0);
    }

    #[test]
    fn from_material_works() {
        let mut material = allocate_nd_material(&ParamSolid::sample_von_mises(), &Settings::new()).unwrap();
        let strain = Tensor2::from_mandel(&[0.001, 0.0, 0.0, 0.0, 0.0, 0.0]);
        material.set_trial_strain(&strain).unwrap();
        let state = LocalState::from_material(material.as_ref());
        assert_eq!(state.strain, strain);
        assert_eq!(state.stress, *material.stress());
        assert_eq!(state.internal_values.len(), 7);
        assert_eq!(state.internal_values[0], 9.0);
        assert!(state.elastic);
        assert_eq!(state.algo_lambda, 0.0);
        assert!(state.yield_value < 0.0);
    }

    #[test]
    fn serialize_works() {
        let mut state = LocalState::new(1);
        state.internal_values[0] = 9.0;
        state.stress = Tensor2::from_mandel(&[1.0, 2.0, 3.0, 0.5, 0.0, -0.5]);
        let json = serde_json::to_string(&state).unwrap();
        let read: LocalState = serde_json::from_str(&json).unwrap();
        assert_eq!(read, state);
    }
}
