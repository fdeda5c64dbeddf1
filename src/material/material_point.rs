use super::{Elasticity, FlowDirection, InternalVariableSet, ReturnMapping, YieldFunction};
use crate::base::Settings;
use crate::tensor::{Tensor2, Tensor4};
use crate::StrError;
use log::error;
use serde::{Deserialize, Serialize};

/// Holds the stress-strain data of a material point (either committed or trial)
#[derive(Clone, Debug, PartialEq)]
struct PointState {
    stress: Tensor2,
    strain: Tensor2,
    tangent: Tensor4,
    lambda: f64,
    elastic: bool,
    yield_value: f64,
}

/// Holds the committed state in the format used by send_self and recv_self
#[derive(Clone, Debug, Deserialize, Serialize)]
struct StateRecord {
    config_id: String,
    strain: Tensor2,
    stress: Tensor2,
    internal_values: Vec<f64>,
}

/// Implements an elastoplastic material point
///
/// The material point owns its capabilities (elasticity, yield function, flow rule) and its
/// internal variables; thus, distinct points may be updated concurrently. The lifecycle is:
///
/// ```text
/// Committed → set_trial_strain → Trial → commit_state → Committed
///                                Trial → revert_to_last_commit → Committed
/// ```
///
/// The strain given to `set_trial_strain` is the total strain; the increment is computed
/// against the committed strain. Thus, calling `set_trial_strain` twice recomputes the trial
/// state from the same committed state.
#[derive(Clone, Debug)]
pub struct MaterialPoint<E, Y, F, S> {
    elasticity: E,
    yield_function: Y,
    flow: F,
    variables: S,
    settings: Settings,
    config_id: String,
    n_values: usize,
    initial_stress: Tensor2,
    committed: PointState,
    trial: PointState,
    trial_pending: bool,
    n_substeps: usize,
}

impl<E, Y, F, S> MaterialPoint<E, Y, F, S>
where
    E: Elasticity,
    Y: YieldFunction,
    F: FlowDirection,
    S: InternalVariableSet,
{
    /// Allocates a new instance
    ///
    /// The yield function and the flow rule are bound to the layout of the internal variables.
    /// Returns an error if a required variable is missing or has an incompatible value type.
    pub fn new(elasticity: E, yield_function: Y, flow: F, variables: S, settings: &Settings) -> Result<Self, StrError> {
        if let Some(msg) = settings.validate() {
            error!("{}", msg);
            return Err("cannot allocate material point because settings.validate() failed");
        }
        let (mut yield_function, mut flow) = (yield_function, flow);
        let layout = variables.layout();
        layout.validate()?;
        yield_function.bind(&layout)?;
        flow.bind(&layout)?;
        let config_id = format!("{}|{}|{}|{}", E::NAME, Y::NAME, F::NAME, layout.signature());
        let n_values = layout.n_values();
        let mut point = MaterialPoint {
            elasticity,
            yield_function,
            flow,
            variables,
            settings: *settings,
            config_id,
            n_values,
            initial_stress: Tensor2::new(),
            committed: PointState {
                stress: Tensor2::new(),
                strain: Tensor2::new(),
                tangent: Tensor4::new(),
                lambda: 0.0,
                elastic: true,
                yield_value: 0.0,
            },
            trial: PointState {
                stress: Tensor2::new(),
                strain: Tensor2::new(),
                tangent: Tensor4::new(),
                lambda: 0.0,
                elastic: true,
                yield_value: 0.0,
            },
            trial_pending: false,
            n_substeps: 0,
        };
        point.committed = point.elastic_state(&Tensor2::new(), &Tensor2::new())?;
        point.trial = point.committed.clone();
        Ok(point)
    }

    /// Returns an elastic state at the given stress using the committed internal values
    fn elastic_state(&self, stress: &Tensor2, strain: &Tensor2) -> Result<PointState, StrError> {
        let mut z = vec![0.0; self.n_values];
        self.variables.read_committed(&mut z);
        let mut tangent = Tensor4::new();
        self.elasticity.modulus(&mut tangent, stress)?;
        let yield_value = self.yield_function.value(stress, &z)?;
        Ok(PointState {
            stress: *stress,
            strain: *strain,
            tangent,
            lambda: 0.0,
            elastic: true,
            yield_value,
        })
    }

    /// Computes the trial state corresponding to the given total strain
    ///
    /// On failure, the committed state and the previous trial state are left untouched.
    pub fn set_trial_strain(&mut self, strain: &Tensor2) -> Result<(), StrError> {
        if !strain.is_finite() {
            return Err("strain tensor is not finite");
        }
        let delta_strain = *strain - self.committed.strain;
        let mut z0 = vec![0.0; self.n_values];
        self.variables.read_committed(&mut z0);
        let rm = ReturnMapping::new(
            &self.elasticity,
            &self.yield_function,
            &self.flow,
            &self.variables,
            &self.settings,
        );
        let out = rm.integrate(&self.committed.stress, &z0, &delta_strain)?;
        self.variables.write_trial(&out.internal_values);
        self.trial = PointState {
            stress: out.stress,
            strain: *strain,
            tangent: out.tangent,
            lambda: out.lambda,
            elastic: out.elastic,
            yield_value: out.yield_value,
        };
        self.trial_pending = true;
        self.n_substeps = out.n_substeps;
        Ok(())
    }

    /// Accepts the trial state
    pub fn commit_state(&mut self) -> Result<(), StrError> {
        self.variables.commit();
        self.committed = self.trial.clone();
        self.trial_pending = false;
        Ok(())
    }

    /// Discards the trial state
    pub fn revert_to_last_commit(&mut self) -> Result<(), StrError> {
        self.variables.revert_to_last_commit();
        self.trial = self.committed.clone();
        self.trial_pending = false;
        Ok(())
    }

    /// Resets the material point to its initial state
    ///
    /// The stress is reset to the one given to `initialize_stress` (zero by default).
    pub fn revert_to_start(&mut self) -> Result<(), StrError> {
        self.variables.revert_to_start();
        self.committed = self.elastic_state(&self.initial_stress, &Tensor2::new())?;
        self.trial = self.committed.clone();
        self.trial_pending = false;
        self.n_substeps = 0;
        Ok(())
    }

    /// Sets the initial (committed) stress
    ///
    /// Returns an error if the stress is outside the yield surface, unless `allow_initial_drift` is set.
    pub fn initialize_stress(&mut self, stress: &Tensor2) -> Result<(), StrError> {
        if !stress.is_finite() {
            return Err("initial stress is not finite");
        }
        let state = self.elastic_state(stress, &self.committed.strain)?;
        if state.yield_value > self.settings.yf_tol && !self.settings.allow_initial_drift {
            return Err("initial stress is outside the yield surface");
        }
        self.variables.revert_to_last_commit();
        self.initial_stress = *stress;
        self.committed = state;
        self.trial = self.committed.clone();
        self.trial_pending = false;
        Ok(())
    }

    /// Returns an independent copy (deep copy) of this material point
    pub fn get_copy(&self) -> Self {
        self.clone()
    }

    /// Serializes the committed state
    pub fn send_self(&self) -> Result<Vec<u8>, StrError> {
        let mut internal_values = vec![0.0; self.n_values];
        self.variables.read_committed(&mut internal_values);
        let record = StateRecord {
            config_id: self.config_id.clone(),
            strain: self.committed.strain,
            stress: self.committed.stress,
            internal_values,
        };
        serde_json::to_vec(&record).map_err(|_| "cannot serialize the material state")
    }

    /// Restores the committed state from a buffer generated by `send_self`
    ///
    /// The buffer must come from a material point with the same configuration. Any trial state
    /// is discarded and the tangent is set to the elastic modulus at the restored stress.
    pub fn recv_self(&mut self, buffer: &[u8]) -> Result<(), StrError> {
        let record: StateRecord =
            serde_json::from_slice(buffer).map_err(|_| "cannot deserialize the material state")?;
        if record.config_id != self.config_id {
            return Err("serialized state comes from a material point with a different configuration");
        }
        if record.internal_values.len() != self.n_values {
            return Err("number of serialized internal values is incorrect");
        }
        let mut tangent = Tensor4::new();
        self.elasticity.modulus(&mut tangent, &record.stress)?;
        let yield_value = self.yield_function.value(&record.stress, &record.internal_values)?;
        self.variables.write_committed(&record.internal_values);
        self.committed = PointState {
            stress: record.stress,
            strain: record.strain,
            tangent,
            lambda: 0.0,
            elastic: true,
            yield_value,
        };
        self.trial = self.committed.clone();
        self.trial_pending = false;
        Ok(())
    }

    /// Returns the stress (trial, or committed if no trial is pending)
    pub fn stress(&self) -> &Tensor2 {
        &self.trial.stress
    }

    /// Returns the strain (trial, or committed if no trial is pending)
    pub fn strain(&self) -> &Tensor2 {
        &self.trial.strain
    }

    /// Returns the tangent modulus (trial, or committed if no trial is pending)
    pub fn tangent(&self) -> &Tensor4 {
        &self.trial.tangent
    }

    /// Returns the committed stress
    pub fn committed_stress(&self) -> &Tensor2 {
        &self.committed.stress
    }

    /// Returns the committed strain
    pub fn committed_strain(&self) -> &Tensor2 {
        &self.committed.strain
    }

    /// Returns the internal variables
    pub fn variables(&self) -> &S {
        &self.variables
    }

    /// Returns the (flattened) trial internal values
    pub fn internal_values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.n_values];
        self.variables.read_trial(&mut values);
        values
    }

    /// Returns the number of internal values
    pub fn n_internal_values(&self) -> usize {
        self.n_values
    }

    /// Returns the cumulative plastic multiplier of the last stress update
    pub fn last_lambda(&self) -> f64 {
        self.trial.lambda
    }

    /// Returns the yield function value at the current state
    pub fn yield_value(&self) -> f64 {
        self.trial.yield_value
    }

    /// Indicates that the last stress update was elastic
    pub fn is_elastic(&self) -> bool {
        self.trial.elastic
    }

    /// Indicates that a trial state is pending
    pub fn is_trial(&self) -> bool {
        self.trial_pending
    }

    /// Returns the number of sub-increments of the last stress update
    pub fn n_substeps(&self) -> usize {
        self.n_substeps
    }

    /// Returns the configuration identifier
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// Returns the settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
