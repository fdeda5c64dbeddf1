use super::{HardeningLaw, InternalValue, ValueKind};
use crate::tensor::Tensor2;
use std::fmt;

/// Name of the back stress (center of the yield surface in the deviatoric plane)
pub const BACK_STRESS: &str = "BackStress";

/// Name of the size of the von Mises (or Drucker-Prager) yield surface
pub const VON_MISES_RADIUS: &str = "VonMisesRadius";

/// Name of a generic scalar internal variable (e.g., the accumulated plastic strain)
pub const SCALAR_INTERNAL_VARIABLE: &str = "ScalarInternalVariable";

/// Holds an internal (history) variable with committed and trial values and its hardening law
///
/// The trial value is only meaningful between `set_trial` and the next `commit` or revert.
#[derive(Clone, Debug)]
pub struct InternalVariable<V: InternalValue, H: HardeningLaw<V>> {
    /// Label used in diagnostics and in the configuration identifier
    name: &'static str,

    /// Value restored by revert_to_start
    initial: V,

    /// Value accepted by the last commit
    committed: V,

    /// Value computed by the last stress update
    trial: V,

    /// Evolution law
    law: H,
}

/// Defines a back stress variable
pub type BackStress<H> = InternalVariable<Tensor2, H>;

/// Defines a yield surface size variable
pub type VonMisesRadius<H> = InternalVariable<f64, H>;

/// Defines a generic scalar variable
pub type ScalarInternalVariable<H> = InternalVariable<f64, H>;

impl<V: InternalValue, H: HardeningLaw<V>> InternalVariable<V, H> {
    /// Allocates a new instance with an initial value
    pub fn new(name: &'static str, initial: V, law: H) -> Self {
        InternalVariable {
            name,
            initial,
            committed: initial,
            trial: initial,
            law,
        }
    }

    /// Returns the name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the initial value
    pub fn initial_value(&self) -> &V {
        &self.initial
    }

    /// Returns the committed value
    pub fn committed_value(&self) -> &V {
        &self.committed
    }

    /// Returns the trial value
    pub fn trial_value(&self) -> &V {
        &self.trial
    }

    /// Returns the hardening law
    pub fn law(&self) -> &H {
        &self.law
    }

    /// Stores a new trial value (the committed value is not modified)
    pub fn set_trial(&mut self, value: V) {
        self.trial = value;
    }

    /// Accepts the trial value
    pub fn commit(&mut self) {
        self.committed = self.trial;
    }

    /// Discards the trial value
    pub fn revert_to_last_commit(&mut self) {
        self.trial = self.committed;
    }

    /// Resets both copies to the initial value
    pub fn revert_to_start(&mut self) {
        self.committed = self.initial;
        self.trial = self.initial;
    }

    /// Evaluates the hardening rate at the trial value
    pub fn hardening_rate(&self, m: &Tensor2, sigma: &Tensor2) -> V {
        self.law.rate(&self.trial, m, sigma)
    }
}

impl<H: HardeningLaw<Tensor2>> InternalVariable<Tensor2, H> {
    /// Allocates a back stress starting at zero
    pub fn back_stress(law: H) -> Self {
        InternalVariable::new(BACK_STRESS, Tensor2::new(), law)
    }
}

impl<H: HardeningLaw<f64>> InternalVariable<f64, H> {
    /// Allocates the size of the yield surface (von Mises stress units)
    pub fn von_mises_radius(r0: f64, law: H) -> Self {
        InternalVariable::new(VON_MISES_RADIUS, r0, law)
    }

    /// Allocates a generic scalar variable
    pub fn scalar(initial: f64, law: H) -> Self {
        InternalVariable::new(SCALAR_INTERNAL_VARIABLE, initial, law)
    }
}

/// Defines an object-level view of one internal variable working on flattened values
///
/// This trait allows an ordered collection of variables with different value types and hardening
/// laws to be handled uniformly.
pub trait InternalVariableCell: fmt::Debug {
    /// Returns the name
    fn name(&self) -> &'static str;

    /// Returns the name of the hardening law
    fn law_name(&self) -> &'static str;

    /// Returns the kind of value
    fn kind(&self) -> ValueKind;

    /// Returns the number of real components
    fn n_components(&self) -> usize;

    /// Writes the committed value into a slice with n_components entries
    fn read_committed(&self, values: &mut [f64]);

    /// Writes the trial value into a slice with n_components entries
    fn read_trial(&self, values: &mut [f64]);

    /// Sets the trial value from a slice with n_components entries
    fn write_trial(&mut self, values: &[f64]);

    /// Sets both the committed and the trial values from a slice with n_components entries
    fn write_committed(&mut self, values: &[f64]);

    /// Computes the hardening rate at a given (flattened) value
    fn flat_rate(&self, values: &[f64], m: &Tensor2, sigma: &Tensor2, rate: &mut [f64]);

    /// Accepts the trial value
    fn commit(&mut self);

    /// Discards the trial value
    fn revert_to_last_commit(&mut self);

    /// Resets both copies to the initial value
    fn revert_to_start(&mut self);
}

impl<V: InternalValue, H: HardeningLaw<V>> InternalVariableCell for InternalVariable<V, H> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn law_name(&self) -> &'static str {
        H::NAME
    }

    fn kind(&self) -> ValueKind {
        V::KIND
    }

    fn n_components(&self) -> usize {
        V::N_COMPONENTS
    }

    fn read_committed(&self, values: &mut [f64]) {
        self.committed.write_into(values);
    }

    fn read_trial(&self, values: &mut [f64]) {
        self.trial.write_into(values);
    }

    fn write_trial(&mut self, values: &[f64]) {
        self.trial = V::read_from(values);
    }

    fn write_committed(&mut self, values: &[f64]) {
        self.committed = V::read_from(values);
        self.trial = self.committed;
    }

    fn flat_rate(&self, values: &[f64], m: &Tensor2, sigma: &Tensor2, rate: &mut [f64]) {
        let current = V::read_from(values);
        self.law.rate(&current, m, sigma).write_into(rate);
    }

    fn commit(&mut self) {
        InternalVariable::commit(self)
    }

    fn revert_to_last_commit(&mut self) {
        InternalVariable::revert_to_last_commit(self)
    }

    fn revert_to_start(&mut self) {
        InternalVariable::revert_to_start(self)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
