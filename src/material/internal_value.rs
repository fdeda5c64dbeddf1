use crate::tensor::{Tensor2, MANDEL_DIM};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the kind of value stored by an internal variable
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum ValueKind {
    /// Single real number (e.g., the size of the yield surface)
    Scalar,

    /// Symmetric second-order tensor (e.g., the back stress)
    Tensor,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Scalar => write!(f, "Scalar"),
            ValueKind::Tensor => write!(f, "Tensor"),
        }
    }
}

/// Defines the value types that internal variables may hold
///
/// The integrator works on the flattened vector of all internal values; thus each value type
/// knows how to read itself from and write itself into a slice of that vector.
pub trait InternalValue: Clone + Copy + fmt::Debug + PartialEq + Send + 'static {
    /// Kind of value
    const KIND: ValueKind;

    /// Number of real components
    const N_COMPONENTS: usize;

    /// Returns the zero value
    fn zero() -> Self;

    /// Reads the value from a slice with N_COMPONENTS entries
    fn read_from(values: &[f64]) -> Self;

    /// Writes the value into a slice with N_COMPONENTS entries
    fn write_into(&self, values: &mut [f64]);
}

impl InternalValue for f64 {
    const KIND: ValueKind = ValueKind::Scalar;
    const N_COMPONENTS: usize = 1;

    fn zero() -> Self {
        0.0
    }

    fn read_from(values: &[f64]) -> Self {
        values[0]
    }

    fn write_into(&self, values: &mut [f64]) {
        values[0] = *self;
    }
}

impl InternalValue for Tensor2 {
    const KIND: ValueKind = ValueKind::Tensor;
    const N_COMPONENTS: usize = MANDEL_DIM;

    fn zero() -> Self {
        Tensor2::new()
    }

    fn read_from(values: &[f64]) -> Self {
        Tensor2::from_slice(values)
    }

    fn write_into(&self, values: &mut [f64]) {
        values[..MANDEL_DIM].copy_from_slice(self.as_slice());
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
