//! Generic elastoplastic constitutive integration engine for 3D continuum material points
//!
//! A material point composes an elasticity law, a yield function, a plastic flow direction and an
//! ordered set of hardening internal variables into one stress-point solver. Given the total strain
//! at a Gauss point, the solver returns the updated stress, the updated internal variables and the
//! consistent tangent stiffness; the enclosing finite element code then commits or reverts the trial.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod material;
pub mod tensor;
