//! Implements the elastoplastic material point and its building blocks

mod derivatives;
mod elasticity;
mod explicit_update;
mod flow_direction;
mod hardening;
mod internal_value;
mod internal_variable;
mod internal_variable_set;
mod local_state;
mod material_point;
mod nd_material;
mod return_mapping;
mod strain_path;
mod yield_function;
pub use crate::material::derivatives::*;
pub use crate::material::elasticity::*;
pub use crate::material::explicit_update::*;
pub use crate::material::flow_direction::*;
pub use crate::material::hardening::*;
pub use crate::material::internal_value::*;
pub use crate::material::internal_variable::*;
pub use crate::material::internal_variable_set::*;
pub use crate::material::local_state::*;
pub use crate::material::material_point::*;
pub use crate::material::nd_material::*;
pub use crate::material::return_mapping::*;
pub use crate::material::strain_path::*;
pub use crate::material::yield_function::*;

#[cfg(test)]
pub(crate) mod testing;
