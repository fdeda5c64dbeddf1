//! Implements the base structures: settings, parameters, and numerical constants

mod constants;
mod enums;
mod parameters;
mod settings;
pub use crate::base::constants::*;
pub use crate::base::enums::*;
pub use crate::base::parameters::*;
pub use crate::base::settings::*;
