//! Implements symmetric second-order and fourth-order tensors in Mandel representation

mod constants;
mod operations;
mod tensor2;
mod tensor4;
pub use crate::tensor::constants::*;
pub use crate::tensor::operations::*;
pub use crate::tensor::tensor2::*;
pub use crate::tensor::tensor4::*;
