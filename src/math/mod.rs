//! Mathematical utilities: least squares, simplex minimization, normal quantiles.

pub mod nelder_mead;
pub mod normal;
pub mod ols;

pub use nelder_mead::*;
pub use normal::*;
pub use ols::*;
