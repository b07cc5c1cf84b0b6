//! Model calibration.
//!
//! Responsibilities:
//!
//! - seed the coefficients with Hannan–Rissanen regressions
//! - minimize the conditional likelihood for the fixed order
//! - report non-convergence as a fit failure

pub mod fitter;
pub mod start;

pub use fitter::*;
pub use start::*;
