//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - calendar months and gap-free monthly series (`Month`, `TimeSeries`)
//! - the seasonal ARIMA order and its fitted coefficients (`SarimaOrder`, `FittedModel`)
//! - forecast outputs (`Forecast`, `ForecastPoint`)

pub mod types;

pub use types::*;
