//! Seasonal ARIMA model implementation.
//!
//! Models are implemented as small, pure functions so that fitting/forecasting
//! code can stay generic over the order.

pub mod sarima;

pub use sarima::*;
