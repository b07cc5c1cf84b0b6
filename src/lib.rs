//! `callcast` library crate.
//!
//! The binary (`callcast`) is a thin wrapper around this library so that:
//!
//! - snapshot loading, fitting and forecasting are testable without spawning processes
//! - the P&L and daily-call summaries can be reused by other front-ends

pub mod app;
pub mod calls;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod plot;
pub mod pnl;
pub mod report;
pub mod view;
