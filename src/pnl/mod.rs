//! P&L figures per service: sheet ingest, KPIs, quarterly roll-ups.

pub mod kpi;
pub mod sheet;

pub use kpi::*;
pub use sheet::*;
