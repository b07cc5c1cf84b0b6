//! Input/output helpers.
//!
//! - shared CSV plumbing (`table`)
//! - snapshot discovery + loading (`snapshot`) and its memo (`cache`)
//! - forecast exports (CSV via `export`, JSON via `forecast_file`)

pub mod cache;
pub mod export;
pub mod forecast_file;
pub mod snapshot;
pub mod table;

pub use cache::*;
pub use export::*;
pub use forecast_file::*;
pub use snapshot::*;
