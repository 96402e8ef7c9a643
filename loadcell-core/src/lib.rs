//! Dependency-light data model and statistics for the `loadcell`
//! benchmark engine. No async code lives here; everything is pure and
//! synchronous so it can be tested without a runtime.

mod config;
mod constants;
mod data;
mod stats;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use stats::*;
