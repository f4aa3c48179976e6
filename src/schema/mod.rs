//! Schema module - Configuration types and run parameters for evolutionary search.

mod config;
mod properties;

pub use config::*;
pub use properties::*;
