//! Compute module - Genome mutation operators and population search.
//!
//! - `rearrange`: deletion, duplication, translocation and point mutation
//!   of ring-shaped genomes.
//! - `carrier`: self-mutating rate and degree encodings of kloner genomes.
//! - [`search`]: elitist, microbial and toroidal population strategies and
//!   the loop that drives them.

mod carrier;
mod rearrange;

pub mod search;

pub use carrier::*;
pub use rearrange::*;
