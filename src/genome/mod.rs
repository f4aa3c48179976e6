//! Genome module - Gene units, segments and the gene types that give them meaning.
//!
//! A genome is a set of [`GenomeSegment`]s, each an ordered run of
//! [`GeneUnit`]s of one [`GeneType`]. The type decides which machine a
//! segment expresses into and how the segment is copied during replication.

mod gene;
mod gene_type;
mod segment;

pub use gene::*;
pub use gene_type::*;
pub use segment::*;
