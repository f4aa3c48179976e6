//! Domains module - Reference fitness domains built on the meta-model.
//!
//! Each domain registers its fitness machine with a [`MachineRegistry`],
//! builds its gene types and seeds founder individuals. The machinery every
//! founder needs regardless of domain lives in [`CoreTypes`].

pub mod clustering;
pub mod tsp;

use std::sync::Arc;

use crate::error::Result;
use crate::genome::{GeneType, GenomeSegment};
use crate::machine::{MachineKind, MachineRegistry};
use crate::space::{Individual, Space};

/// Gene types of the domain-independent machines: the expression pair and
/// the reproducer.
#[derive(Clone)]
pub struct CoreTypes {
    pub transcriber: Arc<GeneType>,
    pub translator: Arc<GeneType>,
    pub reproducer: Arc<GeneType>,
}

impl CoreTypes {
    pub fn new(registry: &MachineRegistry) -> Result<Self> {
        Ok(Self {
            transcriber: GeneType::builder("transcriber", MachineKind::Transcriber).build(registry)?,
            translator: GeneType::builder("translator", MachineKind::Translator).build(registry)?,
            reproducer: GeneType::builder("reproducer", MachineKind::Reproducer).build(registry)?,
        })
    }

    /// A new individual able to express and replicate itself.
    ///
    /// The transcriber and translator are installed directly, since nothing
    /// can express them before they exist; the reproducer stays a template
    /// until replication first asks for it. The founder is placed in
    /// `container` if one is given.
    pub fn founder(&self, container: Option<&Space>) -> Result<Individual> {
        let individual = Individual::new();
        for gene_type in [&self.transcriber, &self.translator] {
            let template = GenomeSegment::new(individual.space(), Vec::new(), gene_type)?;
            individual.add_template(template.clone());
            individual.add_machine(gene_type.construct(template)?);
        }
        individual.add_template(GenomeSegment::detached(Vec::new(), &self.reproducer)?);
        if let Some(container) = container {
            container.add_child(individual.space().clone())?;
        }
        Ok(individual)
    }
}
