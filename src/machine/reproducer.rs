//! The replicator: builds a new individual from its host.

use std::any::Any;

use log::debug;

use crate::error::Result;
use crate::genome::GenomeSegment;
use crate::space::Individual;

use super::{Activation, Capability, Kloner, Machine, Output, downcast, environment_individual};

/// Produces offspring of the individual it is expressed in.
#[derive(Debug)]
pub struct Reproducer {
    segment: GenomeSegment,
}

impl Reproducer {
    pub fn new(segment: GenomeSegment) -> Self {
        Self { segment }
    }

    /// Build a detached child of `parent`.
    ///
    /// The child shell is a clone of the parent's space with fresh state.
    /// Its repository is the parent's, copied through the parent's kloner,
    /// and its essential machines are expressed by the parent's machinery.
    /// Everything else is expressed lazily in the child when first needed.
    pub fn reproduce(&self, parent: &Individual) -> Result<Individual> {
        let child = parent.clone_shell();
        child.set_generation(parent.generation() + 1);

        let kloner = parent.locate(Capability::Kloner)?;
        let kloner = downcast::<Kloner>(kloner.as_ref())?;
        let repository = parent.with_repository(|repository| kloner.mutate_repository(repository))?;
        child.set_repository(repository);

        let essential = child.with_repository(|repository| {
            repository
                .iter()
                .filter(|segment| segment.gene_type().is_essential())
                .cloned()
                .collect::<Vec<_>>()
        });
        for segment in &essential {
            let machine = parent.express_for(segment, &child)?;
            child.add_machine(machine);
        }

        debug!(
            "Individual {} produced individual {} (generation {})",
            parent.id(),
            child.id(),
            child.generation()
        );
        Ok(child)
    }
}

impl Machine for Reproducer {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    fn act(&self, _activation: Activation<'_>) -> Result<Output> {
        let parent = environment_individual(&self.segment)?;
        Ok(Output::Offspring(self.reproduce(&parent)?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
