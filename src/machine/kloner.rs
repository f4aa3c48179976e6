//! The mutation carrier: copies a repository through each segment's gene type.

use std::any::Any;

use log::debug;

use crate::error::{MetaModelError, Result};
use crate::genome::{GeneUnit, GenomeSegment};

use super::{Activation, Machine, Output, environment_individual};

/// Inaccurate copier of genomes.
///
/// A kloner's own coding units parameterise the mutation operators it is
/// handed to (rates, k-opt degree, ...), so the way genomes change can
/// itself evolve.
#[derive(Debug)]
pub struct Kloner {
    segment: GenomeSegment,
}

impl Kloner {
    pub fn new(segment: GenomeSegment) -> Self {
        Self { segment }
    }

    /// Coding units of the carrier genome, in order.
    pub fn coding_units(&self) -> impl Iterator<Item = &GeneUnit> {
        self.segment.code().iter().filter(|unit| unit.is_coding())
    }

    /// The rate held by the `index`-th coding unit.
    pub fn rate(&self, index: usize) -> Result<f64> {
        self.coding_units()
            .nth(index)
            .ok_or_else(|| {
                MetaModelError::DegenerateGenome(format!(
                    "mutation carrier has no rate at position {index}"
                ))
            })?
            .rate()
    }

    /// The degree held by the first coding unit.
    pub fn degree(&self) -> Result<u32> {
        self.coding_units()
            .next()
            .ok_or_else(|| {
                MetaModelError::DegenerateGenome("mutation carrier has no degree".to_string())
            })?
            .degree()
    }

    /// Mutated copy of every segment in `repository`.
    pub fn mutate_repository(&self, repository: &[GenomeSegment]) -> Result<Vec<GenomeSegment>> {
        let copies = repository
            .iter()
            .map(|segment| segment.gene_type().mutate(segment, self))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Kloned repository of {} segments ({} -> {} units)",
            repository.len(),
            repository.iter().map(GenomeSegment::len).sum::<usize>(),
            copies.iter().map(GenomeSegment::len).sum::<usize>()
        );
        Ok(copies)
    }
}

impl Machine for Kloner {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    /// Mutated copy of the repository of the individual this kloner lives in.
    fn act(&self, _activation: Activation<'_>) -> Result<Output> {
        let individual = environment_individual(&self.segment)?;
        let copies = individual.with_repository(|repository| self.mutate_repository(repository))?;
        Ok(Output::Repository(copies))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{GeneType, Payload};
    use crate::machine::{MachineKind, MachineRegistry};

    fn kloner_with(code: impl Fn(&std::sync::Arc<GeneType>) -> Vec<GeneUnit>) -> Kloner {
        let registry = MachineRegistry::with_builtins();
        let kloner_type = GeneType::builder("kloner", MachineKind::Kloner)
            .build(&registry)
            .unwrap();
        Kloner::new(GenomeSegment::detached(code(&kloner_type), &kloner_type).unwrap())
    }

    #[test]
    fn test_rates_skip_non_coding_units() {
        let kloner = kloner_with(|t| {
            vec![
                GeneUnit::new(t, Payload::Rate(0.1)),
                GeneUnit::non_coding(t, Payload::Rate(0.9)),
                GeneUnit::new(t, Payload::Rate(0.3)),
            ]
        });
        assert_eq!(kloner.rate(0).unwrap(), 0.1);
        assert_eq!(kloner.rate(1).unwrap(), 0.3);
        assert!(matches!(kloner.rate(2), Err(MetaModelError::DegenerateGenome(_))));
    }

    #[test]
    fn test_degree_reads_first_coding_unit() {
        let kloner = kloner_with(|t| {
            vec![
                GeneUnit::non_coding(t, Payload::Degree(9)),
                GeneUnit::new(t, Payload::Degree(4)),
            ]
        });
        assert_eq!(kloner.degree().unwrap(), 4);
        assert!(kloner_with(|_| Vec::new()).degree().is_err());
    }

    #[test]
    fn test_act_outside_an_individual_fails() {
        let kloner = kloner_with(|_| Vec::new());
        assert!(matches!(
            kloner.act(Activation::default()),
            Err(MetaModelError::NoEnvironment(_))
        ));
    }
}
