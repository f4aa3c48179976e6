//! Individuals: spaces carrying a genome and the machines expressed from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::trace;
use parking_lot::Mutex;

use crate::error::{MetaModelError, Result};
use crate::genome::GenomeSegment;
use crate::machine::{Activation, Capability, Machine, Output, Transcriber, Translator, downcast};

use super::Space;

/// Mutable state of an individual.
#[derive(Default)]
pub(crate) struct Organism {
    repository: Mutex<Vec<GenomeSegment>>,
    machines: Mutex<HashMap<Capability, Vec<Arc<dyn Machine>>>>,
    replication_count: AtomicU64,
    generation: AtomicU32,
}

/// A space that holds a genome repository and a lazily filled table of
/// expressed machines.
///
/// Machines are derived state: they are never copied on replication, only
/// re-expressed from the (mutated) repository.
#[derive(Clone)]
pub struct Individual {
    space: Space,
    organism: Arc<Organism>,
}

impl Individual {
    /// A new individual with an empty genome and no container.
    pub fn new() -> Self {
        let organism = Arc::new(Organism::default());
        Self {
            space: Space::with_organism(Arc::clone(&organism)),
            organism,
        }
    }

    /// A new individual placed inside `container`.
    pub fn within(container: &Space) -> Result<Self> {
        let individual = Self::new();
        container.add_child(individual.space.clone())?;
        Ok(individual)
    }

    /// View a space as an individual, if it is one.
    pub fn from_space(space: Space) -> Option<Self> {
        let organism = Arc::clone(space.organism()?);
        Some(Self { space, organism })
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn into_space(self) -> Space {
        self.space
    }

    pub fn id(&self) -> u64 {
        self.space.id()
    }

    pub fn generation(&self) -> u32 {
        self.organism.generation.load(Ordering::Relaxed)
    }

    pub(crate) fn set_generation(&self, generation: u32) {
        self.organism.generation.store(generation, Ordering::Relaxed);
    }

    pub fn replication_count(&self) -> u64 {
        self.organism.replication_count.load(Ordering::Relaxed)
    }

    /// Add a segment to the repository, binding it to this individual.
    pub fn add_template(&self, mut segment: GenomeSegment) {
        segment.set_environment(&self.space);
        self.organism.repository.lock().push(segment);
    }

    /// Replace the repository, binding every segment to this individual.
    pub fn set_repository(&self, mut repository: Vec<GenomeSegment>) {
        for segment in &mut repository {
            segment.set_environment(&self.space);
        }
        *self.organism.repository.lock() = repository;
    }

    /// Run `f` over the repository while it is locked.
    pub fn with_repository<R>(&self, f: impl FnOnce(&[GenomeSegment]) -> R) -> R {
        f(&self.organism.repository.lock())
    }

    pub fn repository_len(&self) -> usize {
        self.organism.repository.lock().len()
    }

    /// Total units of the repository segments with the given capability.
    pub fn total_code_size(&self, capability: Capability) -> usize {
        self.with_repository(|repository| {
            repository
                .iter()
                .filter(|segment| segment.gene_type().capability() == capability)
                .map(GenomeSegment::len)
                .sum()
        })
    }

    /// Install an expressed machine.
    pub fn add_machine(&self, machine: Arc<dyn Machine>) {
        self.organism
            .machines
            .lock()
            .entry(machine.capability())
            .or_default()
            .push(machine);
    }

    /// An already expressed machine with the given capability.
    pub fn find_machine(&self, capability: Capability) -> Option<Arc<dyn Machine>> {
        self.organism
            .machines
            .lock()
            .get(&capability)
            .and_then(|machines| machines.first().cloned())
    }

    pub fn machine_count(&self) -> usize {
        self.organism.machines.lock().values().map(Vec::len).sum()
    }

    /// The machine with the given capability, expressing it on first demand.
    ///
    /// On a miss every repository segment with that capability is expressed
    /// and installed. Concurrent callers may both express; the first to
    /// install wins and the others' machines are dropped. Transcribers and
    /// translators are never expressed through themselves: they must be
    /// installed up front (see [`Individual::add_machine`]) or arrive by
    /// replication.
    pub fn locate(&self, capability: Capability) -> Result<Arc<dyn Machine>> {
        if let Some(machine) = self.find_machine(capability) {
            return Ok(machine);
        }
        if matches!(capability, Capability::Transcriber | Capability::Translator) {
            return Err(MetaModelError::NoTemplate(capability));
        }

        let templates: Vec<GenomeSegment> = self.with_repository(|repository| {
            repository
                .iter()
                .filter(|segment| segment.gene_type().capability() == capability)
                .cloned()
                .collect()
        });
        let expressed = templates
            .iter()
            .map(|template| self.express(template))
            .collect::<Result<Vec<_>>>()?;
        trace!(
            "Individual {} expressed {} machine(s) with capability {capability}",
            self.id(),
            expressed.len()
        );

        {
            let mut machines = self.organism.machines.lock();
            let slot = machines.entry(capability).or_default();
            if slot.is_empty() {
                slot.extend(expressed);
            }
        }
        self.find_machine(capability)
            .ok_or(MetaModelError::NoTemplate(capability))
    }

    /// Express a segment into a machine living in this individual.
    pub fn express(&self, segment: &GenomeSegment) -> Result<Arc<dyn Machine>> {
        self.express_for(segment, self)
    }

    /// Express a segment with this individual's transcriber and translator,
    /// producing a machine that lives in `target`.
    pub fn express_for(&self, segment: &GenomeSegment, target: &Individual) -> Result<Arc<dyn Machine>> {
        let transcriber = self.locate(Capability::Transcriber)?;
        let transcriber = downcast::<Transcriber>(transcriber.as_ref())?;
        let mut transcript = transcriber.transcribe(segment);
        transcript.set_environment(&target.space);

        let translator = self.locate(Capability::Translator)?;
        let translator = downcast::<Translator>(translator.as_ref())?;
        translator.translate(&transcript)
    }

    /// Produce a detached offspring through this individual's reproducer.
    ///
    /// The offspring is not placed anywhere; the caller decides where it goes.
    pub fn replicate(&self) -> Result<Individual> {
        let count = self.organism.replication_count.fetch_add(1, Ordering::Relaxed) + 1;
        trace!("Replicating individual {}, replication count is now {count}", self.id());
        let reproducer = self.locate(Capability::Reproducer)?;
        match reproducer.act(Activation::default())? {
            Output::Offspring(child) => Ok(child),
            other => Err(MetaModelError::UnexpectedOutput {
                capability: Capability::Reproducer,
                output: other.kind(),
            }),
        }
    }

    /// Cost of this individual as computed by its fitness machine. Lower is better.
    pub fn fitness(&self) -> Result<f64> {
        let machine = self.locate(Capability::Fitness)?;
        let calculator = machine
            .as_fitness()
            .ok_or_else(|| MetaModelError::MachineMismatch {
                expected: "fitness calculator",
                found: machine.name().to_string(),
            })?;
        calculator.fitness()
    }

    /// A fresh, detached individual with the same space shape.
    pub(crate) fn clone_shell(&self) -> Individual {
        let organism = Arc::new(Organism::default());
        Individual {
            space: self.space.clone_shell_with(Some(Arc::clone(&organism))),
            organism,
        }
    }
}

impl Default for Individual {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.space == other.space
    }
}

impl Eq for Individual {}

impl fmt::Debug for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Individual")
            .field("id", &self.id())
            .field("generation", &self.generation())
            .field("replication_count", &self.replication_count())
            .field("segments", &self.repository_len())
            .finish()
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Individual {} [generation {}, replications {}]",
            self.id(),
            self.generation(),
            self.replication_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{GeneType, GeneUnit, Payload};
    use crate::machine::{Kloner, MachineKind, MachineRegistry};

    struct Kit {
        transcriber: Arc<GeneType>,
        translator: Arc<GeneType>,
        kloner: Arc<GeneType>,
        reproducer: Arc<GeneType>,
    }

    fn kit() -> Kit {
        let registry = MachineRegistry::with_builtins();
        let build = |name: &str, kind| GeneType::builder(name, kind).build(&registry).unwrap();
        Kit {
            transcriber: build("transcriber", MachineKind::Transcriber),
            translator: build("translator", MachineKind::Translator),
            kloner: build("kloner", MachineKind::Kloner),
            reproducer: build("reproducer", MachineKind::Reproducer),
        }
    }

    fn seeded(kit: &Kit) -> Individual {
        let individual = Individual::new();
        for gene_type in [&kit.transcriber, &kit.translator] {
            let segment = GenomeSegment::new(individual.space(), Vec::new(), gene_type).unwrap();
            individual.add_template(segment.clone());
            individual.add_machine(gene_type.construct(segment).unwrap());
        }
        individual.add_template(GenomeSegment::detached(Vec::new(), &kit.reproducer).unwrap());
        let rates = vec![GeneUnit::new(&kit.kloner, Payload::Rate(0.5))];
        individual.add_template(GenomeSegment::detached(rates, &kit.kloner).unwrap());
        individual
    }

    #[test]
    fn test_locate_expresses_lazily_and_caches() {
        let kit = kit();
        let individual = seeded(&kit);
        assert_eq!(individual.machine_count(), 2);

        let first = individual.locate(Capability::Kloner).unwrap();
        assert_eq!(individual.machine_count(), 3);
        let second = individual.locate(Capability::Kloner).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let kloner = downcast::<Kloner>(first.as_ref()).unwrap();
        assert_eq!(kloner.rate(0).unwrap(), 0.5);
        assert_eq!(kloner.segment().environment(), Some(individual.space().clone()));
    }

    #[test]
    fn test_locate_without_template_fails() {
        let kit = kit();
        let individual = seeded(&kit);
        assert!(matches!(
            individual.locate(Capability::Fitness),
            Err(MetaModelError::NoTemplate(Capability::Fitness))
        ));
        assert!(matches!(
            Individual::new().locate(Capability::Transcriber),
            Err(MetaModelError::NoTemplate(Capability::Transcriber))
        ));
    }

    #[test]
    fn test_replicate_builds_detached_child() {
        let kit = kit();
        let population = Space::container();
        let parent = seeded(&kit);
        population.add_child(parent.space().clone()).unwrap();

        let child = parent.replicate().unwrap();
        assert_eq!(parent.replication_count(), 1);
        assert_eq!(child.replication_count(), 0);
        assert_eq!(child.generation(), parent.generation() + 1);
        assert!(child.space().parent().is_none());
        assert_eq!(child.repository_len(), parent.repository_len());
        assert_eq!(child.machine_count(), 2);
        assert!(child.find_machine(Capability::Transcriber).is_some());
        assert!(child.find_machine(Capability::Kloner).is_none());

        let transcriber = child.find_machine(Capability::Transcriber).unwrap();
        assert_eq!(transcriber.segment().environment(), Some(child.space().clone()));
        child.with_repository(|repository| {
            assert!(
                repository
                    .iter()
                    .all(|s| s.environment() == Some(child.space().clone()))
            );
        });
    }

    #[test]
    fn test_grandchild_replicates_through_own_machinery() {
        let kit = kit();
        let parent = seeded(&kit);
        let child = parent.replicate().unwrap();
        let grandchild = child.replicate().unwrap();
        assert_eq!(grandchild.generation(), 2);
        assert_eq!(child.replication_count(), 1);
        assert!(child.find_machine(Capability::Reproducer).is_some());
    }

    #[test]
    fn test_replicate_without_reproducer_fails() {
        let kit = kit();
        let individual = Individual::new();
        for gene_type in [&kit.transcriber, &kit.translator] {
            let segment = GenomeSegment::new(individual.space(), Vec::new(), gene_type).unwrap();
            individual.add_machine(gene_type.construct(segment).unwrap());
        }
        assert!(matches!(
            individual.replicate(),
            Err(MetaModelError::NoTemplate(Capability::Reproducer))
        ));
    }
}
