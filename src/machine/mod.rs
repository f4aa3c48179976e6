//! Machine module - Behavior units expressed from genome segments.
//!
//! A machine owns the genome segment it was translated from and acts on
//! request. The built-in machines drive gene expression ([`Transcriber`],
//! [`Translator`]) and replication ([`Kloner`], [`Reproducer`]); domains add
//! their own, typically fitness calculators, through the [`MachineRegistry`].

mod kloner;
mod registry;
mod reproducer;
mod transcriber;
mod translator;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{MetaModelError, Result};
use crate::genome::GenomeSegment;
use crate::space::Individual;

pub use kloner::*;
pub use registry::*;
pub use reproducer::*;
pub use transcriber::*;
pub use translator::*;

/// What a machine can do; the key of an individual's machine table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Transcriber,
    Translator,
    Kloner,
    Reproducer,
    /// Computes the cost of the containing individual.
    Fitness,
    /// A domain-specific capability.
    Custom(&'static str),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Transcriber => write!(f, "transcriber"),
            Capability::Translator => write!(f, "translator"),
            Capability::Kloner => write!(f, "kloner"),
            Capability::Reproducer => write!(f, "reproducer"),
            Capability::Fitness => write!(f, "fitness"),
            Capability::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Inputs to a single machine action.
#[derive(Debug, Clone, Copy, Default)]
pub struct Activation<'a> {
    /// The segment a source machine works on.
    pub source: Option<&'a GenomeSegment>,
}

impl<'a> Activation<'a> {
    pub fn with_source(source: &'a GenomeSegment) -> Self {
        Self {
            source: Some(source),
        }
    }
}

/// Result of a machine action.
#[derive(Debug)]
pub enum Output {
    Segment(GenomeSegment),
    Machine(Arc<dyn Machine>),
    Repository(Vec<GenomeSegment>),
    Offspring(Individual),
    Fitness(f64),
    Nothing,
}

impl Output {
    pub fn kind(&self) -> &'static str {
        match self {
            Output::Segment(_) => "segment",
            Output::Machine(_) => "machine",
            Output::Repository(_) => "repository",
            Output::Offspring(_) => "offspring",
            Output::Fitness(_) => "fitness",
            Output::Nothing => "nothing",
        }
    }
}

/// A behavior unit expressed from a genome segment.
pub trait Machine: Send + Sync + fmt::Debug {
    /// The (transcribed) genome this machine was built from.
    fn segment(&self) -> &GenomeSegment;

    /// Perform this machine's action.
    fn act(&self, activation: Activation<'_>) -> Result<Output>;

    fn as_any(&self) -> &dyn Any;

    /// Fitness view of this machine, for calculators.
    fn as_fitness(&self) -> Option<&dyn FitnessCalculator> {
        None
    }

    fn capability(&self) -> Capability {
        self.segment().gene_type().capability()
    }

    fn name(&self) -> &str {
        self.segment().gene_type().name()
    }

    fn describe(&self) -> String {
        self.segment().to_string()
    }
}

/// A machine that scores the individual it lives in. Lower is better.
///
/// Implementations compute lazily and memoise the result.
pub trait FitnessCalculator: Send + Sync {
    fn fitness(&self) -> Result<f64>;
}

/// Borrow a machine as its concrete type.
pub fn downcast<T: Machine + 'static>(machine: &dyn Machine) -> Result<&T> {
    machine
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| MetaModelError::MachineMismatch {
            expected: std::any::type_name::<T>(),
            found: machine.name().to_string(),
        })
}

/// The individual a segment executes in.
pub(crate) fn environment_individual(segment: &GenomeSegment) -> Result<Individual> {
    let space = segment
        .environment()
        .ok_or_else(|| MetaModelError::NoEnvironment(segment.gene_type().name().to_string()))?;
    let id = space.id();
    Individual::from_space(space).ok_or(MetaModelError::NotAnIndividual(id))
}
