//! Crate-wide error type for meta-model invariant violations.

use crate::machine::Capability;
use crate::schema::ConfigError;

/// Errors raised while building, expressing, mutating or replicating genomes.
#[derive(Debug, thiserror::Error)]
pub enum MetaModelError {
    #[error("Gene unit of type '{found}' found in a segment of type '{expected}'")]
    WrongGeneType { expected: String, found: String },
    #[error("No template in the repository for a machine with capability {0}")]
    NoTemplate(Capability),
    #[error("Machine '{0}' needs a source segment to act on")]
    NoSource(String),
    #[error("Degenerate genome: {0}")]
    DegenerateGenome(String),
    #[error("Could not construct machine of kind '{kind}': {reason}")]
    Construction { kind: String, reason: String },
    #[error("Machine '{found}' is not a {expected}")]
    MachineMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("No machine constructor registered for kind '{0}'")]
    UnknownMachineKind(String),
    #[error("Expected a {expected} payload but found {found}")]
    PayloadMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Machine with capability {capability} produced unexpected output: {output}")]
    UnexpectedOutput {
        capability: Capability,
        output: &'static str,
    },
    #[error("The environment of '{0}' is no longer alive")]
    NoEnvironment(String),
    #[error("No dataset is reachable from space {0}")]
    NoDataset(u64),
    #[error("Space {0} only accepts individuals as children")]
    NotAnIndividual(u64),
    #[error("Space {0} is not a lattice")]
    NotALattice(u64),
    #[error("Wrong number of individuals: was {before} and now is {after}")]
    PopulationChanged { before: usize, after: usize },
    #[error("Population of {0} is too small for this strategy")]
    PopulationTooSmall(usize),
    #[error("Worker thread failed: {0}")]
    Worker(String),
    #[error("Invalid distribution parameter: {0}")]
    Distribution(String),
    #[error("Failed to load data: {0}")]
    Data(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = MetaModelError> = std::result::Result<T, E>;

impl From<rand_distr::BinomialError> for MetaModelError {
    fn from(err: rand_distr::BinomialError) -> Self {
        Self::Distribution(format!("{err:?}"))
    }
}

impl From<rand_distr::NormalError> for MetaModelError {
    fn from(err: rand_distr::NormalError) -> Self {
        Self::Distribution(format!("{err:?}"))
    }
}
