//! Machina - Evolutionary search over genomes that express their own machinery.
//!
//! Individuals carry a repository of genome segments. Segments are
//! transcribed and translated on demand into machines: a fitness calculator,
//! a kloner that copies and mutates genomes, and a reproducer that builds
//! offspring. Mutation rates live in the genome too, so they evolve with it.
//!
//! # Architecture
//!
//! - `genome`: gene units, segments and gene types
//! - `machine`: expressed behavior units and the registry that builds them
//! - `space`: the container hierarchy, individuals, lattices and datasets
//! - `compute`: ring rearrangements, carrier mutation and population strategies
//! - `domains`: subspace clustering and travelling salesman reference domains
//! - `schema`: configuration and run properties
//!
//! # Example
//!
//! ```rust,no_run
//! use machina::{
//!     compute::search::{Elitist, SearchLoop},
//!     domains::tsp::{CityMap, RouteMutation, TspDomain},
//!     schema::{SearchConfig, TspConfig},
//!     space::Space,
//! };
//!
//! let map = CityMap::on_circle(12)?;
//! let domain = TspDomain::new(map, RouteMutation::CarriedKOpt, TspConfig::default())?;
//!
//! let world = Space::container();
//! domain.populate(&world, 40, &mut rand::thread_rng())?;
//!
//! let mut search = SearchLoop::new(Elitist::new(world, 2), SearchConfig::default());
//! let outcome = search.run()?;
//! if let Some(best) = outcome.best {
//!     println!("{}", TspDomain::describe(&best)?);
//! }
//! # Ok::<(), machina::MetaModelError>(())
//! ```

pub mod compute;
pub mod domains;
pub mod error;
pub mod genome;
pub mod machine;
pub mod schema;
pub mod space;

// Re-export commonly used types
pub use compute::search::{SearchLoop, SearchOutcome, StopReason, Strategy};
pub use error::{MetaModelError, Result};
pub use genome::{GeneType, GeneUnit, GenomeSegment};
pub use schema::{EngineConfig, Properties, StrategyKind};
pub use space::{Individual, Space};
