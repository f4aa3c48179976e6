//! Configuration types for evolutionary search runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Properties;

fn default_population_size() -> usize {
    100
}

fn default_elite_proportion() -> usize {
    2
}

fn default_lattice_size() -> usize {
    9
}

fn default_true() -> bool {
    true
}

fn default_min_run_count() -> u64 {
    400
}

fn default_death_chance_run_count() -> f64 {
    600.0
}

fn default_cell_interval_micros() -> u64 {
    10_000
}

fn default_drain_interval_micros() -> u64 {
    100
}

fn default_workers() -> usize {
    8
}

fn default_max_generations() -> u32 {
    1000
}

fn default_max_iterations() -> u64 {
    1_000_000
}

fn default_report_interval() -> u64 {
    100
}

fn default_mutation_amount() -> f64 {
    0.01
}

fn default_initial_rate() -> f64 {
    0.1
}

fn default_core_points() -> u32 {
    8
}

fn default_min_k_opt() -> u32 {
    2
}

fn default_max_k_opt() -> u32 {
    10
}

fn default_min_initial_units() -> usize {
    100
}

fn default_max_initial_units() -> usize {
    200
}

/// Which population strategy drives the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Truncation selection keeping the best `1 / k` of the population.
    #[default]
    Elitist,
    /// Pairwise tournament with replacement of the loser.
    Microbial,
    /// Diffusion over a wrap-around lattice of sites.
    Toroidal,
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elitist" => Ok(Self::Elitist),
            "microbial" => Ok(Self::Microbial),
            "toroidal" => Ok(Self::Toroidal),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Population strategy.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Number of individuals seeded into a population strategy.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Elitist strategy keeps `1 / elite_proportion` of the population.
    #[serde(default = "default_elite_proportion")]
    pub elite_proportion: usize,
    /// Lattice dimensions for the toroidal strategy.
    #[serde(default)]
    pub lattice: LatticeConfig,
    /// Site life-cycle and scheduling for the toroidal strategy.
    #[serde(default)]
    pub toroidal: ToroidalConfig,
    /// Stopping conditions for the search loop.
    #[serde(default)]
    pub search: SearchConfig,
    /// Initial mutation rates and self-mutation amount.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Clustering domain parameters.
    #[serde(default)]
    pub clustering: ClusteringConfig,
    /// Travelling salesman domain parameters.
    #[serde(default)]
    pub tsp: TspConfig,
    /// Optional fixed seed for population seeding.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            population_size: default_population_size(),
            elite_proportion: default_elite_proportion(),
            lattice: LatticeConfig::default(),
            toroidal: ToroidalConfig::default(),
            search: SearchConfig::default(),
            mutation: MutationConfig::default(),
            clustering: ClusteringConfig::default(),
            tsp: TspConfig::default(),
            random_seed: None,
        }
    }
}

/// Dimensions of a toroidal lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeConfig {
    #[serde(default = "default_lattice_size")]
    pub x_size: usize,
    #[serde(default = "default_lattice_size")]
    pub y_size: usize,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            x_size: default_lattice_size(),
            y_size: default_lattice_size(),
        }
    }
}

/// Death policy and scheduling of toroidal sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToroidalConfig {
    /// Whether occupants of a site ever die of their own accord.
    #[serde(default = "default_true")]
    pub programmed_death: bool,
    /// Die once the site has run too often; otherwise die at random.
    #[serde(default = "default_true")]
    pub death_by_old_age: bool,
    /// Run count a site must exceed before its occupant dies of old age.
    #[serde(default = "default_min_run_count")]
    pub min_run_count: u64,
    /// Multiplier of the replication count that extends the lifespan of prolific occupants.
    #[serde(default)]
    pub replication_multiplier: u64,
    /// Random death happens with probability `1 / death_chance_run_count` per run.
    #[serde(default = "default_death_chance_run_count")]
    pub death_chance_run_count: f64,
    /// Delay between two runs of the same site.
    #[serde(default = "default_cell_interval_micros")]
    pub cell_interval_micros: u64,
    /// Delay between two drains of the replication request queue.
    #[serde(default = "default_drain_interval_micros")]
    pub drain_interval_micros: u64,
    /// Worker threads running sites.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Wall-clock budget for a concurrent run, in seconds.
    #[serde(default)]
    pub run_seconds: Option<u64>,
}

impl Default for ToroidalConfig {
    fn default() -> Self {
        Self {
            programmed_death: true,
            death_by_old_age: true,
            min_run_count: default_min_run_count(),
            replication_multiplier: 0,
            death_chance_run_count: default_death_chance_run_count(),
            cell_interval_micros: default_cell_interval_micros(),
            drain_interval_micros: default_drain_interval_micros(),
            workers: default_workers(),
            run_seconds: None,
        }
    }
}

/// Stopping conditions for a search loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop once the best generation reaches this value.
    #[serde(default = "default_max_generations")]
    pub max_generations: u32,
    /// Stop after this many strategy steps.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Stop once the best fitness is at or below this cost.
    #[serde(default)]
    pub target_fitness: Option<f64>,
    /// Log progress every this many steps.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_generations: default_max_generations(),
            max_iterations: default_max_iterations(),
            target_fitness: None,
            report_interval: default_report_interval(),
        }
    }
}

/// Initial rates written into a fresh mutation carrier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    #[serde(default = "default_initial_rate")]
    pub deletion_rate: f64,
    #[serde(default = "default_initial_rate")]
    pub duplication_rate: f64,
    #[serde(default = "default_initial_rate")]
    pub translocation_rate: f64,
    #[serde(default = "default_initial_rate")]
    pub point_rate: f64,
    /// Standard deviation of the gaussian step applied when a rate self-mutates.
    #[serde(default = "default_mutation_amount")]
    pub mutation_amount: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            deletion_rate: default_initial_rate(),
            duplication_rate: default_initial_rate(),
            translocation_rate: default_initial_rate(),
            point_rate: default_initial_rate(),
            mutation_amount: default_mutation_amount(),
        }
    }
}

/// Parameters of the subspace clustering domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Number of distinct core points a gene unit may contribute to.
    #[serde(default = "default_core_points")]
    pub core_points: u32,
    /// Dimensionality of the dataset; every observation must match.
    #[serde(default)]
    pub dimensions: Option<usize>,
    #[serde(default = "default_min_initial_units")]
    pub min_initial_units: usize,
    #[serde(default = "default_max_initial_units")]
    pub max_initial_units: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            core_points: default_core_points(),
            dimensions: None,
            min_initial_units: default_min_initial_units(),
            max_initial_units: default_max_initial_units(),
        }
    }
}

/// Bounds of the k-opt degree carried by travelling salesman kloners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TspConfig {
    #[serde(default = "default_min_k_opt")]
    pub min_k_opt: u32,
    #[serde(default = "default_max_k_opt")]
    pub max_k_opt: u32,
    /// Degree coded by a founder's kloner.
    #[serde(default = "default_max_k_opt")]
    pub initial_k_opt: u32,
}

impl Default for TspConfig {
    fn default() -> Self {
        Self {
            min_k_opt: default_min_k_opt(),
            max_k_opt: default_max_k_opt(),
            initial_k_opt: default_max_k_opt(),
        }
    }
}

impl TspConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_k_opt == 0
            || self.min_k_opt >= self.max_k_opt
            || !(self.min_k_opt..=self.max_k_opt).contains(&self.initial_k_opt)
        {
            return Err(ConfigError::InvalidKOpt {
                min: self.min_k_opt,
                max: self.max_k_opt,
                initial: self.initial_k_opt,
            });
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Load and validate a configuration file.
    ///
    /// Files ending in `.properties` are read as key/value properties,
    /// anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let config = if path.extension().is_some_and(|ext| ext == "properties") {
            Self::from_properties(&Properties::load(path)?)?
        } else {
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from a key/value property set, falling back to
    /// defaults for absent keys.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            strategy: match props.get("strategy") {
                Some(name) => name.parse()?,
                None => defaults.strategy,
            },
            population_size: props.get_or("numIndividuals", defaults.population_size)?,
            elite_proportion: props.get_or("eliteProportion", defaults.elite_proportion)?,
            lattice: LatticeConfig {
                x_size: props.get_or("xSize", defaults.lattice.x_size)?,
                y_size: props.get_or("ySize", defaults.lattice.y_size)?,
            },
            toroidal: ToroidalConfig {
                programmed_death: props.get_or("programmedDeath", true)?,
                death_by_old_age: props.get_or("deathByOldAge", true)?,
                min_run_count: props.get_or("minRunCount", defaults.toroidal.min_run_count)?,
                replication_multiplier: props.get_or("replicationMultiplier", 0)?,
                death_chance_run_count: props.get_or(
                    "deathChanceRunCount",
                    defaults.toroidal.death_chance_run_count,
                )?,
                cell_interval_micros: props.get_or(
                    "cellIntervalMicros",
                    defaults.toroidal.cell_interval_micros,
                )?,
                drain_interval_micros: props.get_or(
                    "drainIntervalMicros",
                    defaults.toroidal.drain_interval_micros,
                )?,
                workers: props.get_or("numThreads", defaults.toroidal.workers)?,
                run_seconds: props.get_parsed("runSeconds")?,
            },
            search: SearchConfig {
                max_generations: props.get_or("maxGeneration", defaults.search.max_generations)?,
                max_iterations: props.get_or("maxIterations", defaults.search.max_iterations)?,
                target_fitness: props.get_parsed("targetFitness")?,
                report_interval: props.get_or("reportInterval", defaults.search.report_interval)?,
            },
            mutation: MutationConfig {
                deletion_rate: props.get_or("initialDeletionMutationRate", 0.1)?,
                duplication_rate: props.get_or("initialDuplicationMutationRate", 0.1)?,
                translocation_rate: props.get_or("initialTranslocationMutationRate", 0.1)?,
                point_rate: props.get_or("initialPointMutationRate", 0.1)?,
                mutation_amount: props.get_or("mutationAmount", default_mutation_amount())?,
            },
            clustering: ClusteringConfig {
                core_points: props.get_or("numCorePoints", defaults.clustering.core_points)?,
                dimensions: props.get_parsed("numDimensions")?,
                min_initial_units: props.get_or(
                    "minInitialNumPearls",
                    defaults.clustering.min_initial_units,
                )?,
                max_initial_units: props.get_or(
                    "maxInitialNumPearls",
                    defaults.clustering.max_initial_units,
                )?,
            },
            tsp: TspConfig {
                min_k_opt: props.get_or("minKOpt", defaults.tsp.min_k_opt)?,
                max_k_opt: props.get_or("maxKOpt", defaults.tsp.max_k_opt)?,
                initial_k_opt: props.get_or("initialKOpt", defaults.tsp.initial_k_opt)?,
            },
            random_seed: props.get_parsed("randomSeed")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.elite_proportion < 2 {
            return Err(ConfigError::InvalidEliteProportion(self.elite_proportion));
        }
        if self.lattice.x_size == 0 || self.lattice.y_size == 0 {
            return Err(ConfigError::InvalidLattice);
        }
        if self.toroidal.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.toroidal.death_chance_run_count < 1.0 {
            return Err(ConfigError::InvalidDeathChance(
                self.toroidal.death_chance_run_count,
            ));
        }
        for (name, rate) in [
            ("deletion", self.mutation.deletion_rate),
            ("duplication", self.mutation.duplication_rate),
            ("translocation", self.mutation.translocation_rate),
            ("point", self.mutation.point_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidRate { name, rate });
            }
        }
        if !(self.mutation.mutation_amount >= 0.0) {
            return Err(ConfigError::InvalidMutationAmount(
                self.mutation.mutation_amount,
            ));
        }
        if self.clustering.core_points == 0 {
            return Err(ConfigError::NoCorePoints);
        }
        if self.clustering.min_initial_units == 0
            || self.clustering.min_initial_units > self.clustering.max_initial_units
        {
            return Err(ConfigError::InvalidInitialUnits {
                min: self.clustering.min_initial_units,
                max: self.clustering.max_initial_units,
            });
        }
        self.tsp.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Population size must be non-zero")]
    EmptyPopulation,
    #[error("Elite proportion must be at least 2, got {0}")]
    InvalidEliteProportion(usize),
    #[error("Lattice dimensions must be non-zero")]
    InvalidLattice,
    #[error("At least one worker thread is required")]
    NoWorkers,
    #[error("Death chance run count must be at least 1, got {0}")]
    InvalidDeathChance(f64),
    #[error("Initial {name} rate {rate} is outside [0, 1]")]
    InvalidRate { name: &'static str, rate: f64 },
    #[error("Mutation amount must be non-negative, got {0}")]
    InvalidMutationAmount(f64),
    #[error("Clustering needs at least one core point")]
    NoCorePoints,
    #[error("Initial genome length bounds {min}..={max} are invalid")]
    InvalidInitialUnits { min: usize, max: usize },
    #[error("k-opt bounds min {min}, max {max}, initial {initial} are invalid")]
    InvalidKOpt { min: u32, max: u32, initial: u32 },
    #[error("Unknown strategy '{0}'")]
    UnknownStrategy(String),
    #[error("Properties do not contain key {0}")]
    MissingKey(String),
    #[error("Property {key} has unparseable value '{value}'")]
    InvalidValue { key: String, value: String },
    #[error("Malformed property line {line}: '{text}'")]
    MalformedLine { line: usize, text: String },
}
