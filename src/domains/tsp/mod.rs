//! Travelling salesman domain.
//!
//! A journey is an individual whose fitness genome lists every city once;
//! its cost is the length of the closed tour. The kloner genome is a degree
//! carrier: one unit per k in `min_k_opt..=max_k_opt`, the first coding unit
//! giving the k used to shuffle offspring routes.

mod city_map;
mod journey;
mod route;

use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::compute::{degree_carrier_code, degree_carrier_mutator};
use crate::error::{MetaModelError, Result};
use crate::genome::{GeneType, GeneUnit, GenomeSegment, Mutator, Payload};
use crate::machine::{Capability, Kloner, Machine, MachineKind, MachineRegistry, downcast};
use crate::schema::TspConfig;
use crate::space::{Individual, Space};

use super::CoreTypes;

pub use city_map::*;
pub use journey::*;
pub use route::*;

/// Registry name of the journey calculator.
pub const JOURNEY_KIND: &str = "journey";

/// How offspring routes differ from their parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMutation {
    /// k-opt with k carried by the kloner.
    #[default]
    CarriedKOpt,
    FixedKOpt(usize),
    Reverse,
    /// Offspring routes are faithful copies.
    Exact,
}

impl RouteMutation {
    fn mutator(self) -> Mutator {
        match self {
            RouteMutation::CarriedKOpt => carried_k_opt_mutator(),
            RouteMutation::FixedKOpt(k) => fixed_k_opt_mutator(k),
            RouteMutation::Reverse => reverse_mutator(),
            RouteMutation::Exact => GeneType::exact_copy(),
        }
    }
}

/// Gene types and founders of the travelling salesman domain.
pub struct TspDomain {
    core: CoreTypes,
    cities: Arc<GeneType>,
    kloner: Arc<GeneType>,
    map: Arc<CityMap>,
    config: TspConfig,
}

impl TspDomain {
    pub fn new(map: CityMap, mutation: RouteMutation, config: TspConfig) -> Result<Self> {
        config.validate()?;
        if map.city_count() < 2 {
            return Err(MetaModelError::Data(format!(
                "a journey needs at least 2 cities, the map has {}",
                map.city_count()
            )));
        }
        let map = Arc::new(map);

        let mut registry = MachineRegistry::with_builtins();
        let shared = Arc::clone(&map);
        registry.register(
            MachineKind::Named(JOURNEY_KIND.to_string()),
            Capability::Fitness,
            false,
            move |segment| Ok(Arc::new(JourneyCalculator::new(segment, Arc::clone(&shared))) as Arc<dyn Machine>),
        );

        Ok(Self {
            core: CoreTypes::new(&registry)?,
            cities: GeneType::builder("cities", MachineKind::Named(JOURNEY_KIND.to_string()))
                .shared_mutator(mutation.mutator())
                .build(&registry)?,
            kloner: GeneType::builder("k-opt kloner", MachineKind::Kloner)
                .shared_mutator(degree_carrier_mutator())
                .build(&registry)?,
            map,
            config,
        })
    }

    pub fn map(&self) -> &Arc<CityMap> {
        &self.map
    }

    pub fn core_types(&self) -> &CoreTypes {
        &self.core
    }

    pub fn city_type(&self) -> &Arc<GeneType> {
        &self.cities
    }

    pub fn kloner_type(&self) -> &Arc<GeneType> {
        &self.kloner
    }

    /// Route units for the named cities, in order.
    pub fn route(&self, names: &[&str]) -> Result<Vec<GeneUnit>> {
        names
            .iter()
            .map(|&name| {
                if self.map.contains(name) {
                    Ok(GeneUnit::new(&self.cities, Payload::Symbol(name.to_string())))
                } else {
                    Err(MetaModelError::Data(format!("unknown city '{name}'")))
                }
            })
            .collect()
    }

    /// Every city once, starting from the first city of the map and visiting
    /// the rest in random order.
    pub fn random_route<R: Rng>(&self, rng: &mut R) -> Vec<GeneUnit> {
        let (first, rest) = match self.map.names().split_first() {
            Some(split) => split,
            None => return Vec::new(),
        };
        let mut rest: Vec<&String> = rest.iter().collect();
        rest.shuffle(rng);
        std::iter::once(first)
            .chain(rest)
            .map(|name| GeneUnit::new(&self.cities, Payload::Symbol(name.clone())))
            .collect()
    }

    /// Degree carrier coding only the initial k.
    pub fn kloner_code(&self) -> Vec<GeneUnit> {
        degree_carrier_code(
            &self.kloner,
            self.config.min_k_opt,
            self.config.max_k_opt,
            self.config.initial_k_opt,
        )
    }

    /// A founder journey following `route`, placed in `container` if given.
    pub fn journey(&self, container: Option<&Space>, route: Vec<GeneUnit>) -> Result<Individual> {
        let journey = self.core.founder(None)?;
        journey.add_template(GenomeSegment::detached(self.kloner_code(), &self.kloner)?);
        journey.add_template(GenomeSegment::detached(route, &self.cities)?);
        if let Some(container) = container {
            container.add_child(journey.space().clone())?;
        }
        Ok(journey)
    }

    /// `count` random journeys placed in `container`.
    pub fn populate<R: Rng>(&self, container: &Space, count: usize, rng: &mut R) -> Result<Vec<Individual>> {
        (0..count)
            .map(|_| self.journey(Some(container), self.random_route(rng)))
            .collect()
    }

    /// One-line summary: replications, journey time, carried k and tour.
    pub fn describe(journey: &Individual) -> Result<String> {
        let calculator = journey.locate(Capability::Fitness)?;
        let calculator = downcast::<JourneyCalculator>(calculator.as_ref())?;
        let kloner = journey.locate(Capability::Kloner)?;
        let kloner = downcast::<Kloner>(kloner.as_ref())?;
        Ok(format!(
            "Journey: [{}, {:.2}, k={}] ({})",
            journey.replication_count(),
            calculator.journey_time()?,
            kloner.degree()?,
            calculator.describe()
        ))
    }
}
