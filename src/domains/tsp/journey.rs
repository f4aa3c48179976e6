//! The journey calculator: the fitness machine of a route.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::genome::GenomeSegment;
use crate::machine::{Activation, FitnessCalculator, Machine, Output};

use super::CityMap;

/// Scores the closed tour its genome describes, one city per unit.
#[derive(Debug)]
pub struct JourneyCalculator {
    segment: GenomeSegment,
    map: Arc<CityMap>,
    journey_time: OnceLock<f64>,
}

impl JourneyCalculator {
    pub fn new(segment: GenomeSegment, map: Arc<CityMap>) -> Self {
        Self {
            segment,
            map,
            journey_time: OnceLock::new(),
        }
    }

    /// City names in visiting order.
    pub fn route(&self) -> Result<Vec<&str>> {
        self.segment.code().iter().map(|unit| unit.symbol()).collect()
    }

    /// Length of the closed tour, computed on first request.
    pub fn journey_time(&self) -> Result<f64> {
        if let Some(&time) = self.journey_time.get() {
            return Ok(time);
        }
        let time = self.map.tour_length(&self.route()?)?;
        Ok(*self.journey_time.get_or_init(|| time))
    }
}

impl Machine for JourneyCalculator {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    fn act(&self, _activation: Activation<'_>) -> Result<Output> {
        Ok(Output::Fitness(self.journey_time()?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_fitness(&self) -> Option<&dyn FitnessCalculator> {
        Some(self)
    }

    /// The tour, back to its start: `a,b,c,a`.
    fn describe(&self) -> String {
        let mut route: Vec<&str> = self.route().unwrap_or_default();
        if let Some(&first) = route.first() {
            route.push(first);
        }
        route.join(",")
    }
}

impl FitnessCalculator for JourneyCalculator {
    fn fitness(&self) -> Result<f64> {
        self.journey_time()
    }
}
