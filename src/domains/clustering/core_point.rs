//! Core points: cluster centres living in a subspace of the data.

use std::collections::BTreeMap;
use std::fmt;

use crate::space::Observation;

/// A cluster centre with coordinates in some subset of the dimensions, and
/// the observations assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct CorePoint {
    id: u32,
    coordinates: BTreeMap<usize, f64>,
    total_mismatch: f64,
    observation_count: usize,
}

impl CorePoint {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            coordinates: BTreeMap::new(),
            total_mismatch: 0.0,
            observation_count: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Add `contribution` to the coordinate in `dimension`, creating it at
    /// zero first if needed.
    pub fn add_contribution(&mut self, dimension: usize, contribution: f64) {
        *self.coordinates.entry(dimension).or_insert(0.0) += contribution;
    }

    pub fn coordinate(&self, dimension: usize) -> Option<f64> {
        self.coordinates.get(&dimension).copied()
    }

    /// Dimensions of the subspace this point lives in.
    pub fn dimension_count(&self) -> usize {
        self.coordinates.len()
    }

    /// Mismatch between an observation and this point.
    ///
    /// Inside the subspace it is the manhattan distance to the coordinates.
    /// Outside it, observations are normalised so the offset is the sum of
    /// absolute values, weighted by the number of dimensions the point does
    /// not cover. The total is averaged over the observation's dimensions.
    pub fn mismatch(&self, observation: &Observation) -> f64 {
        let dimensions = observation.dimension_count();
        if dimensions == 0 {
            return 0.0;
        }
        let inside: f64 = self
            .coordinates
            .iter()
            .map(|(&d, &c)| (observation.value(d) - c).abs())
            .sum();
        let outside: f64 = (0..dimensions)
            .filter(|d| !self.coordinates.contains_key(d))
            .map(|d| observation.value(d).abs())
            .sum::<f64>()
            * (dimensions as f64 - self.dimension_count() as f64);
        (inside + outside) / dimensions as f64
    }

    /// Record an observation assigned to this point.
    pub fn assign(&mut self, mismatch: f64) {
        self.total_mismatch += mismatch;
        self.observation_count += 1;
    }

    pub fn total_mismatch(&self) -> f64 {
        self.total_mismatch
    }

    pub fn observation_count(&self) -> usize {
        self.observation_count
    }
}

impl fmt::Display for CorePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.id, self.observation_count)?;
        let coordinates: Vec<String> = self
            .coordinates
            .iter()
            .map(|(d, c)| format!("{d}:{c:.2}"))
            .collect();
        write!(f, "{}", coordinates.join(", "))
    }
}
