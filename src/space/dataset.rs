//! Datasets attached to spaces for fitness calculators to read.

use std::fmt;
use std::path::Path;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{MetaModelError, Result};

/// One observation: a value per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    values: Vec<f64>,
}

impl Observation {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, dimension: usize) -> f64 {
        self.values.get(dimension).copied().unwrap_or(0.0)
    }

    pub fn dimension_count(&self) -> usize {
        self.values.len()
    }
}

/// Read-only data a fitness calculator evaluates against.
pub trait Dataset: Send + Sync + fmt::Debug {
    fn dimension_count(&self) -> usize;

    fn observation_count(&self) -> usize {
        self.observations().len()
    }

    /// Smallest value over every dimension of every observation.
    fn min_value(&self) -> f64;

    /// Largest minus smallest value over the whole dataset.
    fn value_range(&self) -> f64;

    fn observations(&self) -> &[Observation];
}

/// A dataset held entirely in memory, summarised on construction.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    dimensions: usize,
    observations: Vec<Observation>,
    min_value: f64,
    max_value: f64,
}

impl InMemoryDataset {
    /// Build from rows, each of which must have exactly `dimensions` values.
    pub fn new(dimensions: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        let mut observations = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != dimensions {
                return Err(MetaModelError::Data(format!(
                    "observation {} has {} values, expected {dimensions}",
                    index + 1,
                    row.len()
                )));
            }
            for &value in &row {
                min_value = min_value.min(value);
                max_value = max_value.max(value);
            }
            observations.push(Observation::new(row));
        }
        if observations.is_empty() {
            min_value = 0.0;
            max_value = 0.0;
        }
        Ok(Self {
            dimensions,
            observations,
            min_value,
            max_value,
        })
    }

    /// Parse comma-separated text, one observation per non-blank line.
    pub fn parse_csv(dimensions: usize, text: &str) -> Result<Self> {
        let rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                line.split(',')
                    .map(|field| {
                        field.trim().parse::<f64>().map_err(|e| {
                            MetaModelError::Data(format!(
                                "line {}: cannot parse '{}': {e}",
                                index + 1,
                                field.trim()
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(dimensions, rows)
    }

    /// Load a CSV file, one observation per line.
    pub fn load_csv(dimensions: usize, path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_csv(dimensions, &text)
    }

    /// Load a CSV file whose dimension count is taken from its first row.
    pub fn load_csv_inferred(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let dimensions = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.split(',').count())
            .ok_or_else(|| MetaModelError::Data("no observations in file".to_string()))?;
        Self::parse_csv(dimensions, &text)
    }

    /// `per_centre` observations scattered normally around each centre.
    pub fn gaussian_clusters<R: Rng>(
        centres: &[Vec<f64>],
        per_centre: usize,
        spread: f64,
        rng: &mut R,
    ) -> Result<Self> {
        let dimensions = centres.first().map_or(0, Vec::len);
        let noise = Normal::new(0.0, spread)?;
        let mut rows = Vec::with_capacity(centres.len() * per_centre);
        for centre in centres {
            for _ in 0..per_centre {
                rows.push(centre.iter().map(|c| c + noise.sample(rng)).collect());
            }
        }
        Self::new(dimensions, rows)
    }
}

impl Dataset for InMemoryDataset {
    fn dimension_count(&self) -> usize {
        self.dimensions
    }

    fn min_value(&self) -> f64 {
        self.min_value
    }

    fn value_range(&self) -> f64 {
        self.max_value - self.min_value
    }

    fn observations(&self) -> &[Observation] {
        &self.observations
    }
}
