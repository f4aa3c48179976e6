//! The cluster calculator: the fitness machine of a clustering genome.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::trace;

use crate::error::{MetaModelError, Result};
use crate::genome::GenomeSegment;
use crate::machine::{Activation, FitnessCalculator, Machine, Output};
use crate::space::Dataset;

use super::CorePoint;

#[derive(Debug)]
struct Evaluation {
    cost: f64,
    core_points: Vec<CorePoint>,
}

/// Builds core points from its genome and scores them against the dataset
/// reachable from the individual it lives in.
///
/// The cost is the summed mismatch of every observation to its nearest core
/// point; a genome describing no core points costs `+inf`.
#[derive(Debug)]
pub struct ClusterCalculator {
    segment: GenomeSegment,
    evaluation: OnceLock<Evaluation>,
}

impl ClusterCalculator {
    pub fn new(segment: GenomeSegment) -> Self {
        Self {
            segment,
            evaluation: OnceLock::new(),
        }
    }

    /// Core points with their assigned observations, ordered by id.
    pub fn core_points(&self) -> Result<&[CorePoint]> {
        Ok(&self.evaluation()?.core_points)
    }

    pub fn cost(&self) -> Result<f64> {
        Ok(self.evaluation()?.cost)
    }

    fn evaluation(&self) -> Result<&Evaluation> {
        if let Some(evaluation) = self.evaluation.get() {
            return Ok(evaluation);
        }
        let evaluation = self.evaluate()?;
        Ok(self.evaluation.get_or_init(|| evaluation))
    }

    fn evaluate(&self) -> Result<Evaluation> {
        let environment = self
            .segment
            .environment()
            .ok_or_else(|| MetaModelError::NoEnvironment(self.segment.gene_type().name().to_string()))?;
        let dataset = environment
            .dataset()
            .ok_or(MetaModelError::NoDataset(environment.id()))?;

        let mut points: BTreeMap<u32, CorePoint> = BTreeMap::new();
        for unit in self.segment.code() {
            let gene = unit.point()?;
            points
                .entry(gene.core_point)
                .or_insert_with(|| CorePoint::new(gene.core_point))
                .add_contribution(gene.dimension as usize, gene.value);
        }
        let mut core_points: Vec<CorePoint> = points.into_values().collect();
        if core_points.is_empty() {
            return Ok(Evaluation {
                cost: f64::INFINITY,
                core_points,
            });
        }

        assign_observations(&mut core_points, dataset.as_ref());
        let cost = core_points.iter().map(CorePoint::total_mismatch).sum();
        trace!(
            "Clustering of {} units has {} core points, cost {cost}",
            self.segment.len(),
            core_points.len()
        );
        Ok(Evaluation { cost, core_points })
    }
}

/// Attach every observation to the core point it mismatches least.
fn assign_observations(core_points: &mut [CorePoint], dataset: &dyn Dataset) {
    for observation in dataset.observations() {
        let mut best: Option<(usize, f64)> = None;
        for (index, point) in core_points.iter().enumerate() {
            let mismatch = point.mismatch(observation);
            if best.is_none_or(|(_, lowest)| mismatch < lowest) {
                best = Some((index, mismatch));
            }
        }
        if let Some((index, mismatch)) = best {
            core_points[index].assign(mismatch);
        }
    }
}

impl Machine for ClusterCalculator {
    fn segment(&self) -> &GenomeSegment {
        &self.segment
    }

    fn act(&self, _activation: Activation<'_>) -> Result<Output> {
        Ok(Output::Fitness(self.cost()?))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_fitness(&self) -> Option<&dyn FitnessCalculator> {
        Some(self)
    }

    /// Core points, most populated first, then the expressed genome.
    fn describe(&self) -> String {
        let mut text = String::new();
        if let Some(evaluation) = self.evaluation.get() {
            let mut points: Vec<&CorePoint> = evaluation.core_points.iter().collect();
            points.sort_by(|a, b| b.observation_count().cmp(&a.observation_count()));
            for point in points {
                text.push_str(&format!("-[{point}]: "));
            }
        }
        text.push_str("///: ");
        text.push_str(&self.segment.to_string());
        text
    }
}

impl FitnessCalculator for ClusterCalculator {
    fn fitness(&self) -> Result<f64> {
        self.cost()
    }
}
