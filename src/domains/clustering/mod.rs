//! Subspace clustering domain.
//!
//! A clustering is an individual whose fitness genome is a ring of point
//! units `(core_point, dimension, value)`. Units naming the same core point
//! add up to that point's coordinates in the subspace of dimensions they
//! mention. The genome mutates through the full rearrangement pipeline,
//! with rates read from a self-mutating four-rate kloner.

mod calculator;
mod core_point;

use std::sync::Arc;

use rand::Rng;

use crate::compute::{
    MutationRates, PointBounds, carried_rates, mutate_genome, rate_carrier_code, rate_carrier_mutator,
};
use crate::error::{MetaModelError, Result};
use crate::genome::{GeneType, GeneUnit, GenomeSegment, Payload, PointGene};
use crate::machine::{Capability, Kloner, Machine, MachineKind, MachineRegistry, downcast};
use crate::schema::{ClusteringConfig, EngineConfig, MutationConfig};
use crate::space::{Dataset, Individual, Space};

use super::CoreTypes;

pub use calculator::*;
pub use core_point::*;

/// Registry name of the cluster calculator.
pub const CLUSTER_KIND: &str = "cluster calculator";

/// Gene types and founders of the clustering domain.
pub struct ClusteringDomain {
    core: CoreTypes,
    clusterer: Arc<GeneType>,
    kloner: Arc<GeneType>,
    dataset: Arc<dyn Dataset>,
    bounds: PointBounds,
    initial_rates: MutationRates,
    min_initial_units: usize,
    max_initial_units: usize,
}

impl ClusteringDomain {
    pub fn new(
        dataset: Arc<dyn Dataset>,
        clustering: &ClusteringConfig,
        mutation: &MutationConfig,
    ) -> Result<Self> {
        if let Some(dimensions) = clustering.dimensions
            && dimensions != dataset.dimension_count()
        {
            return Err(MetaModelError::Data(format!(
                "dataset has {} dimensions, configuration expects {dimensions}",
                dataset.dimension_count()
            )));
        }
        let bounds = PointBounds {
            core_points: clustering.core_points,
            dimensions: dataset.dimension_count() as u32,
            min_value: dataset.min_value(),
            value_range: dataset.value_range(),
        };

        let mut registry = MachineRegistry::with_builtins();
        registry.register(
            MachineKind::Named(CLUSTER_KIND.to_string()),
            Capability::Fitness,
            false,
            |segment| Ok(Arc::new(ClusterCalculator::new(segment)) as Arc<dyn Machine>),
        );

        let clusterer = GeneType::builder("clusterer", MachineKind::Named(CLUSTER_KIND.to_string()))
            .mutator(move |code: &[GeneUnit], kloner: &Kloner| {
                let rates = carried_rates(kloner)?;
                Ok(mutate_genome(code, &rates, &bounds, &mut rand::thread_rng())?.code)
            })
            .build(&registry)?;
        let kloner = GeneType::builder("rate kloner", MachineKind::Kloner)
            .shared_mutator(rate_carrier_mutator(mutation.mutation_amount))
            .build(&registry)?;

        Ok(Self {
            core: CoreTypes::new(&registry)?,
            clusterer,
            kloner,
            dataset,
            bounds,
            initial_rates: MutationRates {
                deletion: mutation.deletion_rate,
                duplication: mutation.duplication_rate,
                translocation: mutation.translocation_rate,
                point: mutation.point_rate,
            },
            min_initial_units: clustering.min_initial_units,
            max_initial_units: clustering.max_initial_units.max(clustering.min_initial_units),
        })
    }

    pub fn from_config(dataset: Arc<dyn Dataset>, config: &EngineConfig) -> Result<Self> {
        Self::new(dataset, &config.clustering, &config.mutation)
    }

    pub fn dataset(&self) -> &Arc<dyn Dataset> {
        &self.dataset
    }

    pub fn bounds(&self) -> &PointBounds {
        &self.bounds
    }

    pub fn core_types(&self) -> &CoreTypes {
        &self.core
    }

    pub fn clusterer_type(&self) -> &Arc<GeneType> {
        &self.clusterer
    }

    pub fn kloner_type(&self) -> &Arc<GeneType> {
        &self.kloner
    }

    /// A container offering this domain's dataset to the clusterings inside it.
    pub fn population_space(&self) -> Space {
        Space::with_dataset(Arc::clone(&self.dataset))
    }

    /// A toroidal world offering this domain's dataset.
    pub fn toroidal_space(&self, x_size: usize, y_size: usize) -> Space {
        Space::toroidal(x_size, y_size, Some(Arc::clone(&self.dataset)))
    }

    /// A point unit with every field drawn uniformly.
    pub fn random_unit<R: Rng>(&self, rng: &mut R) -> GeneUnit {
        let gene = PointGene {
            core_point: rng.gen_range(0..self.bounds.core_points.max(1)),
            dimension: rng.gen_range(0..self.bounds.dimensions.max(1)),
            value: rng.r#gen::<f64>() * self.bounds.value_range + self.bounds.min_value,
        };
        GeneUnit::new(&self.clusterer, Payload::Point(gene)).with_coding(rng.r#gen::<bool>())
    }

    /// A random genome with a length between the configured bounds.
    pub fn random_genome<R: Rng>(&self, rng: &mut R) -> Vec<GeneUnit> {
        let len = rng.gen_range(self.min_initial_units..=self.max_initial_units);
        (0..len).map(|_| self.random_unit(rng)).collect()
    }

    /// Rate carrier holding the configured initial rates.
    pub fn kloner_code(&self) -> Vec<GeneUnit> {
        rate_carrier_code(&self.kloner, &self.initial_rates)
    }

    /// A founder clustering with `genome`, placed in `container` if given.
    pub fn clustering(&self, container: Option<&Space>, genome: Vec<GeneUnit>) -> Result<Individual> {
        let clustering = self.core.founder(None)?;
        clustering.add_template(GenomeSegment::detached(self.kloner_code(), &self.kloner)?);
        clustering.add_template(GenomeSegment::detached(genome, &self.clusterer)?);
        if let Some(container) = container {
            container.add_child(clustering.space().clone())?;
        }
        Ok(clustering)
    }

    pub fn random_clustering<R: Rng>(&self, container: Option<&Space>, rng: &mut R) -> Result<Individual> {
        let genome = self.random_genome(rng);
        self.clustering(container, genome)
    }

    /// `count` random clusterings placed in `container`.
    pub fn populate<R: Rng>(&self, container: &Space, count: usize, rng: &mut R) -> Result<Vec<Individual>> {
        (0..count)
            .map(|_| self.random_clustering(Some(container), rng))
            .collect()
    }

    /// One-line summary: generation, replications, genome sizes, core points,
    /// carried rates and cost, followed by the calculator's description.
    pub fn describe(clustering: &Individual) -> Result<String> {
        let calculator = clustering.locate(Capability::Fitness)?;
        let calculator = downcast::<ClusterCalculator>(calculator.as_ref())?;
        let kloner = clustering.locate(Capability::Kloner)?;
        let rates = carried_rates(downcast::<Kloner>(kloner.as_ref())?)?;
        let cost = calculator.cost()?;
        Ok(format!(
            "Clustering[{},{},{},{},{},{:.8},{:.8},{:.8},{:.8},{:.8}]{}",
            clustering.generation(),
            clustering.replication_count(),
            clustering.total_code_size(Capability::Fitness),
            calculator.segment().len(),
            calculator.core_points()?.len(),
            rates.deletion,
            rates.duplication,
            rates.translocation,
            rates.point,
            cost,
            calculator.describe()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::InMemoryDataset;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset() -> Arc<dyn Dataset> {
        Arc::new(
            InMemoryDataset::new(
                2,
                vec![vec![0.1, 0.1], vec![0.2, 0.1], vec![0.9, 0.8], vec![0.8, 0.9]],
            )
            .unwrap(),
        )
    }

    fn domain() -> ClusteringDomain {
        let clustering = ClusteringConfig {
            min_initial_units: 20,
            max_initial_units: 40,
            ..ClusteringConfig::default()
        };
        ClusteringDomain::new(dataset(), &clustering, &MutationConfig::default()).unwrap()
    }

    fn point(domain: &ClusteringDomain, core_point: u32, dimension: u32, value: f64) -> GeneUnit {
        GeneUnit::new(
            domain.clusterer_type(),
            Payload::Point(PointGene {
                core_point,
                dimension,
                value,
            }),
        )
    }

    #[test]
    fn test_two_centres_beat_one() {
        let domain = domain();
        let world = domain.population_space();
        let one = domain
            .clustering(Some(&world), vec![point(&domain, 0, 0, 0.5), point(&domain, 0, 1, 0.5)])
            .unwrap();
        let two = domain
            .clustering(
                Some(&world),
                vec![
                    point(&domain, 0, 0, 0.15),
                    point(&domain, 0, 1, 0.1),
                    point(&domain, 1, 0, 0.85),
                    point(&domain, 1, 1, 0.85),
                ],
            )
            .unwrap();
        assert!(two.fitness().unwrap() < one.fitness().unwrap());

        let machine = two.locate(Capability::Fitness).unwrap();
        let calculator = downcast::<ClusterCalculator>(machine.as_ref()).unwrap();
        let points = calculator.core_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].observation_count(), 2);
        assert_eq!(points[1].observation_count(), 2);
    }

    #[test]
    fn test_units_add_up_on_shared_dimensions() {
        let domain = domain();
        let world = domain.population_space();
        let clustering = domain
            .clustering(
                Some(&world),
                vec![point(&domain, 0, 0, 0.25), point(&domain, 0, 0, 0.25), point(&domain, 0, 1, 0.5)],
            )
            .unwrap();
        let machine = clustering.locate(Capability::Fitness).unwrap();
        let calculator = downcast::<ClusterCalculator>(machine.as_ref()).unwrap();
        assert_eq!(calculator.core_points().unwrap()[0].coordinate(0), Some(0.5));
    }

    #[test]
    fn test_non_coding_genome_costs_infinity() {
        let domain = domain();
        let world = domain.population_space();
        let clustering = domain
            .clustering(Some(&world), vec![point(&domain, 0, 0, 0.5).with_coding(false)])
            .unwrap();
        assert_eq!(clustering.fitness().unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_clustering_outside_a_dataset_fails() {
        let domain = domain();
        let orphan = domain.clustering(None, vec![point(&domain, 0, 0, 0.5)]).unwrap();
        assert!(matches!(orphan.fitness(), Err(MetaModelError::NoDataset(_))));
    }

    #[test]
    fn test_random_units_respect_bounds() {
        let domain = domain();
        let mut rng = StdRng::seed_from_u64(21);
        let genome = domain.random_genome(&mut rng);
        assert!((20..=40).contains(&genome.len()));
        for unit in &genome {
            let gene = unit.point().unwrap();
            assert!(gene.core_point < 8);
            assert!(gene.dimension < 2);
            assert!((0.1..0.9).contains(&gene.value));
        }
        assert!(genome.iter().any(GeneUnit::is_coding));
        assert!(genome.iter().any(|u| !u.is_coding()));
    }

    #[test]
    fn test_offspring_are_scored_in_the_same_world() {
        let domain = domain();
        let world = domain.population_space();
        let mut rng = StdRng::seed_from_u64(22);
        let parent = domain.random_clustering(Some(&world), &mut rng).unwrap();
        let child = parent.replicate().unwrap();
        world.add_child(child.space().clone()).unwrap();
        assert!(child.fitness().unwrap() >= 0.0);
        assert_eq!(child.generation(), 1);

        let summary = ClusteringDomain::describe(&child).unwrap();
        assert!(summary.starts_with("Clustering[1,0,"), "{summary}");
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let clustering = ClusteringConfig {
            dimensions: Some(3),
            ..ClusteringConfig::default()
        };
        assert!(ClusteringDomain::new(dataset(), &clustering, &MutationConfig::default()).is_err());
    }
}
