//! Truncation selection: the best fraction survives and refills the population.

use log::debug;
use rayon::prelude::*;

use crate::error::{MetaModelError, Result};
use crate::space::{Individual, Space};

use super::{Strategy, fittest, rank};

/// Keeps the best `1 / proportion` of the population each pass; every
/// survivor replicates `proportion - 1` times to restore the size.
///
/// When the population does not divide evenly, the best survivors replicate
/// once more each so the size is still preserved.
pub struct Elitist {
    space: Space,
    proportion: usize,
}

impl Elitist {
    pub fn new(space: Space, proportion: usize) -> Self {
        Self {
            space,
            proportion: proportion.max(1),
        }
    }

    pub fn proportion(&self) -> usize {
        self.proportion
    }
}

impl Strategy for Elitist {
    fn name(&self) -> &'static str {
        "elitist"
    }

    fn search(&mut self) -> Result<Option<Individual>> {
        let size = self.space.child_count();
        if size < self.proportion {
            return Err(MetaModelError::PopulationTooSmall(size));
        }
        let survivors = size / self.proportion;
        let extra = size - survivors * self.proportion;

        let ranked = rank(self.space.individuals())?;
        for culled in &ranked[survivors..] {
            self.space.remove_child(culled.individual.space());
        }

        let (space, proportion) = (&self.space, self.proportion);
        ranked[..survivors]
            .par_iter()
            .enumerate()
            .try_for_each(|(place, parent)| -> Result<()> {
                let copies = proportion - 1 + usize::from(place < extra);
                for _ in 0..copies {
                    let child = parent.individual.replicate()?;
                    space.add_child(child.into_space())?;
                }
                Ok(())
            })?;

        let after = self.space.child_count();
        if after != size {
            return Err(MetaModelError::PopulationChanged { before: size, after });
        }
        debug!(
            "Elitist pass kept {survivors} of {size}, best before replication {:?}",
            ranked.first().map(|r| r.fitness)
        );
        self.best()
    }

    fn best(&self) -> Result<Option<Individual>> {
        Ok(fittest(self.space.individuals())?.map(|ranked| ranked.individual))
    }

    fn individual_count(&self) -> usize {
        self.space.child_count()
    }

    fn space(&self) -> &Space {
        &self.space
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tsp::{CityMap, RouteMutation, TspDomain};
    use crate::schema::TspConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ring(count: usize) -> CityMap {
        CityMap::on_circle(count).unwrap()
    }

    #[test]
    fn test_pass_preserves_population_size() {
        let domain = TspDomain::new(ring(12), RouteMutation::CarriedKOpt, TspConfig::default()).unwrap();
        let world = Space::container();
        let mut rng = StdRng::seed_from_u64(31);
        domain.populate(&world, 20, &mut rng).unwrap();

        let mut strategy = Elitist::new(world.clone(), 2);
        let initial = strategy.best().unwrap().unwrap().fitness().unwrap();
        for _ in 0..5 {
            let best = strategy.search().unwrap().unwrap();
            assert_eq!(strategy.individual_count(), 20);
            assert!(best.fitness().unwrap() <= initial + 1e-9);
        }
    }

    #[test]
    fn test_uneven_population_keeps_its_size() {
        let domain = TspDomain::new(ring(8), RouteMutation::FixedKOpt(3), TspConfig::default()).unwrap();
        let world = Space::container();
        let mut rng = StdRng::seed_from_u64(32);
        domain.populate(&world, 10, &mut rng).unwrap();

        let mut strategy = Elitist::new(world, 3);
        strategy.search().unwrap();
        assert_eq!(strategy.individual_count(), 10);
    }

    #[test]
    fn test_survivors_are_the_best() {
        let domain = TspDomain::new(ring(6), RouteMutation::Exact, TspConfig::default()).unwrap();
        let world = Space::container();
        let good = domain
            .journey(Some(&world), domain.route(&["c0", "c1", "c2", "c3", "c4", "c5"]).unwrap())
            .unwrap();
        domain
            .journey(Some(&world), domain.route(&["c0", "c3", "c1", "c4", "c2", "c5"]).unwrap())
            .unwrap();

        let mut strategy = Elitist::new(world.clone(), 2);
        strategy.search().unwrap();
        assert_eq!(world.child_count(), 2);
        assert!(world.children().contains(good.space()));
        for individual in world.individuals() {
            assert_eq!(individual.fitness().unwrap(), good.fitness().unwrap());
        }
    }

    #[test]
    fn test_too_small_population() {
        let mut strategy = Elitist::new(Space::container(), 2);
        assert!(matches!(
            strategy.search(),
            Err(MetaModelError::PopulationTooSmall(0))
        ));
    }
}
