//! Microbial tournament: two contestants, the loser is replaced by the winner's offspring.

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{MetaModelError, Result};
use crate::space::{Individual, Space};

use super::{Strategy, fittest};

/// One tournament per pass between two distinct random individuals.
pub struct Microbial {
    space: Space,
    rng: StdRng,
}

impl Microbial {
    pub fn new(space: Space, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { space, rng }
    }

    /// Two distinct indices below `size`.
    fn contestants(&mut self, size: usize) -> (usize, usize) {
        let first = self.rng.gen_range(0..size);
        let mut second = self.rng.gen_range(0..size - 1);
        if second >= first {
            second += 1;
        }
        (first, second)
    }
}

impl Strategy for Microbial {
    fn name(&self) -> &'static str {
        "microbial"
    }

    fn search(&mut self) -> Result<Option<Individual>> {
        let population = self.space.individuals();
        let size = population.len();
        if size < 2 {
            return Err(MetaModelError::PopulationTooSmall(size));
        }
        let before = self.space.child_count();

        let (first, second) = self.contestants(size);
        let (a, b) = (&population[first], &population[second]);
        let (winner, loser) = if a.fitness()?.total_cmp(&b.fitness()?).is_lt() {
            (a, b)
        } else {
            (b, a)
        };

        let child = winner.replicate()?;
        self.space.remove_child(loser.space());
        self.space.add_child(child.space().clone())?;

        let after = self.space.child_count();
        if after != before {
            return Err(MetaModelError::PopulationChanged { before, after });
        }
        trace!("Microbial tournament: {} replaces {}", winner.id(), loser.id());
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

    #[test]
    fn test_tournament_preserves_population_size() {
        let domain =
            TspDomain::new(CityMap::on_circle(10).unwrap(), RouteMutation::CarriedKOpt, TspConfig::default())
                .unwrap();
        let world = Space::container();
        let mut rng = StdRng::seed_from_u64(41);
        domain.populate(&world, 8, &mut rng).unwrap();

        let mut strategy = Microbial::new(world, Some(7));
        for _ in 0..30 {
            strategy.search().unwrap();
            assert_eq!(strategy.individual_count(), 8);
        }
    }

    #[test]
    fn test_loser_is_replaced_by_winner_copy() {
        let domain =
            TspDomain::new(CityMap::on_circle(6).unwrap(), RouteMutation::Exact, TspConfig::default()).unwrap();
        let world = Space::container();
        let good = domain
            .journey(Some(&world), domain.route(&["c0", "c1", "c2", "c3", "c4", "c5"]).unwrap())
            .unwrap();
        let bad = domain
            .journey(Some(&world), domain.route(&["c0", "c3", "c1", "c4", "c2", "c5"]).unwrap())
            .unwrap();

        let mut strategy = Microbial::new(world.clone(), Some(1));
        let best = strategy.search().unwrap().unwrap();
        assert_eq!(best.fitness().unwrap(), good.fitness().unwrap());
        assert!(world.children().contains(good.space()));
        assert!(!world.children().contains(bad.space()));
        assert_eq!(world.child_count(), 2);
    }

    #[test]
    fn test_contestants_are_distinct() {
        let mut strategy = Microbial::new(Space::container(), Some(3));
        for _ in 0..200 {
            let (a, b) = strategy.contestants(2);
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_single_individual_is_too_small() {
        let domain =
            TspDomain::new(CityMap::on_circle(4).unwrap(), RouteMutation::Exact, TspConfig::default()).unwrap();
        let world = Space::container();
        let mut rng = StdRng::seed_from_u64(5);
        domain.populate(&world, 1, &mut rng).unwrap();
        let mut strategy = Microbial::new(world, None);
        assert!(matches!(
            strategy.search(),
            Err(MetaModelError::PopulationTooSmall(1))
        ));
    }
}
