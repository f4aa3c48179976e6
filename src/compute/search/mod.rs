//! Population strategies and the loop that drives them.
//!
//! A strategy owns a space full of individuals and improves it one pass at
//! a time. Fitness is a cost: lower is better, and ties and NaNs are ordered
//! with [`f64::total_cmp`].

mod driver;
mod elitist;
mod microbial;
mod toroidal;

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::Result;
use crate::space::{Individual, Space};

pub use driver::*;
pub use elitist::*;
pub use microbial::*;
pub use toroidal::*;

/// A space that can be searched for good individuals.
pub trait Strategy: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run one selection/replication pass and answer the best individual.
    fn search(&mut self) -> Result<Option<Individual>>;

    /// The current best individual, without changing the population.
    fn best(&self) -> Result<Option<Individual>>;

    fn individual_count(&self) -> usize;

    /// The space holding the population.
    fn space(&self) -> &Space;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn search(&mut self) -> Result<Option<Individual>> {
        (**self).search()
    }

    fn best(&self) -> Result<Option<Individual>> {
        (**self).best()
    }

    fn individual_count(&self) -> usize {
        (**self).individual_count()
    }

    fn space(&self) -> &Space {
        (**self).space()
    }
}

/// An individual paired with its fitness.
#[derive(Debug, Clone)]
pub struct Ranked {
    pub fitness: f64,
    pub individual: Individual,
}

/// Evaluate every individual in parallel and sort best first.
pub fn rank(individuals: Vec<Individual>) -> Result<Vec<Ranked>> {
    let mut ranked = individuals
        .into_par_iter()
        .map(|individual| {
            Ok(Ranked {
                fitness: individual.fitness()?,
                individual,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    ranked.par_sort_by(compare);
    Ok(ranked)
}

/// The fittest of `individuals`, evaluated in parallel.
pub fn fittest(individuals: Vec<Individual>) -> Result<Option<Ranked>> {
    let ranked = individuals
        .into_par_iter()
        .map(|individual| {
            Ok(Ranked {
                fitness: individual.fitness()?,
                individual,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ranked.into_iter().min_by(compare))
}

fn compare(a: &Ranked, b: &Ranked) -> Ordering {
    a.fitness.total_cmp(&b.fitness)
}
