//! The search loop: repeats strategy passes until a budget or target is hit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::info;

use crate::error::Result;
use crate::schema::SearchConfig;
use crate::space::Individual;

use super::Strategy;

/// Why a search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The best cost reached the configured target.
    TargetReached,
    /// The best individual reached the generation limit.
    MaxGenerations,
    MaxIterations,
    /// Stopped through the cancel handle.
    Cancelled,
    /// A pass left no individual alive.
    Extinct,
}

/// Snapshot handed to the progress callback after every pass.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    pub iteration: u64,
    pub best_fitness: f64,
    pub best_generation: u32,
    pub population: usize,
    pub elapsed_seconds: f64,
}

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: Option<Individual>,
    pub iterations: u64,
    pub stop_reason: StopReason,
    pub elapsed_seconds: f64,
}

/// Drives a strategy until the target cost, the generation limit or the
/// iteration budget is reached. Conditions are polled once per pass.
pub struct SearchLoop<S: Strategy> {
    strategy: S,
    config: SearchConfig,
    cancelled: Arc<AtomicBool>,
}

impl<S: Strategy> SearchLoop<S> {
    pub fn new(strategy: S, config: SearchConfig) -> Self {
        Self {
            strategy,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn into_strategy(self) -> S {
        self.strategy
    }

    fn should_stop(&self, best: &Individual, iteration: u64) -> Result<Option<StopReason>> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Ok(Some(StopReason::Cancelled));
        }
        if let Some(target) = self.config.target_fitness
            && best.fitness()? <= target
        {
            return Ok(Some(StopReason::TargetReached));
        }
        if best.generation() >= self.config.max_generations {
            return Ok(Some(StopReason::MaxGenerations));
        }
        if iteration >= self.config.max_iterations {
            return Ok(Some(StopReason::MaxIterations));
        }
        Ok(None)
    }

    fn progress(&self, best: &Individual, iteration: u64, start: Instant) -> Result<SearchProgress> {
        Ok(SearchProgress {
            iteration,
            best_fitness: best.fitness()?,
            best_generation: best.generation(),
            population: self.strategy.individual_count(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Run the search, calling `callback` after every pass.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> Result<SearchOutcome>
    where
        F: FnMut(&SearchProgress),
    {
        let start = Instant::now();
        let report_interval = self.config.report_interval.max(1);
        let mut best = self.strategy.best()?;
        let mut iteration = 0;

        info!(
            "Starting {} search over {} individuals",
            self.strategy.name(),
            self.strategy.individual_count()
        );
        let stop_reason = loop {
            let Some(current) = best.as_ref() else {
                break StopReason::Extinct;
            };
            if let Some(reason) = self.should_stop(current, iteration)? {
                break reason;
            }

            best = self.strategy.search()?;
            iteration += 1;

            if let Some(current) = best.as_ref() {
                let progress = self.progress(current, iteration, start)?;
                if iteration % report_interval == 0 {
                    info!(
                        "Iteration {}: best cost {:.6}, generation {}, {} individuals",
                        progress.iteration,
                        progress.best_fitness,
                        progress.best_generation,
                        progress.population
                    );
                }
                callback(&progress);
            }
        };

        let elapsed_seconds = start.elapsed().as_secs_f64();
        info!("Search stopped after {iteration} iterations ({stop_reason:?}) in {elapsed_seconds:.2}s");
        Ok(SearchOutcome {
            best,
            iterations: iteration,
            stop_reason,
            elapsed_seconds,
        })
    }

    /// Run the search (blocking).
    pub fn run(&mut self) -> Result<SearchOutcome> {
        self.run_with_callback(|_| {})
    }
}
