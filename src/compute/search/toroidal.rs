//! Spatial evolution on a toroidal lattice.
//!
//! Every occupied site runs on its own: its occupant either dies, or asks
//! for one of its empty neighbours to be filled. A controller periodically
//! takes the whole request queue and fills each target that is still empty
//! with an offspring of the best individual next to it. Good genomes spread
//! across the world by local competition for space.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{MetaModelError, Result};
use crate::schema::ToroidalConfig;
use crate::space::{Individual, Occupancy, Space};

use super::{Strategy, fittest, rank};

/// What happened when a site ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// Nobody lives here.
    Vacant,
    Died,
    /// The occupant asked for an empty neighbour to be filled.
    Requested,
    /// No empty neighbour to spread into.
    Crowded,
}

/// Counters of a concurrent or stepped run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Full sweeps over a worker's sites, summed over workers.
    pub passes: u64,
    pub deaths: u64,
    pub requests: u64,
    pub replications: u64,
}

#[derive(Default)]
struct Counters {
    passes: AtomicU64,
    deaths: AtomicU64,
    requests: AtomicU64,
    replications: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: CellOutcome) {
        match outcome {
            CellOutcome::Died => self.deaths.fetch_add(1, Ordering::Relaxed),
            CellOutcome::Requested => self.requests.fetch_add(1, Ordering::Relaxed),
            CellOutcome::Vacant | CellOutcome::Crowded => 0,
        };
    }

    fn snapshot(&self) -> RunStats {
        RunStats {
            passes: self.passes.load(Ordering::Relaxed),
            deaths: self.deaths.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            replications: self.replications.load(Ordering::Relaxed),
        }
    }
}

/// A toroidal world of sites, each holding at most one individual.
pub struct Toroidal {
    world: Space,
    config: ToroidalConfig,
    requests: Mutex<Vec<Space>>,
}

fn occupant(site: &Space) -> Option<Individual> {
    site.first_child().and_then(Individual::from_space)
}

impl Toroidal {
    pub fn new(world: Space, config: ToroidalConfig) -> Result<Self> {
        if world.lattice().is_none() {
            return Err(MetaModelError::NotALattice(world.id()));
        }
        Ok(Self {
            world,
            config,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ToroidalConfig {
        &self.config
    }

    /// Put `individual` at `(x, y)` unless the site is taken.
    pub fn place(&self, x: usize, y: usize, individual: Individual) -> Result<bool> {
        self.world.cell(x, y)?.add_child_if_empty(individual.into_space())
    }

    /// Put `individual` on a random empty site. Answers false when the world is full.
    pub fn seed<R: Rng>(&self, individual: Individual, rng: &mut R) -> Result<bool> {
        match self.world.random_empty_cell(rng)? {
            Some(site) => site.add_child_if_empty(individual.into_space()),
            None => Ok(false),
        }
    }

    /// Individuals currently living in the world.
    pub fn occupants(&self) -> Vec<Individual> {
        self.world.children().iter().filter_map(occupant).collect()
    }

    /// Run one site: age its occupant, maybe kill it, otherwise ask for a
    /// random empty neighbour to be filled.
    pub fn run_cell<R: Rng>(&self, site: &Space, rng: &mut R) -> Result<CellOutcome> {
        let Some(individual) = occupant(site) else {
            return Ok(CellOutcome::Vacant);
        };
        let runs = site.increment_run_count();
        if self.should_die(runs, &individual, rng) {
            site.remove_child(individual.space());
            trace!("Individual {} died after {runs} runs", individual.id());
            return Ok(CellOutcome::Died);
        }
        let empty = site.site_neighbours(Occupancy::Empty)?;
        match empty.choose(rng) {
            Some(target) => {
                self.request_replication(target.clone());
                Ok(CellOutcome::Requested)
            }
            None => Ok(CellOutcome::Crowded),
        }
    }

    /// Whether an occupant whose site has run `runs` times dies now.
    ///
    /// Old age sets in once `runs` exceeds `min_run_count`, or
    /// `replication_multiplier` times the replication count when that is larger.
    pub fn should_die<R: Rng>(&self, runs: u64, individual: &Individual, rng: &mut R) -> bool {
        if !self.config.programmed_death {
            return false;
        }
        if self.config.death_by_old_age {
            let lifespan = self
                .config
                .min_run_count
                .max(self.config.replication_multiplier * individual.replication_count());
            runs > lifespan
        } else {
            rng.r#gen::<f64>() * self.config.death_chance_run_count < 1.0
        }
    }

    /// Queue `target` to be filled at the next drain.
    pub fn request_replication(&self, target: Space) {
        self.requests.lock().push(target);
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.lock().len()
    }

    /// Take every queued request and fill each target that is still empty
    /// with an offspring of its best occupied neighbour. Answers how many
    /// offspring were placed.
    pub fn drain(&self) -> Result<usize> {
        let requests = std::mem::take(&mut *self.requests.lock());
        let mut placed = 0;
        for target in requests {
            if !target.is_empty() {
                continue;
            }
            let parent = match best_neighbour(&target) {
                Ok(Some(parent)) => parent,
                Ok(None) => continue,
                Err(err) => {
                    warn!("Skipping replication into {:?}: {err}", target.position());
                    continue;
                }
            };
            if self.replicate_into(&target, &parent)? {
                placed += 1;
            }
        }
        if placed > 0 {
            debug!("Drain placed {placed} offspring");
        }
        Ok(placed)
    }

    /// Place an offspring of `parent` at `target` if it is still empty.
    pub fn replicate_into(&self, target: &Space, parent: &Individual) -> Result<bool> {
        let child = parent.replicate()?;
        target.add_child_if_empty(child.into_space())
    }

    /// Run every site once in order, then drain.
    pub fn step<R: Rng>(&self, rng: &mut R) -> Result<RunStats> {
        let counters = Counters::default();
        for site in self.world.children() {
            counters.record(self.run_cell(&site, rng)?);
        }
        counters.passes.fetch_add(1, Ordering::Relaxed);
        let placed = self.drain()?;
        counters.replications.fetch_add(placed as u64, Ordering::Relaxed);
        Ok(counters.snapshot())
    }

    /// Run the world concurrently for `duration`.
    ///
    /// Sites are split into `workers` disjoint slices, each swept by its own
    /// thread, while a controller thread drains the request queue. A final
    /// drain runs after every thread has stopped.
    pub fn run_for(&self, duration: Duration, workers: usize) -> Result<RunStats> {
        let sites = self.world.children();
        let workers = workers.clamp(1, sites.len().max(1));
        let chunk = sites.len().div_ceil(workers).max(1);
        let deadline = Instant::now() + duration;
        let cell_pause = Duration::from_micros(self.config.cell_interval_micros);
        let drain_pause = Duration::from_micros(self.config.drain_interval_micros);
        let counters = Counters::default();
        let counters = &counters;

        info!(
            "Running {} sites on {workers} workers for {duration:?}",
            sites.len()
        );
        thread::scope(|scope| -> Result<()> {
            let mut handles = Vec::with_capacity(workers + 1);
            for cells in sites.chunks(chunk) {
                handles.push(scope.spawn(move || -> Result<()> {
                    let mut rng = rand::thread_rng();
                    while Instant::now() < deadline {
                        for site in cells {
                            counters.record(self.run_cell(site, &mut rng)?);
                        }
                        counters.passes.fetch_add(1, Ordering::Relaxed);
                        thread::sleep(cell_pause);
                    }
                    Ok(())
                }));
            }
            handles.push(scope.spawn(move || -> Result<()> {
                while Instant::now() < deadline {
                    let placed = self.drain()?;
                    counters.replications.fetch_add(placed as u64, Ordering::Relaxed);
                    thread::sleep(drain_pause);
                }
                Ok(())
            }));
            for handle in handles {
                handle
                    .join()
                    .map_err(|_| MetaModelError::Worker("site worker panicked".to_string()))??;
            }
            Ok(())
        })?;

        let placed = self.drain()?;
        counters.replications.fetch_add(placed as u64, Ordering::Relaxed);
        let stats = counters.snapshot();
        info!(
            "Run finished with {} occupied sites: {stats:?}",
            self.world.occupied_count()
        );
        Ok(stats)
    }
}

/// The fittest individual on a site next to `site`.
fn best_neighbour(site: &Space) -> Result<Option<Individual>> {
    let candidates: Vec<Individual> = site
        .site_neighbours(Occupancy::Occupied)?
        .iter()
        .filter_map(occupant)
        .collect();
    Ok(fittest(candidates)?.map(|ranked| ranked.individual))
}

impl Strategy for Toroidal {
    fn name(&self) -> &'static str {
        "toroidal"
    }

    /// Synchronous pass: the worst half dies, then every empty site next
    /// to a survivor receives an offspring of its best neighbour.
    fn search(&mut self) -> Result<Option<Individual>> {
        let ranked = rank(self.occupants())?;
        if ranked.is_empty() {
            return Err(MetaModelError::PopulationTooSmall(0));
        }
        let cull = ranked.len() / 2;
        for worst in ranked.iter().rev().take(cull) {
            if let Some(site) = worst.individual.space().parent() {
                site.remove_child(worst.individual.space());
            }
        }

        let mut plan = Vec::new();
        for site in self.world.children().into_iter().filter(Space::is_empty) {
            if let Some(parent) = best_neighbour(&site)? {
                plan.push((site, parent));
            }
        }
        for (site, parent) in &plan {
            self.replicate_into(site, parent)?;
        }
        debug!(
            "Toroidal pass culled {cull} and refilled {} sites",
            plan.len()
        );
        self.best()
    }

    fn best(&self) -> Result<Option<Individual>> {
        Ok(fittest(self.occupants())?.map(|ranked| ranked.individual))
    }

    fn individual_count(&self) -> usize {
        self.world.occupied_count()
    }

    fn space(&self) -> &Space {
        &self.world
    }
}
