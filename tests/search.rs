//! End-to-end searches over both reference domains.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use machina::compute::search::{Elitist, Microbial, SearchLoop, StopReason, Strategy, Toroidal};
use machina::domains::clustering::ClusteringDomain;
use machina::domains::tsp::{CityMap, RouteMutation, TspDomain};
use machina::schema::{EngineConfig, SearchConfig, ToroidalConfig, TspConfig};
use machina::space::{Dataset, InMemoryDataset, Space};

fn blobs(rng: &mut StdRng) -> Arc<dyn Dataset> {
    let centres = vec![vec![0.2, 0.3], vec![0.8, 0.7]];
    Arc::new(InMemoryDataset::gaussian_clusters(&centres, 15, 0.03, rng).unwrap())
}

fn clustering_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.clustering.core_points = 4;
    config.clustering.min_initial_units = 10;
    config.clustering.max_initial_units = 30;
    config
}

#[test]
fn elitist_clustering_keeps_population_and_improves() {
    let mut rng = StdRng::seed_from_u64(101);
    let domain = ClusteringDomain::from_config(blobs(&mut rng), &clustering_config()).unwrap();
    let world = domain.population_space();
    domain.populate(&world, 24, &mut rng).unwrap();

    let mut strategy = Elitist::new(world, 3);
    let initial = strategy.best().unwrap().unwrap().fitness().unwrap();
    for _ in 0..10 {
        let best = strategy.search().unwrap().unwrap();
        assert_eq!(strategy.individual_count(), 24);
        assert!(best.fitness().unwrap() <= initial);
    }
}

#[test]
fn microbial_clustering_keeps_population() {
    let mut rng = StdRng::seed_from_u64(102);
    let domain = ClusteringDomain::from_config(blobs(&mut rng), &clustering_config()).unwrap();
    let world = domain.population_space();
    domain.populate(&world, 10, &mut rng).unwrap();

    let mut strategy = Microbial::new(world, Some(5));
    for _ in 0..50 {
        strategy.search().unwrap();
        assert_eq!(strategy.individual_count(), 10);
    }
    let summary = ClusteringDomain::describe(&strategy.best().unwrap().unwrap()).unwrap();
    assert!(summary.starts_with("Clustering["));
}

#[test]
fn single_seed_diffuses_over_the_lattice() {
    let mut rng = StdRng::seed_from_u64(103);
    let domain = ClusteringDomain::from_config(blobs(&mut rng), &clustering_config()).unwrap();
    let config = ToroidalConfig {
        programmed_death: false,
        cell_interval_micros: 100,
        drain_interval_micros: 100,
        ..ToroidalConfig::default()
    };
    let strategy = Toroidal::new(domain.toroidal_space(9, 9), config).unwrap();
    let founder = domain.random_clustering(None, &mut rng).unwrap();
    assert!(strategy.place(0, 0, founder).unwrap());

    strategy.run_for(Duration::from_millis(500), 4).unwrap();
    assert!(strategy.individual_count() > 10);
    for individual in strategy.occupants() {
        assert!(individual.fitness().unwrap() >= 0.0);
    }
}

#[test]
fn toroidal_search_loop_runs_to_budget() {
    let mut rng = StdRng::seed_from_u64(104);
    let domain = ClusteringDomain::from_config(blobs(&mut rng), &clustering_config()).unwrap();
    let strategy = Toroidal::new(domain.toroidal_space(5, 5), ToroidalConfig::default()).unwrap();
    for _ in 0..6 {
        strategy
            .seed(domain.random_clustering(None, &mut rng).unwrap(), &mut rng)
            .unwrap();
    }

    let config = SearchConfig {
        max_iterations: 5,
        ..SearchConfig::default()
    };
    let mut search = SearchLoop::new(strategy, config);
    let outcome = search.run().unwrap();
    assert_eq!(outcome.stop_reason, StopReason::MaxIterations);
    assert!(search.strategy().individual_count() > 6);
}

#[test]
fn tsp_search_shortens_the_tour() {
    let domain =
        TspDomain::new(CityMap::on_circle(10).unwrap(), RouteMutation::CarriedKOpt, TspConfig::default()).unwrap();
    let world = Space::container();
    let mut rng = StdRng::seed_from_u64(105);
    domain.populate(&world, 30, &mut rng).unwrap();

    let strategy: Box<dyn Strategy> = Box::new(Elitist::new(world, 2));
    let initial = strategy.best().unwrap().unwrap().fitness().unwrap();
    let config = SearchConfig {
        max_iterations: 60,
        target_fitness: Some(6.2),
        ..SearchConfig::default()
    };
    let mut search = SearchLoop::new(strategy, config);
    let outcome = search.run().unwrap();

    let best = outcome.best.unwrap();
    assert!(best.fitness().unwrap() <= initial);
    assert!(matches!(
        outcome.stop_reason,
        StopReason::MaxIterations | StopReason::TargetReached
    ));
    assert!(TspDomain::describe(&best).unwrap().starts_with("Journey:"));
}
