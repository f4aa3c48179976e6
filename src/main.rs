//! Machina CLI - Evolve subspace clusterings from a JSON or properties configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use machina::{
    EngineConfig, MetaModelError, Result, StrategyKind,
    compute::search::{Elitist, Microbial, SearchLoop, SearchOutcome, Strategy, Toroidal},
    domains::clustering::ClusteringDomain,
    space::{Dataset, InMemoryDataset, Individual},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json|config.properties> [data.csv]", args[0]);
        eprintln!("       {} --example", args[0]);
        eprintln!();
        eprintln!("Evolve subspace clusterings of a dataset.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config     Engine configuration (JSON, or key=value properties)");
        eprintln!("  data.csv   Observations, one comma-separated row per line");
        eprintln!();
        eprintln!("--example prints the default configuration and runs it on synthetic data.");
        std::process::exit(1);
    }

    let result = if args[1] == "--example" {
        run_example()
    } else {
        run_files(PathBuf::from(&args[1]), args.get(2).map(PathBuf::from))
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &MetaModelError) -> i32 {
    match err {
        MetaModelError::Config(_) | MetaModelError::Json(_) => 2,
        MetaModelError::Io(_) | MetaModelError::Data(_) => 3,
        _ => 4,
    }
}

fn run_files(config_path: PathBuf, data_path: Option<PathBuf>) -> Result<()> {
    let config = EngineConfig::load(&config_path)?;
    let data_path = data_path.unwrap_or_else(|| config_path.with_extension("csv"));
    let dataset = match config.clustering.dimensions {
        Some(dimensions) => InMemoryDataset::load_csv(dimensions, &data_path)?,
        None => InMemoryDataset::load_csv_inferred(&data_path)?,
    };
    run(&config, Arc::new(dataset))
}

fn run_example() -> Result<()> {
    let mut config = EngineConfig::default();
    config.search.max_iterations = 500;
    config.random_seed = Some(7);

    println!("Example configuration (config.json):");
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!();

    let mut rng = StdRng::seed_from_u64(11);
    let centres = vec![vec![0.2, 0.2, 0.5], vec![0.8, 0.7, 0.5], vec![0.5, 0.9, 0.1]];
    let dataset = InMemoryDataset::gaussian_clusters(&centres, 40, 0.05, &mut rng)?;
    run(&config, Arc::new(dataset))
}

fn run(config: &EngineConfig, dataset: Arc<dyn Dataset>) -> Result<()> {
    config.validate()?;

    println!("Machina Clustering Search");
    println!("=========================");
    println!(
        "Data: {} observations in {} dimensions",
        dataset.observation_count(),
        dataset.dimension_count()
    );
    println!("Strategy: {:?}", config.strategy);
    println!("Core points: {}", config.clustering.core_points);
    println!();

    let domain = ClusteringDomain::from_config(dataset, config)?;
    let mut rng = match config.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let best = match config.strategy {
        StrategyKind::Elitist => {
            let world = domain.population_space();
            domain.populate(&world, config.population_size, &mut rng)?;
            search(Elitist::new(world, config.elite_proportion), config)?
        }
        StrategyKind::Microbial => {
            let world = domain.population_space();
            domain.populate(&world, config.population_size, &mut rng)?;
            search(Microbial::new(world, config.random_seed), config)?
        }
        StrategyKind::Toroidal => {
            let world = domain.toroidal_space(config.lattice.x_size, config.lattice.y_size);
            let toroidal = Toroidal::new(world, config.toroidal.clone())?;
            for _ in 0..config.population_size {
                let founder = domain.random_clustering(None, &mut rng)?;
                if !toroidal.seed(founder, &mut rng)? {
                    break;
                }
            }
            match config.toroidal.run_seconds {
                Some(seconds) => {
                    let stats = toroidal.run_for(Duration::from_secs(seconds), config.toroidal.workers)?;
                    println!(
                        "Ran {} passes: {} deaths, {} requests, {} replications",
                        stats.passes, stats.deaths, stats.requests, stats.replications
                    );
                    toroidal.best()?
                }
                None => search(toroidal, config)?,
            }
        }
    };

    println!();
    match best {
        Some(best) => report(&best)?,
        None => println!("No individual survived."),
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn search<S: Strategy>(strategy: S, config: &EngineConfig) -> Result<Option<Individual>> {
    let mut search = SearchLoop::new(strategy, config.search.clone());
    let interval = config.search.report_interval.max(1);
    let SearchOutcome {
        best,
        iterations,
        stop_reason,
        ..
    } = search.run_with_callback(|progress| {
        if progress.iteration % interval == 0 {
            println!(
                "  Iteration {}: cost={:.6}, generation={}, individuals={}",
                progress.iteration, progress.best_fitness, progress.best_generation, progress.population
            );
        }
    })?;
    println!("Stopped after {iterations} iterations: {stop_reason:?}");
    Ok(best)
}

fn report(best: &Individual) -> Result<()> {
    println!("Best individual:");
    println!("  Cost: {:.6}", best.fitness()?);
    println!("  {}", ClusteringDomain::describe(best)?);
    Ok(())
}
