//! SOCIOGEN - CLI Entry Point
//!
//! Agent-based socioeconomic simulator.

use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sociogen::checkpoint::{Checkpoint, CheckpointManager};
use sociogen::schedule::GENE_COUNT;
use sociogen::{benchmark, Config, GeneticOptimizer, Population};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sociogen")]
#[command(version)]
#[command(about = "Agent-based socioeconomic simulator with genetic parameter search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Output directory for checkpoints
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional ticks
        #[arg(short, long, default_value = "10000")]
        ticks: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Search for allocation genes with the genetic optimizer
    Optimize {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of GA generations
        #[arg(short, long, default_value = "20")]
        generations: usize,

        /// Candidate gene vectors per generation
        #[arg(long, default_value = "20")]
        candidates: usize,

        /// Simulation ticks per fitness evaluation
        #[arg(short, long, default_value = "500")]
        ticks: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Population size
        #[arg(short, long, default_value = "1000")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

/// Initialize logging; RUST_LOG still overrides the configured level
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            ticks,
            output,
            seed,
            quiet,
        } => run_simulation(config, ticks, output, seed, quiet),

        Commands::Resume {
            checkpoint,
            ticks,
            output,
        } => resume_simulation(checkpoint, ticks, output),

        Commands::Optimize {
            config,
            generations,
            candidates,
            ticks,
            seed,
        } => run_optimizer(config, generations, candidates, ticks, seed),

        Commands::Benchmark { ticks, population } => run_benchmark(ticks, population),

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

fn load_config(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
    if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Ok(Config::from_file(config_path)?)
    } else {
        println!("Using default configuration");
        Ok(Config::default())
    }
}

fn run_simulation(
    config_path: PathBuf,
    ticks: u64,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    config.validate()?;
    init_logging(&config.logging.log_level);

    // Create output directory
    std::fs::create_dir_all(&output)?;

    let mut population = if let Some(s) = seed {
        println!("Using seed: {}", s);
        Population::new_with_seed(config.clone(), s)
    } else {
        Population::new(config.clone())
    };

    println!("Starting simulation");
    println!("  Initial population: {}", population.population());
    println!("  Ticks: {}", ticks);
    println!();

    // Checkpoint manager
    let mut checkpoint_mgr = CheckpointManager::new(
        output.clone(),
        config.logging.checkpoint_interval,
        10, // Keep last 10 checkpoints
    );

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;

    for i in 0..ticks {
        population.step();

        // Stats output
        if !quiet && i % stats_interval == 0 {
            println!("{}", population.stats.summary());
        }

        // Checkpoint
        if checkpoint_mgr.should_save(population.time) {
            let checkpoint = population.create_checkpoint();
            match checkpoint_mgr.save(&checkpoint) {
                Ok(path) => {
                    if !quiet {
                        println!("  Checkpoint saved: {}", path.display());
                    }
                }
                Err(e) => eprintln!("  Checkpoint error: {}", e),
            }
        }

        // Check for extinction
        if population.is_extinct() {
            println!("\nPopulation extinct at tick {}", population.time);
            break;
        }
    }

    let elapsed = start.elapsed();
    let ticks_per_sec = population.time as f64 / elapsed.as_secs_f64();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", population.time);
    println!("Speed: {:.1} ticks/s", ticks_per_sec);
    println!("Final population: {}", population.population());
    println!("Mean satisfaction: {:.1}", population.mean_satisfaction());

    // Final checkpoint
    let final_checkpoint = population.create_checkpoint();
    let final_path = output.join("checkpoint_final.bin");
    final_checkpoint.save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    // Save stats history
    let stats_path = output.join("stats_history.json");
    if let Some(path) = stats_path.to_str() {
        population.stats_history.save(path)?;
        println!("Stats history: {:?}", stats_path);
    }

    Ok(())
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    ticks: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut population = Population::from_checkpoint(checkpoint);
    init_logging(&population.config.logging.log_level);

    println!("Resumed at tick {}", population.time);
    println!("Population: {}", population.population());
    println!("Running {} additional ticks", ticks);
    println!();

    std::fs::create_dir_all(&output)?;

    let mut checkpoint_mgr = CheckpointManager::new(
        output.clone(),
        population.config.logging.checkpoint_interval,
        10,
    );

    let start = Instant::now();
    let target_time = population.time + ticks;
    let stats_interval = population.config.logging.stats_interval;

    while population.time < target_time {
        population.step();

        if population.time % stats_interval == 0 {
            println!("{}", population.stats.summary());
        }

        if checkpoint_mgr.should_save(population.time) {
            let checkpoint = population.create_checkpoint();
            if let Ok(path) = checkpoint_mgr.save(&checkpoint) {
                println!("  Checkpoint: {}", path.display());
            }
        }

        if population.is_extinct() {
            println!("\nPopulation extinct at tick {}", population.time);
            break;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Resume Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Final tick: {}", population.time);
    println!("Speed: {:.1} ticks/s", ticks as f64 / elapsed.as_secs_f64());
    println!("Population: {}", population.population());

    Ok(())
}

fn run_optimizer(
    config_path: PathBuf,
    generations: usize,
    candidates: usize,
    ticks: u64,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path)?;
    config.validate()?;
    init_logging(&config.logging.log_level);

    let master_seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(master_seed);

    println!("=== Allocation Gene Search ===");
    println!("Generations: {}", generations);
    println!("Candidates: {}", candidates);
    println!("Ticks per evaluation: {}", ticks);
    println!("Seed: {}", master_seed);
    println!();

    let optimizer = GeneticOptimizer::from_config(&config.optimizer);

    // initial candidates: configured genes plus random jitter around them
    let base = config.allocation.genes.to_vec();
    let mut vectors: Vec<Vec<f32>> = vec![base.clone()];
    while vectors.len() < candidates.max(2) {
        let jittered: Vec<f32> = base
            .iter()
            .map(|&g| g * rng.gen_range(0.5f32..1.5))
            .collect();
        vectors.push(jittered);
    }

    let mut best_genes = base;
    let mut best_fitness = f32::MIN;
    let start = Instant::now();

    for generation in 0..generations {
        // every candidate faces the same world seed
        let eval_seed: u64 = rng.gen();

        let fitness: Vec<f32> = vectors
            .iter()
            .map(|genes| {
                let mut population = Population::new_with_seed(config.clone(), eval_seed);
                population.set_allocation_genes(genes);
                population.run(ticks);
                population.fitness()
            })
            .collect();

        for (genes, &score) in vectors.iter().zip(&fitness) {
            if score > best_fitness {
                best_fitness = score;
                best_genes = genes.clone();
            }
        }

        let generation_best = fitness.iter().cloned().fold(f32::MIN, f32::max);
        let mean: f32 = fitness.iter().sum::<f32>() / fitness.len() as f32;
        println!(
            "Gen {:3} | best: {:8.1} | mean: {:8.1} | all-time: {:8.1}",
            generation, generation_best, mean, best_fitness
        );

        vectors = optimizer.optimize(&mut rng, &vectors, &fitness)?;

        // refill if pairwise breeding shrank the generation
        while vectors.len() < 2 {
            vectors.push(best_genes.clone());
        }
        vectors.truncate(candidates.max(2));
        while vectors.len() < candidates.max(2) {
            let jittered: Vec<f32> = best_genes
                .iter()
                .map(|&g| g * rng.gen_range(0.5f32..1.5))
                .collect();
            vectors.push(jittered);
        }
    }

    println!();
    println!("=== Search Complete ===");
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Best fitness: {:.1}", best_fitness);
    println!("Best genes ({} values):", GENE_COUNT);
    for (i, gene) in best_genes.iter().enumerate() {
        println!("  gene[{}] = {:.4}", i, gene);
    }

    Ok(())
}

fn run_benchmark(ticks: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");
    println!("=== SOCIOGEN Benchmark ===");
    println!("Ticks: {}", ticks);
    println!("Population: {}", population);
    println!();

    let result = benchmark(ticks, population);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    init_logging("info");
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;

    println!("Tick: {}", checkpoint.time);
    println!("Persons: {}", checkpoint.people.len());
    println!("Seed: {}", checkpoint.random_seed);
    println!();

    let alive: Vec<_> = checkpoint.people.iter().filter(|p| p.alive).collect();
    println!("Alive: {}", alive.len());

    if !alive.is_empty() {
        let n = alive.len() as f32;
        let avg_age: f32 = alive.iter().map(|p| p.age).sum::<f32>() / n;
        let avg_satisfaction: f32 = alive.iter().map(|p| p.satisfaction).sum::<f32>() / n;
        let avg_food: f32 = alive.iter().map(|p| p.food).sum::<f32>() / n;
        let avg_water: f32 = alive.iter().map(|p| p.water).sum::<f32>() / n;
        let infected = alive.iter().filter(|p| p.infected()).count();

        println!("Average age: {:.1}", avg_age);
        println!("Average satisfaction: {:.1}", avg_satisfaction);
        println!("Average food stock: {:.2}", avg_food);
        println!("Average water stock: {:.2}", avg_water);
        println!("Infected: {}", infected);
    }

    println!();
    println!("Pool total: {:.1}", checkpoint.pool.total());
    println!(
        "Checkpoint size: {:.2} MB",
        checkpoint.size_bytes() as f64 / 1_000_000.0
    );

    Ok(())
}
