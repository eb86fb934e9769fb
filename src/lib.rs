//! # SOCIOGEN
//!
//! Agent-based socioeconomic simulator with genetic parameter search.
//!
//! ## Features
//!
//! - **Agent life-cycle**: aging, exhaustion, infection, and resource-driven mortality
//! - **Economy**: four resources produced and consumed per tick under a gene-driven schedule
//! - **Social actions**: steal, donate, mate, kill, and community-pool transfers
//! - **Optimizable**: genetic-algorithm search over allocation gene vectors
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sociogen::{Config, Population};
//!
//! // Create a society with the default config
//! let config = Config::default();
//! let mut population = Population::new(config);
//!
//! // Run simulation
//! population.run(1000);
//!
//! // Check results
//! println!("Population: {}", population.population());
//! println!("Mean satisfaction: {}", population.mean_satisfaction());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use sociogen::Config;
//!
//! let mut config = Config::default();
//! config.population.initial_size = 500;
//! config.actions.action_chance = 0.8;
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use sociogen::{Config, Population};
//! use sociogen::checkpoint::Checkpoint;
//!
//! let mut population = Population::new(Config::default());
//! population.run(1000);
//!
//! // Save checkpoint
//! let checkpoint = population.create_checkpoint();
//! checkpoint.save("checkpoint.bin").unwrap();
//!
//! // Load checkpoint
//! let loaded = Checkpoint::load("checkpoint.bin").unwrap();
//! let restored = Population::from_checkpoint(loaded);
//! ```

pub mod actions;
pub mod checkpoint;
pub mod config;
pub mod optimizer;
pub mod person;
pub mod population;
pub mod schedule;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use optimizer::GeneticOptimizer;
pub use person::Person;
pub use population::Population;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(ticks: u64, population: usize) -> BenchmarkResult {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.initial_size = population;

    let mut society = Population::new(config);

    let start = Instant::now();
    society.run(ticks);
    let elapsed = start.elapsed();

    BenchmarkResult {
        ticks,
        initial_population: population,
        final_population: society.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
        mean_satisfaction: society.mean_satisfaction(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
    pub mean_satisfaction: f32,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        writeln!(f, "Mean satisfaction: {:.1}", self.mean_satisfaction)?;
        Ok(())
    }
}
