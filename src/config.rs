//! Configuration system for the sociogen simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    pub person: PersonConfig,
    pub actions: ActionConfig,
    pub allocation: AllocationConfig,
    pub optimizer: OptimizerConfig,
    pub logging: LoggingConfig,
}

/// Population-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of persons at start
    pub initial_size: usize,
    /// Cohort table: (frequency, work_ability, consumption_need).
    /// Frequencies must sum to 1.
    pub cohorts: Vec<Cohort>,
    /// Maximum age assigned at population construction
    pub initial_age_max: f32,
    /// Chance that a freshly constructed person starts infected
    pub initial_infection_chance: f32,
    /// Fraction of every private stock collected into the community
    /// pool each tick (0 disables taxation)
    pub tax_rate: f32,
    /// Hard population cap; births beyond it are dropped
    pub max_population: usize,
}

/// One row of the population construction table
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cohort {
    pub frequency: f32,
    pub work_ability: f32,
    pub consumption_need: f32,
}

/// Per-person life-cycle constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonConfig {
    /// Age increment per tick (~1 day of lifespan)
    pub day_step: f32,
    /// Divisor in the age-mortality draw: p = age^2 / age_hazard_scale.
    /// The source drafts disagree (100 vs 100_000); 100_000 keeps adult
    /// daily mortality below 1%.
    pub age_hazard_scale: f32,
    /// Rested units lost at the start of every tick
    pub rest_decay: f32,
    /// Default starting satisfaction
    pub start_satisfaction: f32,
    /// Default rest capacity (initial and maximum rested value)
    pub rest_capacity: f32,
    /// Death chance per tick of shelter work when w_int > 0.7
    pub construction_hazard: f32,
}

/// Two-party action tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Chance a living person attempts a social action each tick
    pub action_chance: f32,
    /// Satisfaction bonus for each mating participant
    pub mate_bonus: f32,
    /// Upper bound on the amount a thief tries to take
    pub steal_max: f32,
    /// Upper bound on the amount a donor gives away
    pub donate_max: f32,
    /// Relative selection weights: kill, steal, donate, mate, relax,
    /// steal from pool, donate to pool
    pub weights: [f32; 7],
}

/// Default resource allocation genes: one (consume, produce) pair per
/// resource in order food, water, shelter, clothing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    pub genes: [f32; 8],
}

/// Genetic algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Chance of a multiplicative mutation per gene
    pub mutation_chance: f32,
    /// Relative maximum magnitude of a mutation
    pub mutation_factor: f32,
    /// Chance of a gene swap between children per gene
    pub crossover_chance: f32,
    /// Fraction of parents retained by fitness
    pub survival_fraction: f32,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between checkpoints
    pub checkpoint_interval: u64,
    /// Ticks between stats snapshots
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            person: PersonConfig::default(),
            actions: ActionConfig::default(),
            allocation: AllocationConfig::default(),
            optimizer: OptimizerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_size: 1000,
            cohorts: default_cohorts(),
            initial_age_max: 40.0,
            initial_infection_chance: 0.01,
            tax_rate: 0.0,
            max_population: 100_000,
        }
    }
}

/// The original mixed-skill population table: twelve cohorts crossing
/// skill level with consumption need, frequencies summing to 1.
pub fn default_cohorts() -> Vec<Cohort> {
    [
        (0.05, 0.0, 0.5),
        (0.05, 0.5, 0.5),
        (0.10, 1.0, 0.5),
        (0.05, 1.5, 0.5),
        (0.05, 0.0, 1.0),
        (0.10, 0.5, 1.0),
        (0.20, 1.0, 1.0),
        (0.10, 1.5, 1.0),
        (0.05, 0.0, 1.5),
        (0.10, 0.5, 1.5),
        (0.10, 1.0, 1.5),
        (0.05, 1.5, 1.5),
    ]
    .iter()
    .map(|&(frequency, work_ability, consumption_need)| Cohort {
        frequency,
        work_ability,
        consumption_need,
    })
    .collect()
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            day_step: 0.003,
            age_hazard_scale: 100_000.0,
            rest_decay: 0.5,
            start_satisfaction: 1.0,
            rest_capacity: 10.0,
            construction_hazard: 0.1,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            action_chance: 0.5,
            mate_bonus: 5.0,
            steal_max: 1.0,
            donate_max: 1.0,
            weights: [0.02, 0.08, 0.10, 0.15, 0.45, 0.10, 0.10],
        }
    }
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            // (consume, produce) per resource; survivable for a
            // standard adult with work_ability = 1
            genes: [1.0, 1.0, 0.5, 0.3, 1.0, 0.5, 0.3, 0.5],
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mutation_chance: 0.3,
            mutation_factor: 0.3,
            crossover_chance: 0.1,
            survival_fraction: 0.3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 500,
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.population.initial_size == 0 {
            return Err("initial_size must be > 0".to_string());
        }
        if self.population.initial_size > self.population.max_population {
            return Err("initial_size cannot exceed max_population".to_string());
        }
        if self.population.cohorts.is_empty() {
            return Err("cohort table must not be empty".to_string());
        }
        let freq_sum: f32 = self.population.cohorts.iter().map(|c| c.frequency).sum();
        if (freq_sum - 1.0).abs() > 1e-3 {
            return Err(format!("cohort frequencies must sum to 1, got {freq_sum}"));
        }
        if self.population.initial_age_max <= 0.0 {
            return Err("initial_age_max must be > 0".to_string());
        }
        if self.person.day_step <= 0.0 {
            return Err("day_step must be > 0".to_string());
        }
        if self.person.age_hazard_scale <= 0.0 {
            return Err("age_hazard_scale must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.population.tax_rate) {
            return Err("tax_rate must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.actions.action_chance) {
            return Err("action_chance must be within [0, 1]".to_string());
        }
        if self.actions.weights.iter().any(|&w| w < 0.0)
            || self.actions.weights.iter().sum::<f32>() <= 0.0
        {
            return Err("action weights must be non-negative and not all zero".to_string());
        }
        if self.allocation.genes.iter().any(|&g| g < 0.0) {
            return Err("allocation genes must be non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.optimizer.survival_fraction) {
            return Err("survival_fraction must be within [0, 1]".to_string());
        }
        if self.logging.checkpoint_interval == 0 {
            return Err("checkpoint_interval must be > 0".to_string());
        }
        if self.logging.stats_interval == 0 {
            return Err("stats_interval must be > 0".to_string());
        }
        match self.logging.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => return Err(format!("unknown log level: {other}")),
        }
        Ok(())
    }
}
