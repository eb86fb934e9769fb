//! Statistics tracking for the simulation.

use crate::person::Person;
use crate::population::ResourcePool;
use serde::{Deserialize, Serialize};

/// Statistics snapshot for a simulation tick
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    /// Current simulation tick
    pub time: u64,
    /// Living persons
    pub population: usize,
    /// Births this tick
    pub births: usize,
    /// Deaths this tick
    pub deaths: usize,
    /// Mean satisfaction across living persons
    pub satisfaction_mean: f32,
    /// Mean age across living persons
    pub age_mean: f32,
    /// Mean rested value across living persons
    pub rested_mean: f32,
    /// Currently infected persons
    pub infected: usize,
    /// Total community pool stock
    pub pool_total: f32,
    /// Mean private food stock
    pub food_mean: f32,
    /// Mean private water stock
    pub water_mean: f32,
}

impl Stats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats from the current population state
    pub fn update(&mut self, people: &[Person], pool: &ResourcePool) {
        let living: Vec<&Person> = people.iter().filter(|p| p.alive).collect();
        self.population = living.len();
        self.pool_total = pool.total();

        if living.is_empty() {
            self.satisfaction_mean = 0.0;
            self.age_mean = 0.0;
            self.rested_mean = 0.0;
            self.infected = 0;
            self.food_mean = 0.0;
            self.water_mean = 0.0;
            return;
        }

        let n = living.len() as f32;
        self.satisfaction_mean = living.iter().map(|p| p.satisfaction).sum::<f32>() / n;
        self.age_mean = living.iter().map(|p| p.age).sum::<f32>() / n;
        self.rested_mean = living.iter().map(|p| p.rested).sum::<f32>() / n;
        self.infected = living.iter().filter(|p| p.infected()).count();
        self.food_mean = living.iter().map(|p| p.food).sum::<f32>() / n;
        self.water_mean = living.iter().map(|p| p.water).sum::<f32>() / n;
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Pop:{:5} | Sat:{:7.1} | Age:{:5.1} | Inf:{:4} | B:{:3} D:{:3} | Pool:{:.1}",
            self.time,
            self.population,
            self.satisfaction_mean,
            self.age_mean,
            self.infected,
            self.births,
            self.deaths,
            self.pool_total,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded snapshots
    pub snapshots: Vec<Stats>,
    /// Recording interval in ticks
    pub interval: u64,
}

impl StatsHistory {
    /// Create a new history with the given recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Record a snapshot
    pub fn record(&mut self, stats: Stats) {
        self.snapshots.push(stats);
    }

    /// Population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.time, s.population)).collect()
    }

    /// Mean satisfaction over time
    pub fn satisfaction_series(&self) -> Vec<(u64, f32)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.satisfaction_mean))
            .collect()
    }

    /// Infected head-count over time
    pub fn infection_series(&self) -> Vec<(u64, usize)> {
        self.snapshots.iter().map(|s| (s.time, s.infected)).collect()
    }

    /// Save history as JSON
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
