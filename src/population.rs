//! Population engine - tick orchestration over the agent collection.
//!
//! One `step` call advances the whole society a single tick: build the
//! allocation schedules, run every living person, collect tax, dispatch
//! social actions over index-based pairings, then sweep the dead and
//! admit the newborns. Removal and birth only happen at tick
//! boundaries.

use crate::actions::{apply_pair, apply_solo, pick_action};
use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::person::{Person, PersonId, PersonParams, Resource};
use crate::schedule::{AllocationPolicy, GeneAllocation, Schedule};
use crate::stats::{Stats, StatsHistory};
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Community resource stock, owned by the population as a whole.
/// Only explicit donate/steal/tax operations touch it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    pub food: f32,
    pub water: f32,
    pub shelter: f32,
    pub clothing: f32,
}

impl ResourcePool {
    /// Current pooled stock of a resource
    #[inline]
    pub fn stock(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Food => self.food,
            Resource::Water => self.water,
            Resource::Shelter => self.shelter,
            Resource::Clothing => self.clothing,
        }
    }

    fn stock_mut(&mut self, resource: Resource) -> &mut f32 {
        match resource {
            Resource::Food => &mut self.food,
            Resource::Water => &mut self.water,
            Resource::Shelter => &mut self.shelter,
            Resource::Clothing => &mut self.clothing,
        }
    }

    /// Add to the pool
    pub fn add(&mut self, resource: Resource, amount: f32) {
        *self.stock_mut(resource) += amount.max(0.0);
    }

    /// Remove up to `amount`, bounded by what is pooled. Returns the
    /// amount actually taken.
    pub fn take(&mut self, resource: Resource, amount: f32) -> f32 {
        let stock = self.stock_mut(resource);
        let taken = amount.max(0.0).min(*stock);
        *stock -= taken;
        taken
    }

    /// Sum over all four pooled stocks
    pub fn total(&self) -> f32 {
        self.food + self.water + self.shelter + self.clothing
    }
}

/// The simulated society
pub struct Population {
    /// Agent collection; contains only live persons at tick start
    pub people: Vec<Person>,

    /// Community resources
    pub pool: ResourcePool,

    /// Completed ticks
    pub time: u64,

    /// Configuration
    pub config: Config,

    /// Statistics
    pub stats: Stats,
    pub stats_history: StatsHistory,

    /// Allocation policy feeding Person::run
    policy: GeneAllocation,

    // ID generation
    next_person_id: PersonId,

    // Seeded random number generator
    rng: ChaCha8Rng,
    seed: u64,

    births_this_tick: usize,
    deaths_this_tick: usize,
}

impl Population {
    /// Create a population with a random seed
    pub fn new(config: Config) -> Self {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(config, seed)
    }

    /// Create a population with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let policy = GeneAllocation::from(&config.allocation);

        let mut people = Vec::with_capacity(config.population.initial_size);
        let mut next_person_id: PersonId = 0;

        // integral head-count per cohort, remainder drawn by frequency
        let size = config.population.initial_size;
        for cohort in &config.population.cohorts {
            let count = (cohort.frequency * size as f32) as usize;
            for _ in 0..count {
                people.push(spawn_member(
                    next_person_id,
                    cohort.work_ability,
                    cohort.consumption_need,
                    &config,
                    &mut rng,
                ));
                next_person_id += 1;
            }
        }
        while people.len() < size {
            let cohort = pick_cohort(&config, &mut rng);
            people.push(spawn_member(
                next_person_id,
                cohort.0,
                cohort.1,
                &config,
                &mut rng,
            ));
            next_person_id += 1;
        }
        people.truncate(size);

        let stats_interval = config.logging.stats_interval;

        Self {
            people,
            pool: ResourcePool::default(),
            time: 0,
            config,
            stats: Stats::new(),
            stats_history: StatsHistory::new(stats_interval),
            policy,
            next_person_id,
            rng,
            seed,
            births_this_tick: 0,
            deaths_this_tick: 0,
        }
    }

    /// Restore a population from a checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        let policy = GeneAllocation::from(&checkpoint.config.allocation);
        let stats_interval = checkpoint.config.logging.stats_interval;

        Self {
            people: checkpoint.people,
            pool: checkpoint.pool,
            time: checkpoint.time,
            config: checkpoint.config,
            stats: checkpoint.stats,
            stats_history: StatsHistory::new(stats_interval),
            policy,
            next_person_id: checkpoint.next_person_id,
            rng: ChaCha8Rng::seed_from_u64(checkpoint.random_seed),
            seed: checkpoint.random_seed,
            births_this_tick: 0,
            deaths_this_tick: 0,
        }
    }

    /// Create a checkpoint of the current state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.time,
            self.config.clone(),
            self.people.clone(),
            self.pool.clone(),
            self.stats.clone(),
            self.next_person_id,
            self.seed,
        )
    }

    /// Swap in a new allocation parameter vector (the optimizer's
    /// output reconfigures future ticks through this)
    pub fn set_allocation_genes(&mut self, genes: &[f32]) {
        self.policy = GeneAllocation::new(genes);
    }

    /// Advance the whole population exactly one tick
    pub fn step(&mut self) {
        self.births_this_tick = 0;
        self.deaths_this_tick = 0;

        // Phase 1: allocation schedules from the tick-start snapshot
        let schedules: Vec<Schedule> = self.people.iter().map(|p| self.policy.allocate(p)).collect();

        // Phase 2: advance every living person
        let person_cfg = self.config.person.clone();
        for (person, schedule) in self.people.iter_mut().zip(&schedules) {
            person.run(schedule, &person_cfg, &mut self.rng);
        }

        // Phase 3: taxation into the community pool
        self.collect_tax();

        // Phase 4: social actions, at most one per living agent
        let births = self.dispatch_actions();

        // Phase 5: sweep the dead, admit the newborns
        self.sweep();
        self.admit_births(births);

        // Phase 6: statistics
        self.update_stats();

        self.time += 1;

        if self.is_extinct() {
            info!("population extinct at tick {}", self.time);
        }
    }

    /// Move the configured fraction of every private stock into the
    /// community pool
    fn collect_tax(&mut self) {
        let rate = self.config.population.tax_rate;
        if rate <= 0.0 {
            return;
        }
        for person in self.people.iter_mut().filter(|p| p.alive) {
            for resource in Resource::ALL {
                let due = person.stock(resource) * rate;
                let collected = person.take(resource, due);
                self.pool.add(resource, collected);
            }
        }
    }

    /// Pair agents and apply social actions. Partner choice is uniform
    /// over the agents alive when the dispatch phase starts; pairings
    /// are index-based so a mid-tick death can void an action but never
    /// invalidate a reference. Returns the queued birth requests as
    /// (parent, parent) index pairs.
    fn dispatch_actions(&mut self) -> Vec<PersonParams> {
        let n = self.people.len();
        let actions_cfg = self.config.actions.clone();
        let person_cfg = self.config.person.clone();

        // tick-start snapshot of who can be paired with
        let living: Vec<usize> = (0..n).filter(|&i| self.people[i].alive).collect();

        let mut time_spent = vec![0.0f32; n];
        let mut births = Vec::new();

        for &i in &living {
            if !self.people[i].alive {
                continue; // died earlier this phase
            }
            if self.rng.gen::<f32>() >= actions_cfg.action_chance {
                continue;
            }

            let action = pick_action(&actions_cfg, &mut self.rng);
            let cost = action.time_cost();
            if time_spent[i] + cost > 1.0 {
                continue;
            }

            if action.requires_partner() {
                if living.len() < 2 {
                    continue;
                }
                let j = match self.pick_partner(&living, i) {
                    Some(j) => j,
                    None => continue,
                };
                if !self.people[j].alive || time_spent[j] + cost > 1.0 {
                    continue;
                }

                let (agent, recipient) = pair_mut(&mut self.people, i, j);
                let outcome = apply_pair(action, agent, recipient, &actions_cfg, &mut self.rng);
                time_spent[i] += cost;
                time_spent[j] += cost;

                if outcome.birth {
                    births.push(newborn_params(
                        &self.people[i],
                        &self.people[j],
                        &person_cfg,
                    ));
                }
            } else {
                apply_solo(
                    action,
                    &mut self.people[i],
                    &mut self.pool,
                    &actions_cfg,
                    &mut self.rng,
                );
                time_spent[i] += cost;
            }
        }

        births
    }

    // Uniform draw over the living snapshot, excluding the agent
    fn pick_partner(&mut self, living: &[usize], agent: usize) -> Option<usize> {
        if living.len() < 2 {
            return None;
        }
        loop {
            let j = living[self.rng.gen_range(0..living.len())];
            if j != agent {
                return Some(j);
            }
        }
    }

    /// Remove every person whose `alive` flag dropped this tick
    fn sweep(&mut self) {
        let before = self.people.len();
        self.people.retain(|p| p.alive);
        self.deaths_this_tick = before - self.people.len();
    }

    /// Materialize queued newborns, respecting the population cap
    fn admit_births(&mut self, births: Vec<PersonParams>) {
        let cap = self.config.population.max_population;
        for params in births {
            if self.people.len() >= cap {
                debug!("population cap reached, dropping birth");
                break;
            }
            let id = self.next_person_id;
            self.next_person_id += 1;
            self.people.push(Person::new(id, params, &mut self.rng));
            self.births_this_tick += 1;
        }
    }

    fn update_stats(&mut self) {
        self.stats.time = self.time;
        self.stats.births = self.births_this_tick;
        self.stats.deaths = self.deaths_this_tick;
        self.stats.update(&self.people, &self.pool);

        let interval = self.config.logging.stats_interval;
        if interval > 0 && self.time % interval == 0 {
            self.stats_history.record(self.stats.clone());
        }
    }

    /// Run the simulation for the given number of ticks
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Current number of living persons
    pub fn population(&self) -> usize {
        self.people.iter().filter(|p| p.alive).count()
    }

    /// Has everyone died
    pub fn is_extinct(&self) -> bool {
        self.population() == 0
    }

    /// Mean satisfaction over living persons (0 when extinct)
    pub fn mean_satisfaction(&self) -> f32 {
        let living: Vec<&Person> = self.people.iter().filter(|p| p.alive).collect();
        if living.is_empty() {
            return 0.0;
        }
        living.iter().map(|p| p.satisfaction).sum::<f32>() / living.len() as f32
    }

    /// Aggregate fitness handed to the optimizer: surviving head-count
    /// plus mean satisfaction
    pub fn fitness(&self) -> f32 {
        self.population() as f32 + self.mean_satisfaction()
    }

    /// Seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

// Mutable references to two distinct persons without aliasing
fn pair_mut(people: &mut [Person], i: usize, j: usize) -> (&mut Person, &mut Person) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = people.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = people.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

fn spawn_member(
    id: PersonId,
    work_ability: f32,
    consumption_need: f32,
    config: &Config,
    rng: &mut ChaCha8Rng,
) -> Person {
    let infected = rng.gen::<f32>() < config.population.initial_infection_chance;
    let age_max = config.population.initial_age_max;
    Person::new(
        id,
        PersonParams {
            age: if age_max > 0.0 {
                rng.gen_range(0.0..age_max)
            } else {
                0.0
            },
            sex: None,
            infected,
            consumption: consumption_need,
            work_ability,
            work_intolerance: 1.0,
            start_satisfaction: config.person.start_satisfaction,
            rest_capacity: config.person.rest_capacity,
        },
        rng,
    )
}

// Frequency-weighted cohort draw; returns (work_ability, consumption_need)
fn pick_cohort(config: &Config, rng: &mut ChaCha8Rng) -> (f32, f32) {
    let cohorts = &config.population.cohorts;
    let total: f32 = cohorts.iter().map(|c| c.frequency).sum();
    let mut draw = rng.gen::<f32>() * total;
    for cohort in cohorts {
        if draw < cohort.frequency {
            return (cohort.work_ability, cohort.consumption_need);
        }
        draw -= cohort.frequency;
    }
    let last = cohorts[cohorts.len() - 1];
    (last.work_ability, last.consumption_need)
}

// Inherit the parents' mean traits; vitals start fresh
fn newborn_params(parent_a: &Person, parent_b: &Person, cfg: &crate::config::PersonConfig) -> PersonParams {
    let need_a = 1.0 / parent_a.consumption_ratio;
    let need_b = 1.0 / parent_b.consumption_ratio;
    PersonParams {
        age: 0.0,
        sex: None,
        infected: false,
        consumption: (need_a + need_b) / 2.0,
        work_ability: (parent_a.work_ability + parent_b.work_ability) / 2.0,
        work_intolerance: (parent_a.work_intolerance + parent_b.work_intolerance) / 2.0,
        start_satisfaction: cfg.start_satisfaction,
        rest_capacity: cfg.rest_capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::Sex;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.population.initial_size = 100;
        config
    }

    #[test]
    fn test_population_creation() {
        let config = test_config();
        let pop = Population::new_with_seed(config.clone(), 42);

        assert_eq!(pop.population(), config.population.initial_size);
        assert_eq!(pop.time, 0);
        assert!(pop.people.iter().all(|p| p.alive));
    }

    #[test]
    fn test_step_advances_time() {
        let mut pop = Population::new_with_seed(test_config(), 42);
        pop.step();
        assert_eq!(pop.time, 1);
    }

    #[test]
    fn test_no_dead_bodies_at_tick_start() {
        let mut pop = Population::new_with_seed(test_config(), 7);
        for _ in 0..50 {
            pop.step();
            assert!(pop.people.iter().all(|p| p.alive));
        }
    }

    #[test]
    fn test_reproducibility_is_exact() {
        let config = test_config();
        let mut a = Population::new_with_seed(config.clone(), 99);
        let mut b = Population::new_with_seed(config, 99);

        a.run(50);
        b.run(50);

        assert_eq!(a.time, b.time);
        assert_eq!(a.population(), b.population());
        assert_eq!(a.mean_satisfaction(), b.mean_satisfaction());
        for (x, y) in a.people.iter().zip(&b.people) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.satisfaction, y.satisfaction);
            assert_eq!(x.food, y.food);
        }
    }

    #[test]
    fn test_mate_queues_exactly_one_birth() {
        let mut config = test_config();
        config.population.initial_size = 2;
        config.population.cohorts = vec![crate::config::Cohort {
            frequency: 1.0,
            work_ability: 1.0,
            consumption_need: 1.0,
        }];
        let mut pop = Population::new_with_seed(config, 5);

        // force a known mixed-sex couple
        pop.people[0].sex = Sex::Male;
        pop.people[1].sex = Sex::Female;
        pop.people[0].age = 25.0;
        pop.people[1].age = 25.0;

        let before = pop.people.len();
        let births = vec![newborn_params(
            &pop.people[0],
            &pop.people[1],
            &pop.config.person.clone(),
        )];
        pop.admit_births(births);

        assert_eq!(pop.people.len(), before + 1);
        let newborn = pop.people.last().unwrap();
        assert_eq!(newborn.age, 0.0);
        assert!(newborn.alive);
        assert!(!newborn.infected());
    }

    #[test]
    fn test_step_tolerates_zero_stats_interval() {
        // rejected by validate(), but a directly constructed population
        // must not divide by it either
        let mut config = test_config();
        config.logging.stats_interval = 0;
        let mut pop = Population::new_with_seed(config, 2);

        pop.step();
        assert_eq!(pop.time, 1);
        assert!(pop.stats_history.snapshots.is_empty());
    }

    #[test]
    fn test_taxation_feeds_pool() {
        let mut config = test_config();
        config.population.tax_rate = 0.1;
        let mut pop = Population::new_with_seed(config, 11);

        for person in &mut pop.people {
            person.food = 10.0;
        }
        pop.collect_tax();

        assert!(pop.pool.food > 0.0);
        assert!(pop.people.iter().all(|p| p.food >= 0.0));
    }

    #[test]
    fn test_pool_never_negative() {
        let mut config = test_config();
        config.population.tax_rate = 0.05;
        let mut pop = Population::new_with_seed(config, 13);

        pop.run(30);

        for resource in Resource::ALL {
            assert!(pop.pool.stock(resource) >= 0.0);
        }
    }

    #[test]
    fn test_pair_mut_distinct() {
        let mut pop = Population::new_with_seed(test_config(), 17);
        let (a, b) = pair_mut(&mut pop.people, 3, 7);
        assert_ne!(a.id, b.id);

        let (c, d) = pair_mut(&mut pop.people, 7, 3);
        assert_ne!(c.id, d.id);
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut pop = Population::new_with_seed(test_config(), 12345);
        pop.run(20);

        let checkpoint = pop.create_checkpoint();
        let restored = Population::from_checkpoint(checkpoint);

        assert_eq!(restored.time, pop.time);
        assert_eq!(restored.population(), pop.population());
        assert_eq!(restored.seed(), pop.seed());
    }

    #[test]
    fn test_extinction_detection() {
        let mut pop = Population::new_with_seed(test_config(), 21);
        for person in &mut pop.people {
            person.die();
        }
        pop.sweep();
        assert!(pop.is_extinct());
        assert_eq!(pop.fitness(), 0.0);
    }
}
