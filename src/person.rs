//! Person state and per-tick life-cycle.
//!
//! Each person owns four private resource stocks with a matched
//! consume/produce pair per resource, and advances exactly one tick per
//! `run` call: rest decay, aging, infection, then resource management.

use crate::config::PersonConfig;
use crate::schedule::Schedule;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unique person identifier
pub type PersonId = u64;

/// Infection marker for a healthy person
pub const NOT_INFECTED: f32 = -1.0;

/// Biological sex; modulates shelter and clothing production
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Draw a random sex (50/50)
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// The four scarce resources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Food,
    Water,
    Shelter,
    Clothing,
}

impl Resource {
    /// Fixed processing order for the per-tick resource pass
    pub const ALL: [Resource; 4] = [
        Resource::Food,
        Resource::Water,
        Resource::Shelter,
        Resource::Clothing,
    ];
}

/// Result of a consumption attempt
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConsumeOutcome {
    /// Requested amount consumed, satisfaction effect applied
    Consumed,
    /// Stock was short; carries the available amount. Nothing was
    /// subtracted and no satisfaction effect was applied. The caller is
    /// expected to retry with the returned amount.
    Insufficient(f32),
}

/// Construction parameters for a person, all with documented defaults
#[derive(Clone, Debug)]
pub struct PersonParams {
    /// Starting age (default 0)
    pub age: f32,
    /// Explicit sex, or `None` to draw one at random
    pub sex: Option<Sex>,
    /// Start infected (default false)
    pub infected: bool,
    /// Consumption need relative to a standard value of 1
    pub consumption: f32,
    /// Production efficiency relative to a standard value of 1
    pub work_ability: f32,
    /// Dissatisfaction/fatigue cost coefficient of labor
    pub work_intolerance: f32,
    /// Starting satisfaction
    pub start_satisfaction: f32,
    /// Initial and maximum rested value
    pub rest_capacity: f32,
}

impl Default for PersonParams {
    fn default() -> Self {
        Self {
            age: 0.0,
            sex: None,
            infected: false,
            consumption: 1.0,
            work_ability: 1.0,
            work_intolerance: 1.0,
            start_satisfaction: 1.0,
            rest_capacity: 10.0,
        }
    }
}

/// An agent in the simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Person {
    // Identity
    pub id: PersonId,

    // Constant traits
    pub sex: Sex,
    pub consumption_ratio: f32,
    pub work_ability: f32,
    pub work_intolerance: f32,
    pub rest_capacity: f32,

    // Vital state
    pub age: f32,
    pub alive: bool,
    pub satisfaction: f32,
    pub rested: f32,
    /// -1 means healthy; >= 0 counts days infected
    pub infection: f32,

    // Private resource stocks
    pub food: f32,
    pub water: f32,
    pub shelter: f32,
    pub clothing: f32,
}

impl Person {
    /// Create a new person from construction parameters
    pub fn new<R: Rng>(id: PersonId, params: PersonParams, rng: &mut R) -> Self {
        let sex = params.sex.unwrap_or_else(|| Sex::random(rng));

        Self {
            id,
            sex,
            consumption_ratio: 1.0 / params.consumption.max(f32::EPSILON),
            work_ability: params.work_ability,
            work_intolerance: params.work_intolerance,
            rest_capacity: params.rest_capacity,
            age: params.age,
            alive: true,
            satisfaction: params.start_satisfaction,
            rested: params.rest_capacity,
            infection: if params.infected { 0.0 } else { NOT_INFECTED },
            food: 0.0,
            water: 0.0,
            shelter: 0.0,
            clothing: 0.0,
        }
    }

    /// Mark the person dead. Terminal: the population sweeps the body
    /// at the end of the tick and no further mutation is observed.
    #[inline]
    pub fn die(&mut self) {
        self.alive = false;
    }

    /// Is the person currently infected
    #[inline]
    pub fn infected(&self) -> bool {
        self.infection != NOT_INFECTED
    }

    /// Infect a healthy person. Already-infected persons keep their
    /// current infection progress.
    pub fn expose(&mut self) {
        if !self.infected() {
            self.infection = 0.0;
        }
    }

    /// Clear the infection
    pub fn recover(&mut self) {
        self.infection = NOT_INFECTED;
    }

    /// Current stock of a resource
    #[inline]
    pub fn stock(&self, resource: Resource) -> f32 {
        match resource {
            Resource::Food => self.food,
            Resource::Water => self.water,
            Resource::Shelter => self.shelter,
            Resource::Clothing => self.clothing,
        }
    }

    #[inline]
    fn stock_mut(&mut self, resource: Resource) -> &mut f32 {
        match resource {
            Resource::Food => &mut self.food,
            Resource::Water => &mut self.water,
            Resource::Shelter => &mut self.shelter,
            Resource::Clothing => &mut self.clothing,
        }
    }

    /// Add to a private stock
    #[inline]
    pub fn gain(&mut self, resource: Resource, amount: f32) {
        *self.stock_mut(resource) += amount;
    }

    /// Remove up to `amount` from a private stock, bounded by what is
    /// available. Returns the amount actually taken; the stock never
    /// goes negative.
    pub fn take(&mut self, resource: Resource, amount: f32) -> f32 {
        let stock = self.stock_mut(resource);
        let taken = amount.max(0.0).min(*stock);
        *stock -= taken;
        taken
    }

    /// Age-mortality probability for the current age, clamped to [0, 1]
    pub fn age_hazard(&self, hazard_scale: f32) -> f32 {
        (self.age * self.age / hazard_scale).clamp(0.0, 1.0)
    }

    // Consumption utility scaling by age bracket
    fn age_consumption_mult(&self) -> f32 {
        if self.age < 5.0 || self.age > 70.0 {
            0.5
        } else if self.age < 16.0 || self.age > 50.0 {
            0.7
        } else {
            1.0
        }
    }

    // (efficiency, intolerance) production multipliers by age bracket
    fn age_production_mult(&self) -> (f32, f32) {
        if self.age < 5.0 || self.age > 70.0 {
            (0.0, 20.0)
        } else if self.age < 16.0 || self.age > 50.0 {
            (0.3, 4.0)
        } else {
            (1.0, 1.0)
        }
    }

    // (efficiency, intolerance) multipliers for sex-favored production
    fn sex_production_mult(&self, favored: Sex) -> (f32, f32) {
        if self.sex == favored {
            (1.0, 1.0)
        } else {
            (0.7, 0.7)
        }
    }

    /// Consume `c` units of a resource.
    ///
    /// Fails with the available amount when the stock is short, applying
    /// no effect; on success subtracts the stock (shelter excepted: its
    /// stock is capacity and is never reduced by use) and applies the
    /// logarithmic utility to satisfaction. Starvation and dehydration
    /// are terminal.
    pub fn consume(&mut self, resource: Resource, c: f32) -> ConsumeOutcome {
        let stock = self.stock(resource);
        if stock < c {
            return ConsumeOutcome::Insufficient(stock);
        }
        if resource != Resource::Shelter {
            *self.stock_mut(resource) -= c;
        }

        match resource {
            Resource::Food => {
                let u = 3.0 * self.consumption_ratio * self.age_consumption_mult() * (c + 1.0).ln();
                if u >= 0.7 {
                    self.satisfaction += u;
                } else if u >= 0.2 {
                    self.satisfaction -= 1.0 / u;
                } else {
                    if u > 0.0 {
                        self.satisfaction -= 10.0 / u;
                    }
                    self.die(); // starvation
                }
            }
            Resource::Water => {
                let u = 3.0
                    * self.consumption_ratio
                    * self.age_consumption_mult()
                    * (10.0 * c + 1.0).ln();
                if u >= 1.0 {
                    self.satisfaction += 3.0;
                } else if c >= 0.4 {
                    self.satisfaction -= 1.0 / u;
                } else {
                    if u > 0.0 {
                        self.satisfaction -= 10.0 / u;
                    }
                    self.die(); // dehydration
                }
            }
            Resource::Shelter => {
                let u = 2.0 * self.consumption_ratio * (5.0 * c + 1.0).ln();
                if u < 1.0 {
                    self.satisfaction -= 3.0;
                } else if u > 3.0 {
                    self.satisfaction += 1.0;
                }
            }
            Resource::Clothing => {
                let u = 2.0 * self.consumption_ratio * (10.0 * c + 1.0).ln();
                if u > 1.0 {
                    self.satisfaction += u;
                } else if u < 0.1 {
                    self.satisfaction -= 1.0;
                }
            }
        }

        ConsumeOutcome::Consumed
    }

    /// Spend `w` units of work producing a resource.
    ///
    /// Always credits the stock. Labor costs satisfaction and rest on a
    /// per-resource tier; heavy shelter work additionally carries a
    /// construction-accident death hazard.
    pub fn produce<R: Rng>(
        &mut self,
        resource: Resource,
        w: f32,
        cfg: &PersonConfig,
        rng: &mut R,
    ) {
        let (age_eff, age_int) = self.age_production_mult();

        let (eff_mult, int_mult) = match resource {
            Resource::Food | Resource::Water => (age_eff, age_int),
            Resource::Shelter => {
                let (sex_eff, sex_int) = self.sex_production_mult(Sex::Male);
                (age_eff * sex_eff, age_int * sex_int)
            }
            Resource::Clothing => {
                let (sex_eff, sex_int) = self.sex_production_mult(Sex::Female);
                (age_eff * sex_eff, age_int * sex_int)
            }
        };

        let w_int = self.work_intolerance * int_mult * w;

        match resource {
            Resource::Food => {
                if w_int > 1.0 {
                    self.satisfaction -= 1.5 * w_int;
                    self.rested -= 1.5 * w_int;
                } else if w_int > 0.5 {
                    self.satisfaction -= w_int;
                    self.rested -= w_int;
                } else {
                    self.satisfaction -= 0.5 * w_int;
                    self.rested -= 0.5 * w_int;
                }
                self.food += self.work_ability * eff_mult * w;
            }
            Resource::Water => {
                if w_int > 0.5 {
                    self.satisfaction -= 2.0 * w_int;
                    self.rested -= w_int;
                } else if w_int > 0.2 {
                    self.satisfaction -= w_int;
                    self.rested -= 0.5 * w_int;
                } else {
                    self.satisfaction -= 0.3 * w_int;
                    self.rested -= 0.1 * w_int;
                }
                self.water += 10.0 * self.work_ability * eff_mult * w;
            }
            Resource::Shelter => {
                if w_int > 0.7 {
                    self.satisfaction -= 2.0 * w_int;
                    self.rested -= 4.0 * w_int;
                    // too much construction work can kill
                    if rng.gen::<f32>() < cfg.construction_hazard {
                        self.die();
                    }
                } else if w_int > 0.5 {
                    self.satisfaction -= w_int;
                    self.rested -= 2.0 * w_int;
                } else {
                    self.satisfaction -= 0.3 * w_int;
                    self.rested -= w_int;
                }
                self.shelter += self.work_ability * eff_mult * w / 10.0;
            }
            Resource::Clothing => {
                if w_int > 1.0 {
                    self.satisfaction -= w_int;
                    self.rested -= 0.5 * w_int;
                } else if w_int > 0.5 {
                    self.satisfaction -= 0.7 * w_int;
                    self.rested -= 0.3 * w_int;
                } else {
                    self.satisfaction -= 0.5 * w_int;
                    self.rested -= 0.1 * w_int;
                }
                self.clothing += self.work_ability * eff_mult * w / 2.0;
            }
        }
    }

    // Infection progression: dissatisfaction grows with days infected,
    // death and recovery chances are drawn independently each tick.
    fn infection_step<R: Rng>(&mut self, rng: &mut R) {
        self.infection += 1.0;
        self.satisfaction -= self.infection;

        if rng.gen::<f32>() * 5.0 < self.infection {
            self.die();
        } else if rng.gen::<f32>() * 3.0 > self.infection {
            self.recover();
        }
    }

    /// Advance the person exactly one tick.
    ///
    /// Ordered, alive-gated steps: rest decay (exhaustion is lethal),
    /// aging with an age-mortality draw, infection handling, then the
    /// produce-then-consume pass over all four resources with a degraded
    /// retry when a stock is short. Returns current aliveness.
    pub fn run<R: Rng>(&mut self, schedule: &Schedule, cfg: &PersonConfig, rng: &mut R) -> bool {
        if !self.alive {
            return false;
        }

        self.rested -= cfg.rest_decay;
        if self.rested < 0.0 {
            self.die(); // exhaustion
        }

        if self.alive {
            self.age += cfg.day_step;
            if rng.gen::<f32>() < self.age_hazard(cfg.age_hazard_scale) {
                self.die();
            }
        }

        if self.alive && self.infected() {
            self.infection_step(rng);
        }

        if self.alive {
            for resource in Resource::ALL {
                let (c, w) = schedule.pair(resource);

                self.produce(resource, w, cfg, rng);
                if !self.alive {
                    break;
                }

                // consume whatever is available rather than nothing
                if let ConsumeOutcome::Insufficient(available) = self.consume(resource, c) {
                    self.consume(resource, available);
                }
                if !self.alive {
                    break;
                }
            }
        }

        self.alive
    }
}
