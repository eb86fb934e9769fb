//! Per-tick resource allocation schedules.
//!
//! The population hands every living person a schedule: one
//! (consume, produce) pair per resource. How those amounts are chosen
//! is a pluggable policy; the default is a flat gene vector so the
//! genetic optimizer's parameter vectors plug straight in.

use crate::config::AllocationConfig;
use crate::person::{Person, Resource};
use serde::{Deserialize, Serialize};

/// Number of genes in an allocation parameter vector
pub const GENE_COUNT: usize = 8;

/// One (consume, produce) pair per resource, indexed by [`Resource`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub pairs: [(f32, f32); 4],
}

impl Schedule {
    /// The (consume, produce) pair for a resource
    #[inline]
    pub fn pair(&self, resource: Resource) -> (f32, f32) {
        self.pairs[resource as usize]
    }

    /// Build a schedule from a flat gene slice
    /// [c_food, p_food, c_water, p_water, c_shelter, p_shelter, c_clothing, p_clothing].
    /// Negative genes are clamped to zero.
    pub fn from_genes(genes: &[f32]) -> Self {
        debug_assert_eq!(genes.len(), GENE_COUNT);
        let mut pairs = [(0.0, 0.0); 4];
        for (i, pair) in pairs.iter_mut().enumerate() {
            *pair = (genes[2 * i].max(0.0), genes[2 * i + 1].max(0.0));
        }
        Self { pairs }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::from_genes(&AllocationConfig::default().genes)
    }
}

/// Strategy for assigning each person their per-tick schedule
pub trait AllocationPolicy {
    fn allocate(&self, person: &Person) -> Schedule;
}

/// Gene-vector policy: every person gets the same schedule, decoded
/// from an 8-gene parameter vector
#[derive(Clone, Debug)]
pub struct GeneAllocation {
    schedule: Schedule,
}

impl GeneAllocation {
    pub fn new(genes: &[f32]) -> Self {
        Self {
            schedule: Schedule::from_genes(genes),
        }
    }
}

impl From<&AllocationConfig> for GeneAllocation {
    fn from(cfg: &AllocationConfig) -> Self {
        Self::new(&cfg.genes)
    }
}

impl AllocationPolicy for GeneAllocation {
    fn allocate(&self, _person: &Person) -> Schedule {
        self.schedule
    }
}
