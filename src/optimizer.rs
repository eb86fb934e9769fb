//! Genetic-algorithm search over simulation parameter vectors.
//!
//! The optimizer is decoupled from the agent engine: it consumes a set
//! of parameter vectors with their fitness scores and returns a new
//! generation. Selection keeps a top fraction by fitness, breeding
//! combines every retained pair gene-by-gene, then crossover swaps and
//! multiplicative jitter perturb the children.

use crate::config::OptimizerConfig;
use rand::Rng;

/// Errors reported by the optimizer
#[derive(Debug, PartialEq, Eq)]
pub enum OptimizerError {
    /// Fewer than two parent vectors were supplied
    TooFewParents { got: usize },
    /// Vectors of differing gene counts, or an empty vector
    MismatchedGenes,
    /// Fitness list does not match the vector list
    MismatchedFitness { vectors: usize, fitness: usize },
}

impl std::fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewParents { got } => {
                write!(f, "parent set must hold at least 2 vectors, got {got}")
            }
            Self::MismatchedGenes => write!(f, "all parent vectors must share a gene count"),
            Self::MismatchedFitness { vectors, fitness } => {
                write!(f, "{vectors} vectors but {fitness} fitness values")
            }
        }
    }
}

impl std::error::Error for OptimizerError {}

/// Genetic-algorithm maximizer
#[derive(Clone, Debug)]
pub struct GeneticOptimizer {
    /// Chance of a multiplicative mutation per gene
    pub mutation_chance: f32,
    /// Relative maximum magnitude of a mutation
    pub mutation_factor: f32,
    /// Chance of a gene swap between children per gene
    pub crossover_chance: f32,
    /// Fraction of parents retained by fitness
    pub survival_fraction: f32,
}

impl Default for GeneticOptimizer {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl GeneticOptimizer {
    /// Build an optimizer from configuration
    pub fn from_config(cfg: &OptimizerConfig) -> Self {
        Self {
            mutation_chance: cfg.mutation_chance,
            mutation_factor: cfg.mutation_factor,
            crossover_chance: cfg.crossover_chance,
            survival_fraction: cfg.survival_fraction,
        }
    }

    /// Produce the next generation from scored parents.
    ///
    /// Requires at least two parents; the output cardinality is the
    /// number of retained-parent pairs and may differ from the input.
    pub fn optimize<R: Rng>(
        &self,
        rng: &mut R,
        vectors: &[Vec<f32>],
        fitness: &[f32],
    ) -> Result<Vec<Vec<f32>>, OptimizerError> {
        if vectors.len() < 2 {
            return Err(OptimizerError::TooFewParents { got: vectors.len() });
        }
        if fitness.len() != vectors.len() {
            return Err(OptimizerError::MismatchedFitness {
                vectors: vectors.len(),
                fitness: fitness.len(),
            });
        }
        let gene_count = vectors[0].len();
        if gene_count == 0 || vectors.iter().any(|v| v.len() != gene_count) {
            return Err(OptimizerError::MismatchedGenes);
        }

        let parents = self.select_parents(vectors, fitness);
        let mut children = breed(rng, &parents, gene_count);
        self.crossover(rng, &mut children, gene_count);
        self.mutate(rng, &mut children);

        Ok(children)
    }

    // Retain the top fraction by fitness, never fewer than two
    fn select_parents(&self, vectors: &[Vec<f32>], fitness: &[f32]) -> Vec<Vec<f32>> {
        let mut ranked: Vec<(f32, &Vec<f32>)> =
            fitness.iter().copied().zip(vectors.iter()).collect();
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let keep = ((self.survival_fraction * vectors.len() as f32) as usize)
            .clamp(2, vectors.len());
        ranked.into_iter().take(keep).map(|(_, v)| v.clone()).collect()
    }

    // Random gene swaps between children
    fn crossover<R: Rng>(&self, rng: &mut R, children: &mut [Vec<f32>], gene_count: usize) {
        let n = children.len();
        if n < 2 {
            return;
        }
        for child in 0..n {
            for gene in 0..gene_count {
                if rng.gen::<f32>() < self.crossover_chance {
                    let other = rng.gen_range(0..n);
                    let tmp = children[child][gene];
                    children[child][gene] = children[other][gene];
                    children[other][gene] = tmp;
                }
            }
        }
    }

    // Multiplicative jitter on random genes
    fn mutate<R: Rng>(&self, rng: &mut R, children: &mut [Vec<f32>]) {
        for child in children.iter_mut() {
            for gene in child.iter_mut() {
                if rng.gen::<f32>() < self.mutation_chance {
                    *gene *= 1.0 + self.mutation_factor * rng.gen_range(-1.0f32..=1.0);
                }
            }
        }
    }
}

// Every retained pair breeds one child: per gene, a 50% chance of the
// parents' arithmetic mean, otherwise either parent's gene at 25% each
fn breed<R: Rng>(rng: &mut R, parents: &[Vec<f32>], gene_count: usize) -> Vec<Vec<f32>> {
    let mut children = Vec::new();

    for a in 0..parents.len() - 1 {
        for b in a + 1..parents.len() {
            let mut child = Vec::with_capacity(gene_count);
            for gene in 0..gene_count {
                let from_a = parents[a][gene];
                let from_b = parents[b][gene];

                if rng.gen::<bool>() {
                    child.push(if rng.gen::<bool>() { from_a } else { from_b });
                } else {
                    child.push((from_a + from_b) / 2.0);
                }
            }
            children.push(child);
        }
    }

    children
}
