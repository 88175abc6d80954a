use crate::config::PopulationConfig;
use crate::engines::evaluation::WorldTrace;
use crate::engines::generation::genome::Tree;
use crate::engines::generation::operators;
use crate::types::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fitness of an individual that has not played yet.
pub const UNEVALUATED: f64 = f64::NEG_INFINITY;

#[derive(Debug, Clone)]
pub struct Individual {
    pub tree: Tree,
    /// Score minus parsimony penalty.
    pub fitness: f64,
    pub score: f64,
    /// World trace of the match that earned `fitness`, kept only while the
    /// individual is a candidate for the world file.
    pub trace: Option<WorldTrace>,
}

impl Individual {
    pub fn new(tree: Tree) -> Self {
        Self {
            tree,
            fitness: UNEVALUATED,
            score: UNEVALUATED,
            trace: None,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness != UNEVALUATED
    }
}

/// Tab-separated fitness log line: evals, mean fitness, best fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessLogRow {
    pub evals: usize,
    pub mean_fitness: f64,
    pub best_fitness: f64,
}

impl fmt::Display for FitnessLogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.evals, self.mean_fitness, self.best_fitness)
    }
}

/// Tab-separated parsimony log line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsimonyLogRow {
    pub evals: usize,
    pub mean_height: f64,
    pub max_height: usize,
    pub mean_size: f64,
    pub max_size: usize,
    pub mean_score: f64,
    pub max_score: f64,
}

impl fmt::Display for ParsimonyLogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.evals,
            self.mean_height,
            self.max_height,
            self.mean_size,
            self.max_size,
            self.mean_score,
            self.max_score
        )
    }
}

#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub best: Option<Individual>,
    pub high_fitness: f64,
    pub high_score: f64,
    pub fitness_total: f64,
    pub score_total: f64,
    pub height_total: usize,
    pub max_height: usize,
    pub size_total: usize,
    pub max_size: usize,
    pub count: usize,
}

impl Default for GenerationStats {
    fn default() -> Self {
        Self {
            best: None,
            high_fitness: UNEVALUATED,
            high_score: UNEVALUATED,
            fitness_total: 0.0,
            score_total: 0.0,
            height_total: 0,
            max_height: 0,
            size_total: 0,
            max_size: 0,
            count: 0,
        }
    }
}

impl GenerationStats {
    fn mean(total: f64, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }

    pub fn mean_fitness(&self) -> f64 {
        Self::mean(self.fitness_total, self.count)
    }

    pub fn mean_score(&self) -> f64 {
        Self::mean(self.score_total, self.count)
    }

    pub fn mean_height(&self) -> f64 {
        Self::mean(self.height_total as f64, self.count)
    }

    pub fn mean_size(&self) -> f64 {
        Self::mean(self.size_total as f64, self.count)
    }
}

#[derive(Debug, Clone)]
pub struct RunStats {
    pub best: Option<Individual>,
    pub high_fitness: f64,
    pub high_score: f64,
    /// Tree of the best individual of every generation, oldest first.
    pub generation_bests: Vec<Tree>,
    pub evals_with_no_change: usize,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            best: None,
            high_fitness: UNEVALUATED,
            high_score: UNEVALUATED,
            generation_bests: Vec::new(),
            evals_with_no_change: 0,
        }
    }
}

/// Individuals of one role plus the bookkeeping of the current run.
#[derive(Debug, Clone)]
pub struct Population {
    role: Role,
    config: PopulationConfig,
    individuals: Vec<Individual>,
    generation: GenerationStats,
    run: RunStats,
}

impl Population {
    pub fn new(role: Role, config: PopulationConfig) -> Self {
        Self {
            role,
            config,
            individuals: Vec::new(),
            generation: GenerationStats::default(),
            run: RunStats::default(),
        }
    }

    /// Fresh μ individuals and cleared run statistics.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.individuals =
            operators::ramped_half_and_half(self.config.mu, self.role, self.config.dmax_init, rng)
                .into_iter()
                .map(Individual::new)
                .collect();
        self.generation = GenerationStats::default();
        self.run = RunStats::default();
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn generation_stats(&self) -> &GenerationStats {
        &self.generation
    }

    pub fn run_stats(&self) -> &RunStats {
        &self.run
    }

    /// High fitness of the last completed generation.
    pub fn previous_high_fitness(&self) -> f64 {
        self.generation.high_fitness
    }

    pub fn evals_with_no_change(&self) -> usize {
        self.run.evals_with_no_change
    }

    /// Updates the stagnation counter after one pursued evaluation.
    pub fn record_evaluation(&mut self, fitness: f64, previous_high: f64) {
        if fitness <= previous_high {
            self.run.evals_with_no_change += 1;
        } else {
            self.run.evals_with_no_change = 0;
        }
    }

    /// Recomputes generation statistics and remembers the generation best.
    pub fn generation_bookkeeping(&mut self) {
        let mut stats = GenerationStats::default();
        for individual in &self.individuals {
            stats.count += 1;
            stats.fitness_total += individual.fitness;
            if individual.fitness > stats.high_fitness {
                stats.high_fitness = individual.fitness;
                stats.best = Some(individual.clone());
            }
            stats.score_total += individual.score;
            if individual.score > stats.high_score {
                stats.high_score = individual.score;
            }
            let (height, size) = (individual.tree.height(), individual.tree.size());
            stats.height_total += height;
            stats.max_height = stats.max_height.max(height);
            stats.size_total += size;
            stats.max_size = stats.max_size.max(size);
        }

        // A generation of unevaluated individuals still has a best.
        if stats.best.is_none() {
            stats.best = self.individuals.first().cloned();
        }
        if let Some(best) = &stats.best {
            self.run.generation_bests.push(best.tree.clone());
        }
        self.generation = stats;
    }

    /// Folds the last generation into the run statistics.
    pub fn calc_run_stats(&mut self) {
        if self.generation.high_score > self.run.high_score {
            self.run.high_score = self.generation.high_score;
        }
        if self.generation.high_fitness > self.run.high_fitness || self.run.best.is_none() {
            if self.generation.high_fitness > self.run.high_fitness {
                log::info!(
                    "New run {} high fitness: {}",
                    self.role,
                    self.generation.high_fitness
                );
            }
            self.run.high_fitness = self.generation.high_fitness;
            self.run.best = self.generation.best.clone();
        }
    }

    /// Drops every stored trace except the ones held by the statistics.
    pub fn clear_traces(&mut self) {
        for individual in &mut self.individuals {
            individual.trace = None;
        }
    }

    pub fn fitness_row(&self, evals: usize) -> FitnessLogRow {
        FitnessLogRow {
            evals,
            mean_fitness: self.generation.mean_fitness(),
            best_fitness: self.generation.high_fitness,
        }
    }

    pub fn parsimony_row(&self, evals: usize) -> ParsimonyLogRow {
        ParsimonyLogRow {
            evals,
            mean_height: self.generation.mean_height(),
            max_height: self.generation.max_height,
            mean_size: self.generation.mean_size(),
            max_size: self.generation.max_size,
            mean_score: self.generation.mean_score(),
            max_score: self.generation.high_score,
        }
    }

    fn fitnesses(&self) -> Vec<f64> {
        self.individuals.iter().map(|i| i.fitness).collect()
    }

    /// λ parent trees drawn with the configured parent selection.
    pub fn select_parents<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Tree> {
        self.config
            .parent_selection
            .select(&self.fitnesses(), self.config.lambda, rng)
            .into_iter()
            .map(|i| self.individuals[i].tree.clone())
            .collect()
    }

    /// Unevaluated offspring bred from `parents`.
    pub fn breed<R: Rng + ?Sized>(&self, parents: &[Tree], rng: &mut R) -> Vec<Individual> {
        operators::recombine_mutate(parents, &self.config, self.role, rng)
            .into_iter()
            .map(Individual::new)
            .collect()
    }

    /// Appends offspring and returns the index of the first one.
    pub fn add_offspring(&mut self, offspring: Vec<Individual>) -> usize {
        let start = self.individuals.len();
        self.individuals.extend(offspring);
        start
    }

    /// Shrinks back to μ with the configured survival selection.
    pub fn select_survivors<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let chosen = self
            .config
            .survival_selection
            .select(&self.fitnesses(), self.config.mu, rng);
        self.individuals = chosen
            .into_iter()
            .map(|i| self.individuals[i].clone())
            .collect();
    }
}
