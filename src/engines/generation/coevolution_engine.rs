use crate::config::{PopulationConfig, Termination};
use crate::engines::evaluation::{pursued_fitness, pursuer_fitness, MatchRunner, WorldTrace};
use crate::engines::generation::{
    cross_play::CrossPlayMatrix,
    population::{FitnessLogRow, Individual, ParsimonyLogRow, Population},
    progress::ProgressCallback,
};
use crate::types::Role;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

/// Per-generation log rows of one population.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleLog {
    pub fitness: Vec<FitnessLogRow>,
    pub parsimony: Vec<ParsimonyLogRow>,
}

impl RoleLog {
    pub(crate) fn record(&mut self, population: &Population, evals: usize) {
        self.fitness.push(population.fitness_row(evals));
        self.parsimony.push(population.parsimony_row(evals));
    }
}

/// Everything a finished run hands back to the experiment.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub evals: usize,
    pub generations: usize,
    pub pursued_best: Individual,
    pub pursued_high_fitness: f64,
    pub pursued_high_score: f64,
    pub pursuer_best: Option<Individual>,
    pub pursuer_high_fitness: Option<f64>,
    pub world: WorldTrace,
    pub cross_play: Option<CrossPlayMatrix>,
    pub pursued_log: RoleLog,
    pub pursuer_log: RoleLog,
}

impl RunResult {
    /// Value compared across runs to pick the experiment best.
    pub fn experiment_fitness(&self) -> f64 {
        self.pursued_high_fitness + self.pursuer_high_fitness.unwrap_or(0.0)
    }
}

pub(crate) fn should_terminate(termination: Termination, evals: usize, budget: usize, stagnant: usize) -> bool {
    match termination {
        Termination::NumberOfEvals => evals >= budget,
        Termination::Convergence { n } => {
            if stagnant >= n {
                log::info!("Converged at {} evals", evals);
                true
            } else {
                false
            }
        }
    }
}

struct MatchRecord {
    pursued: usize,
    pursuer: usize,
    pursued_fitness: f64,
    pursued_score: f64,
    pursuer_fitness: f64,
    pursuer_score: f64,
}

/// Competitive coevolution of a pursued and a pursuer population.
pub struct CoevolutionEngine {
    pursued: Population,
    pursuer: Population,
    runner: MatchRunner,
    budget: usize,
    termination: Termination,
    rng: StdRng,
}

impl CoevolutionEngine {
    pub fn new(
        pursued_config: PopulationConfig,
        pursuer_config: PopulationConfig,
        runner: MatchRunner,
        budget: usize,
        termination: Termination,
        seed: u64,
    ) -> Self {
        Self {
            pursued: Population::new(Role::Pursued, pursued_config),
            pursuer: Population::new(Role::Pursuer, pursuer_config),
            runner,
            budget,
            termination,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pursued(&self) -> &Population {
        &self.pursued
    }

    pub fn pursuer(&self) -> &Population {
        &self.pursuer
    }

    /// Run the coevolution process
    pub fn run<C: ProgressCallback>(&mut self, callback: &mut C) -> RunResult {
        self.pursued.initialize(&mut self.rng);
        self.pursuer.initialize(&mut self.rng);

        let mut evals = 0;
        let mut generation = 0;
        let mut pursued_log = RoleLog::default();
        let mut pursuer_log = RoleLog::default();

        let all_pursued: Vec<usize> = (0..self.pursued.len()).collect();
        let all_pursuers: Vec<usize> = (0..self.pursuer.len()).collect();
        self.pairing_round(all_pursued, all_pursuers, &mut evals, callback);

        loop {
            generation += 1;
            self.pursued.generation_bookkeeping();
            self.pursuer.generation_bookkeeping();
            self.pursued.calc_run_stats();
            self.pursuer.calc_run_stats();
            pursued_log.record(&self.pursued, evals);
            pursuer_log.record(&self.pursuer, evals);

            callback.on_generation_complete(
                generation,
                evals,
                self.pursued.generation_stats().high_fitness,
                Some(self.pursuer.generation_stats().high_fitness),
            );

            if should_terminate(
                self.termination,
                evals,
                self.budget,
                self.pursued.evals_with_no_change(),
            ) {
                break;
            }

            let pursued_parents = self.pursued.select_parents(&mut self.rng);
            let pursuer_parents = self.pursuer.select_parents(&mut self.rng);

            let pursued_offspring = self.pursued.breed(&pursued_parents, &mut self.rng);
            let pursued_start = self.pursued.add_offspring(pursued_offspring);
            let pursuer_offspring = self.pursuer.breed(&pursuer_parents, &mut self.rng);
            let pursuer_start = self.pursuer.add_offspring(pursuer_offspring);

            self.pairing_round(
                (pursued_start..self.pursued.len()).collect(),
                (pursuer_start..self.pursuer.len()).collect(),
                &mut evals,
                callback,
            );

            self.pursued.select_survivors(&mut self.rng);
            self.pursuer.select_survivors(&mut self.rng);
        }

        self.finish(evals, generation, pursued_log, pursuer_log)
    }

    /// Plays `max(|A|, |B|)` matches pairing the shuffled lists cyclically.
    /// Each individual ends up with the mean over its matches.
    fn pairing_round<C: ProgressCallback>(
        &mut self,
        mut pursued_idx: Vec<usize>,
        mut pursuer_idx: Vec<usize>,
        evals: &mut usize,
        callback: &mut C,
    ) {
        if pursued_idx.is_empty() || pursuer_idx.is_empty() {
            return;
        }
        pursued_idx.shuffle(&mut self.rng);
        pursuer_idx.shuffle(&mut self.rng);

        let num_matches = pursued_idx.len().max(pursuer_idx.len());
        let seeds: Vec<u64> = (0..num_matches).map(|_| self.rng.gen()).collect();

        let pursued = self.pursued.individuals();
        let pursuers = self.pursuer.individuals();
        let pursued_parsimony = self.pursued.config().parsimony;
        let pursuer_parsimony = self.pursuer.config().parsimony;
        let runner = &self.runner;

        let records: Vec<MatchRecord> = seeds
            .par_iter()
            .enumerate()
            .map(|(m, &seed)| {
                let a = pursued_idx[m % pursued_idx.len()];
                let b = pursuer_idx[m % pursuer_idx.len()];
                let mut match_rng = StdRng::seed_from_u64(seed);
                let outcome = runner.play_trees(&pursued[a].tree, &pursuers[b].tree, &mut match_rng);
                let pf = pursued_fitness(&outcome, &pursued[a].tree, &pursued_parsimony);
                let gf = pursuer_fitness(&outcome, &pursuers[b].tree, &pursuer_parsimony);
                MatchRecord {
                    pursued: a,
                    pursuer: b,
                    pursued_fitness: pf.fitness,
                    pursued_score: pf.score,
                    pursuer_fitness: gf.fitness,
                    pursuer_score: gf.score,
                }
            })
            .collect();

        let previous_high = self.pursued.previous_high_fitness();
        let mut pursued_sums = Accumulator::new(self.pursued.len());
        let mut pursuer_sums = Accumulator::new(self.pursuer.len());

        for record in records {
            *evals += 1;
            self.pursued.record_evaluation(record.pursued_fitness, previous_high);
            callback.on_evaluation(*evals, self.budget);

            pursued_sums.add(record.pursued, record.pursued_fitness, record.pursued_score);
            pursuer_sums.add(record.pursuer, record.pursuer_fitness, record.pursuer_score);
        }

        pursued_sums.apply(self.pursued.individuals_mut());
        pursuer_sums.apply(self.pursuer.individuals_mut());
    }

    fn finish(
        &mut self,
        evals: usize,
        generations: usize,
        pursued_log: RoleLog,
        pursuer_log: RoleLog,
    ) -> RunResult {
        let cross_play = CrossPlayMatrix::compute(
            &self.pursued.run_stats().generation_bests,
            &self.pursuer.run_stats().generation_bests,
            &self.runner,
            &self.pursued.config().parsimony,
            &mut self.rng,
        );

        let pursued_run = self.pursued.run_stats().clone();
        let pursuer_run = self.pursuer.run_stats().clone();
        let pursued_best = pursued_run
            .best
            .unwrap_or_else(|| self.pursued.individuals()[0].clone());
        let pursuer_best = pursuer_run
            .best
            .unwrap_or_else(|| self.pursuer.individuals()[0].clone());

        log::info!(
            "Exhibition match: pursued {} vs pursuer {}",
            pursued_best.fitness,
            pursuer_best.fitness
        );
        let mut exhibition_rng = StdRng::seed_from_u64(self.rng.gen());
        let exhibition = self
            .runner
            .play_trees(&pursued_best.tree, &pursuer_best.tree, &mut exhibition_rng);

        RunResult {
            evals,
            generations,
            pursued_best,
            pursued_high_fitness: pursued_run.high_fitness,
            pursued_high_score: pursued_run.high_score,
            pursuer_best: Some(pursuer_best),
            pursuer_high_fitness: Some(pursuer_run.high_fitness),
            world: exhibition.trace,
            cross_play: Some(cross_play),
            pursued_log,
            pursuer_log,
        }
    }
}

/// Running sums of fitness and score per individual.
struct Accumulator {
    fitness: Vec<f64>,
    score: Vec<f64>,
    count: Vec<usize>,
}

impl Accumulator {
    fn new(len: usize) -> Self {
        Self {
            fitness: vec![0.0; len],
            score: vec![0.0; len],
            count: vec![0; len],
        }
    }

    fn add(&mut self, index: usize, fitness: f64, score: f64) {
        self.fitness[index] += fitness;
        self.score[index] += score;
        self.count[index] += 1;
    }

    fn apply(&self, individuals: &mut [Individual]) {
        for (i, individual) in individuals.iter_mut().enumerate() {
            if self.count[i] > 0 {
                let n = self.count[i] as f64;
                individual.fitness = self.fitness[i] / n;
                individual.score = self.score[i] / n;
            }
        }
    }
}
