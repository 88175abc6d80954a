use crate::config::{PopulationConfig, Termination};
use crate::engines::evaluation::{pursued_fitness, MatchRunner, WorldTrace};
use crate::engines::generation::{
    coevolution_engine::{should_terminate, RoleLog, RunResult},
    population::Population,
    progress::ProgressCallback,
};
use crate::types::Role;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Evolves pursued controllers against randomly moving pursuers.
pub struct GpEngine {
    population: Population,
    runner: MatchRunner,
    budget: usize,
    termination: Termination,
    rng: StdRng,
}

impl GpEngine {
    pub fn new(
        config: PopulationConfig,
        runner: MatchRunner,
        budget: usize,
        termination: Termination,
        seed: u64,
    ) -> Self {
        Self {
            population: Population::new(Role::Pursued, config),
            runner,
            budget,
            termination,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn run<C: ProgressCallback>(&mut self, callback: &mut C) -> RunResult {
        self.population.initialize(&mut self.rng);

        let mut evals = 0;
        let mut generation = 0;
        let mut log = RoleLog::default();

        self.evaluate(0, &mut evals, false, callback);

        loop {
            generation += 1;
            self.population.generation_bookkeeping();
            self.population.calc_run_stats();
            self.population.clear_traces();
            log.record(&self.population, evals);
            callback.on_generation_complete(
                generation,
                evals,
                self.population.generation_stats().high_fitness,
                None,
            );

            if should_terminate(
                self.termination,
                evals,
                self.budget,
                self.population.evals_with_no_change(),
            ) {
                break;
            }

            let parents = self.population.select_parents(&mut self.rng);
            let offspring = self.population.breed(&parents, &mut self.rng);
            let start = self.population.add_offspring(offspring);
            self.evaluate(start, &mut evals, true, callback);
            self.population.select_survivors(&mut self.rng);
        }

        let run = self.population.run_stats().clone();
        let best = run
            .best
            .unwrap_or_else(|| self.population.individuals()[0].clone());
        let world = best.trace.clone().unwrap_or_else(WorldTrace::new);

        RunResult {
            evals,
            generations: generation,
            pursued_best: best,
            pursued_high_fitness: run.high_fitness,
            pursued_high_score: run.high_score,
            pursuer_best: None,
            pursuer_high_fitness: None,
            world,
            cross_play: None,
            pursued_log: log,
            pursuer_log: RoleLog::default(),
        }
    }

    /// One match per individual from `start` onward. Only matches that beat
    /// every fitness seen so far keep their trace.
    fn evaluate<C: ProgressCallback>(
        &mut self,
        start: usize,
        evals: &mut usize,
        track_stagnation: bool,
        callback: &mut C,
    ) {
        let count = self.population.len() - start;
        let seeds: Vec<u64> = (0..count).map(|_| self.rng.gen()).collect();

        let individuals = &self.population.individuals()[start..];
        let parsimony = self.population.config().parsimony;
        let runner = &self.runner;

        let results: Vec<_> = seeds
            .par_iter()
            .zip(individuals.par_iter())
            .map(|(&seed, individual)| {
                let mut match_rng = StdRng::seed_from_u64(seed);
                let outcome = runner.play_against_random(&individual.tree, &mut match_rng);
                let fitness = pursued_fitness(&outcome, &individual.tree, &parsimony);
                (fitness, outcome.trace)
            })
            .collect();

        let previous_high = self.population.previous_high_fitness();
        let mut trace_high = self.population.run_stats().high_fitness;
        for (offset, (fitness, trace)) in results.into_iter().enumerate() {
            *evals += 1;
            if track_stagnation {
                self.population.record_evaluation(fitness.fitness, previous_high);
            }
            callback.on_evaluation(*evals, self.budget);

            let individual = &mut self.population.individuals_mut()[start + offset];
            individual.fitness = fitness.fitness;
            individual.score = fitness.score;
            if fitness.fitness > trace_high {
                trace_high = fitness.fitness;
                individual.trace = Some(trace);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::data::maps::{GameMap, MapPool};
    use crate::engines::generation::progress::SilentProgress;
    use std::sync::Arc;

    fn engine(seed: u64) -> GpEngine {
        let config = PopulationConfig {
            mu: 6,
            lambda: 3,
            dmax_init: 3,
            dmax_overall: 4,
            ..PopulationConfig::default()
        };
        let pool = Arc::new(MapPool::new(vec![GameMap::open(5, 4)]).unwrap());
        let runner = MatchRunner::new(GameConfig::default(), pool);
        GpEngine::new(config, runner, 15, Termination::NumberOfEvals, seed)
    }

    #[test]
    fn test_gp_run_budget() {
        let mut engine = engine(2);
        let result = engine.run(&mut SilentProgress);
        // 6 initial evaluations then 3 per generation.
        assert_eq!(result.evals, 15);
        assert_eq!(result.generations, 4);
        assert!(result.cross_play.is_none());
        assert!(result.pursuer_best.is_none());
        assert!(result.pursuer_log.fitness.is_empty());
        assert_eq!(engine.population().len(), 6);
    }

    #[test]
    fn test_budget_overshoots_to_generation_boundary() {
        let mut engine = engine(2);
        engine.budget = 16;
        let result = engine.run(&mut SilentProgress);
        let evals: Vec<usize> = result.pursued_log.fitness.iter().map(|r| r.evals).collect();
        assert_eq!(evals, vec![6, 9, 12, 15, 18]);
        assert_eq!(result.evals, 18);
    }

    #[test]
    fn test_world_is_run_best_trace() {
        let mut engine = engine(6);
        let result = engine.run(&mut SilentProgress);
        assert_eq!(Some(&result.world), result.pursued_best.trace.as_ref());
        assert!(!result.world.is_empty());
        assert!(engine.population().individuals().iter().all(|i| i.trace.is_none()));
    }
}
