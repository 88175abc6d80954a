use crate::config::{AppConfig, Strategy};
use crate::data::maps::MapPool;
use crate::data::reports::{self, RowLog};
use crate::engines::evaluation::MatchRunner;
use crate::engines::generation::{
    CoevolutionEngine, GpEngine, ProgressCallback, RunResult,
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: usize,
    pub seed: u64,
    pub evals: usize,
    pub generations: usize,
    pub pursued_high_fitness: f64,
    pub pursued_high_score: f64,
    pub pursuer_high_fitness: Option<f64>,
    pub cross_play_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub seed: u64,
    pub strategy: Strategy,
    pub started: DateTime<Utc>,
    pub best_run: usize,
    pub best_fitness: f64,
    pub runs: Vec<RunSummary>,
}

/// A configured series of independent runs sharing one map pool.
pub struct Experiment {
    config: AppConfig,
    config_toml: String,
    maps: Arc<MapPool>,
    seed: u64,
}

impl Experiment {
    pub fn new(config: AppConfig, maps: MapPool) -> Result<Self> {
        let seed = match config.basic.random_seed {
            Some(seed) => seed,
            None => {
                let seed = rand::thread_rng().gen();
                log::info!("No random_seed configured; using {}", seed);
                seed
            }
        };
        let config_toml = toml::to_string_pretty(&config)?;
        Ok(Self {
            config,
            config_toml,
            maps: Arc::new(maps),
            seed,
        })
    }

    /// Loads the map pool from `basic.map_dir`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let maps = MapPool::load_dir(&config.basic.map_dir)?;
        Self::new(config, maps)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn run_once<C: ProgressCallback>(&self, seed: u64, callback: &mut C) -> RunResult {
        let basic = &self.config.basic;
        let runner = MatchRunner::new(self.config.game.clone(), Arc::clone(&self.maps));
        match basic.strategy {
            Strategy::Ccegp => CoevolutionEngine::new(
                self.config.pursued.clone(),
                self.config.pursuer.clone(),
                runner,
                basic.num_fitness_evals_per_run,
                basic.termination,
                seed,
            )
            .run(callback),
            Strategy::Gp => GpEngine::new(
                self.config.pursued.clone(),
                runner,
                basic.num_fitness_evals_per_run,
                basic.termination,
                seed,
            )
            .run(callback),
        }
    }

    /// Runs every configured run and writes all output files.
    pub fn run<C: ProgressCallback>(&self, callback: &mut C) -> Result<ExperimentSummary> {
        let basic = &self.config.basic;
        let outputs = &basic.outputs;
        let coevolving = basic.strategy == Strategy::Ccegp;
        let started = Utc::now();

        log::info!(
            "Starting {} experiment: {} runs, seed {}",
            basic.strategy.name(),
            basic.num_runs,
            self.seed
        );

        let mut log = RowLog::create_at(&outputs.log_file, "Result Log", &self.config_toml, started)?;
        let mut parsimony_log =
            RowLog::create_at(&outputs.parsimony_log_file, "Parsimony Log", &self.config_toml, started)?;
        let mut pursuer_logs = if coevolving {
            Some((
                RowLog::create_at(&outputs.pursuer_log_file, "Pursuer Result Log", &self.config_toml, started)?,
                RowLog::create_at(
                    &outputs.pursuer_parsimony_log_file,
                    "Pursuer Parsimony Log",
                    &self.config_toml,
                    started,
                )?,
            ))
        } else {
            None
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut runs = Vec::with_capacity(basic.num_runs);
        let mut best: Option<(usize, RunResult)> = None;

        for run in 1..=basic.num_runs {
            let run_seed: u64 = rng.gen();
            log::info!("Run {} (seed {})", run, run_seed);
            let result = self.run_once(run_seed, callback);
            callback.on_run_complete(run, result.evals);

            log.begin_run(run)?;
            log.write_rows(&result.pursued_log.fitness)?;
            parsimony_log.begin_run(run)?;
            parsimony_log.write_rows(&result.pursued_log.parsimony)?;
            if let Some((fitness_log, pars_log)) = pursuer_logs.as_mut() {
                fitness_log.begin_run(run)?;
                fitness_log.write_rows(&result.pursuer_log.fitness)?;
                pars_log.begin_run(run)?;
                pars_log.write_rows(&result.pursuer_log.parsimony)?;
            }

            let cross_play_file = match &result.cross_play {
                Some(matrix) => Some(reports::write_cross_play(
                    &outputs.cross_play_file_root,
                    run,
                    matrix,
                )?),
                None => None,
            };

            runs.push(RunSummary {
                run,
                seed: run_seed,
                evals: result.evals,
                generations: result.generations,
                pursued_high_fitness: result.pursued_high_fitness,
                pursued_high_score: result.pursued_high_score,
                pursuer_high_fitness: result.pursuer_high_fitness,
                cross_play_file,
            });

            let improved = best
                .as_ref()
                .map_or(true, |(_, b)| result.experiment_fitness() > b.experiment_fitness());
            if improved {
                best = Some((run, result));
            }
        }

        log.flush()?;
        parsimony_log.flush()?;
        if let Some((fitness_log, pars_log)) = pursuer_logs.as_mut() {
            fitness_log.flush()?;
            pars_log.flush()?;
        }

        let (best_run, best_fitness) = match &best {
            Some((run, result)) => {
                reports::write_solution(&outputs.pursued_solution_file, &result.pursued_best.tree)?;
                if let Some(pursuer) = &result.pursuer_best {
                    reports::write_solution(&outputs.pursuer_solution_file, &pursuer.tree)?;
                }
                reports::write_world(&outputs.world_file, &result.world)?;
                log::info!(
                    "Best run {} with fitness {}",
                    run,
                    result.experiment_fitness()
                );
                (*run, result.experiment_fitness())
            }
            None => (0, f64::NEG_INFINITY),
        };

        let summary = ExperimentSummary {
            seed: self.seed,
            strategy: basic.strategy,
            started,
            best_run,
            best_fitness,
            runs,
        };
        reports::write_summary(&outputs.summary_file, &summary)?;
        Ok(summary)
    }
}
