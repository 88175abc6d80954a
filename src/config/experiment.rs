use super::manager::Settings;
use super::traits::{reset_field, ConfigSection};
use crate::error::ChaseError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Drawn from entropy (and logged) when absent.
    pub random_seed: Option<u64>,
    pub strategy: Strategy,
    pub num_runs: usize,
    pub num_fitness_evals_per_run: usize,
    pub map_dir: PathBuf,
    pub termination: Termination,
    pub outputs: OutputPaths,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Pursued population against randomly moving pursuers.
    Gp,
    /// Competitive coevolution of both populations.
    Ccegp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    NumberOfEvals,
    /// Stop after `n` consecutive evaluations without pursued improvement.
    Convergence { n: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub log_file: PathBuf,
    pub pursuer_log_file: PathBuf,
    pub parsimony_log_file: PathBuf,
    pub pursuer_parsimony_log_file: PathBuf,
    pub pursued_solution_file: PathBuf,
    pub pursuer_solution_file: PathBuf,
    pub world_file: PathBuf,
    pub cross_play_file_root: PathBuf,
    pub summary_file: PathBuf,
}

const DEFAULT_N_FOR_CONVERGENCE: usize = 10;

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("logs/default_log.txt"),
            pursuer_log_file: PathBuf::from("logs/default_pursuer_log.txt"),
            parsimony_log_file: PathBuf::from("data/default_parsimony_log.txt"),
            pursuer_parsimony_log_file: PathBuf::from("data/default_pursuer_parsimony_log.txt"),
            pursued_solution_file: PathBuf::from("solutions/default_pursued_solution.txt"),
            pursuer_solution_file: PathBuf::from("solutions/default_pursuer_solution.txt"),
            world_file: PathBuf::from("worlds/default_world.txt"),
            cross_play_file_root: PathBuf::from("data/default"),
            summary_file: PathBuf::from("data/default_summary.json"),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            random_seed: None,
            strategy: Strategy::Ccegp,
            num_runs: 1,
            num_fitness_evals_per_run: 100,
            map_dir: PathBuf::from("maps"),
            termination: Termination::NumberOfEvals,
            outputs: OutputPaths::default(),
        }
    }
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Gp => "gp",
            Strategy::Ccegp => "ccegp",
        }
    }
}

impl Termination {
    pub fn name(&self) -> &'static str {
        match self {
            Termination::NumberOfEvals => "number_of_evals",
            Termination::Convergence { .. } => "convergence",
        }
    }
}

impl OutputPaths {
    fn from_settings(settings: &Settings, section: &str) -> Self {
        let d = Self::default();
        Self {
            log_file: settings.get_or(section, "log_file_path", d.log_file),
            pursuer_log_file: settings.get_or(section, "pursuer_log_file_path", d.pursuer_log_file),
            parsimony_log_file: settings.get_or(
                section,
                "parsimony_log_file_path",
                d.parsimony_log_file,
            ),
            pursuer_parsimony_log_file: settings.get_or(
                section,
                "pursuer_parsimony_log_file_path",
                d.pursuer_parsimony_log_file,
            ),
            pursued_solution_file: settings.get_or(
                section,
                "pursued_solution_file_path",
                d.pursued_solution_file,
            ),
            pursuer_solution_file: settings.get_or(
                section,
                "pursuer_solution_file_path",
                d.pursuer_solution_file,
            ),
            world_file: settings.get_or(section, "high_score_world_file_path", d.world_file),
            cross_play_file_root: settings.get_or(
                section,
                "cross_play_file_path_root",
                d.cross_play_file_root,
            ),
            summary_file: settings.get_or(section, "summary_file_path", d.summary_file),
        }
    }
}

impl ConfigSection for ExperimentConfig {
    fn section_name() -> &'static str {
        "basic"
    }

    fn from_settings(settings: &Settings, section: &str) -> Result<Self, ChaseError> {
        let default = Self::default();

        let strategy_name: String =
            settings.get_or(section, "strategy", default.strategy.name().to_string());
        let strategy = match strategy_name.trim().to_lowercase().as_str() {
            "gp" => Strategy::Gp,
            "ccegp" => Strategy::Ccegp,
            other => {
                return Err(ChaseError::UnknownMethod {
                    setting: format!("{}.strategy", section),
                    value: other.to_string(),
                })
            }
        };

        let termination_name: String =
            settings.get_or(section, "termination", default.termination.name().to_string());
        let termination = match termination_name.trim().to_lowercase().as_str() {
            "number_of_evals" => Termination::NumberOfEvals,
            "convergence" => Termination::Convergence {
                n: settings.get_or(section, "n_for_convergence", DEFAULT_N_FOR_CONVERGENCE),
            },
            other => {
                return Err(ChaseError::UnknownMethod {
                    setting: format!("{}.termination", section),
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            random_seed: settings.get_opt(section, "random_seed"),
            strategy,
            num_runs: settings.get_or(section, "num_runs_per_experiment", default.num_runs),
            num_fitness_evals_per_run: settings.get_or(
                section,
                "num_fitness_evals_per_run",
                default.num_fitness_evals_per_run,
            ),
            map_dir: settings.get_or(section, "map_dir", default.map_dir),
            termination,
            outputs: OutputPaths::from_settings(settings, section),
        })
    }

    fn repair(mut self, section: &str) -> Self {
        let default = Self::default();
        if self.num_runs == 0 {
            reset_field(
                section,
                "num_runs_per_experiment",
                &mut self.num_runs,
                default.num_runs,
                "must be at least 1",
            );
        }
        if self.num_fitness_evals_per_run == 0 {
            reset_field(
                section,
                "num_fitness_evals_per_run",
                &mut self.num_fitness_evals_per_run,
                default.num_fitness_evals_per_run,
                "must be at least 1",
            );
        }
        if let Termination::Convergence { n } = &mut self.termination {
            if *n == 0 {
                reset_field(
                    section,
                    "n_for_convergence",
                    n,
                    DEFAULT_N_FOR_CONVERGENCE,
                    "must be at least 1",
                );
            }
        }
        self
    }

    fn validate(&self) -> Result<(), ChaseError> {
        if self.num_runs == 0 {
            return Err(ChaseError::Configuration(
                "num_runs_per_experiment must be at least 1".to_string(),
            ));
        }
        if self.num_fitness_evals_per_run == 0 {
            return Err(ChaseError::Configuration(
                "num_fitness_evals_per_run must be at least 1".to_string(),
            ));
        }
        if let Termination::Convergence { n: 0 } = self.termination {
            return Err(ChaseError::Configuration(
                "n_for_convergence must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
