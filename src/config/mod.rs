pub mod traits;
pub mod evolution;
pub mod experiment;
pub mod game;
pub mod manager;

pub use manager::{AppConfig, ConfigManager, Settings};
pub use evolution::{Parsimony, ParsimonyTechnique, ParentSelection, PopulationConfig, SurvivalSelection};
pub use experiment::{ExperimentConfig, OutputPaths, Strategy, Termination};
pub use game::GameConfig;
