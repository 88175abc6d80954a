pub mod coevolution_engine;
pub mod cross_play;
pub mod genome;
pub mod gp_engine;
pub mod operators;
pub mod population;
pub mod progress;
pub mod selection;

pub use coevolution_engine::{CoevolutionEngine, RoleLog, RunResult};
pub use cross_play::CrossPlayMatrix;
pub use genome::{GrowthMethod, Node, NodeKind, Operator, Tree};
pub use gp_engine::GpEngine;
pub use population::{FitnessLogRow, Individual, ParsimonyLogRow, Population, UNEVALUATED};
pub use progress::{ConsoleProgressCallback, ProgressCallback, SilentProgress};
