pub mod controller;
pub mod fitness;
pub mod game_state;
pub mod match_runner;
pub mod trace;

pub use controller::{Controller, RandomController, TreeController};
pub use fitness::{pursued_fitness, pursuer_fitness, MatchFitness};
pub use game_state::{Agent, GameState};
pub use match_runner::{MatchOutcome, MatchRunner};
pub use trace::{TraceLine, WorldTrace};
