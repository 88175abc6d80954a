use super::controller::{Controller, RandomController, TreeController};
use super::game_state::GameState;
use super::trace::WorldTrace;
use crate::config::GameConfig;
use crate::data::maps::MapPool;
use crate::engines::generation::genome::Tree;
use rand::RngCore;
use std::sync::Arc;

/// Result of one finished match.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub score: f64,
    pub time: u32,
    pub orig_time: u32,
    pub pursuer_won: bool,
    pub turns: u32,
    pub trace: WorldTrace,
}

impl MatchOutcome {
    /// `floor(100 * time / orig_time)`.
    pub fn time_bonus(&self) -> f64 {
        (f64::from(self.time) * 100.0 / f64::from(self.orig_time)).trunc()
    }
}

/// Plays matches on maps drawn from a shared pool.
#[derive(Clone)]
pub struct MatchRunner {
    game: GameConfig,
    maps: Arc<MapPool>,
}

impl MatchRunner {
    pub fn new(game: GameConfig, maps: Arc<MapPool>) -> Self {
        Self { game, maps }
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.game
    }

    pub fn play(
        &self,
        pursued: &dyn Controller,
        pursuers: &dyn Controller,
        rng: &mut dyn RngCore,
    ) -> MatchOutcome {
        let map = self.maps.choose(rng);
        let state = GameState::new(map, &self.game, rng);
        Self::play_state(state, pursued, pursuers, rng)
    }

    pub fn play_trees(&self, pursued: &Tree, pursuer: &Tree, rng: &mut dyn RngCore) -> MatchOutcome {
        self.play(&TreeController::new(pursued), &TreeController::new(pursuer), rng)
    }

    pub fn play_against_random(&self, pursued: &Tree, rng: &mut dyn RngCore) -> MatchOutcome {
        self.play(&TreeController::new(pursued), &RandomController, rng)
    }

    /// Runs `state` to completion.
    pub fn play_state(
        mut state: GameState,
        pursued: &dyn Controller,
        pursuers: &dyn Controller,
        rng: &mut dyn RngCore,
    ) -> MatchOutcome {
        let mut trace = WorldTrace::new();
        state.write_world_config(&mut trace);

        let mut turns = 0;
        loop {
            turns += 1;
            if state.play_turn(pursued, pursuers, &mut trace, rng) {
                break;
            }
        }

        log::debug!(
            "Match finished after {} turns: score {}, pursuer won {}",
            turns,
            state.score(),
            state.pursuer_won()
        );

        MatchOutcome {
            score: state.score(),
            time: state.time(),
            orig_time: state.orig_time(),
            pursuer_won: state.pursuer_won(),
            turns,
            trace,
        }
    }
}
