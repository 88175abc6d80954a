use super::game_state::{Agent, GameState};
use crate::engines::generation::genome::Tree;
use crate::types::Position;
use rand::seq::SliceRandom;
use rand::RngCore;

/// Chooses the next cell for one agent.
pub trait Controller: Send + Sync {
    fn decide_move(&self, state: &GameState, agent: Agent, rng: &mut dyn RngCore) -> Position;
}

/// Scores every legal destination with a genome and takes the best.
pub struct TreeController<'a> {
    tree: &'a Tree,
}

impl<'a> TreeController<'a> {
    pub fn new(tree: &'a Tree) -> Self {
        Self { tree }
    }
}

impl<'a> Controller for TreeController<'a> {
    fn decide_move(&self, state: &GameState, agent: Agent, rng: &mut dyn RngCore) -> Position {
        let mut best: Option<(Position, f64)> = None;
        for pos in state.valid_positions(agent) {
            let value = self.tree.evaluate(&state.features(agent, pos), rng);
            match best {
                Some((_, best_value)) if !(value > best_value) => {}
                _ => best = Some((pos, value)),
            }
        }
        best.map_or_else(|| state.agent_pos(agent), |(pos, _)| pos)
    }
}

/// Uniformly random legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomController;

impl Controller for RandomController {
    fn decide_move(&self, state: &GameState, agent: Agent, rng: &mut dyn RngCore) -> Position {
        state
            .valid_positions(agent)
            .choose(rng)
            .copied()
            .unwrap_or_else(|| state.agent_pos(agent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::data::maps::GameMap;
    use crate::engines::generation::genome::Operator;
    use crate::types::Feature;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state() -> GameState {
        let cfg = GameConfig {
            num_pursuers: 1,
            ..GameConfig::default()
        };
        GameState::with_pills(&GameMap::open(3, 3), &cfg, &[Position::new(0, 0)]).unwrap()
    }

    #[test]
    fn test_first_maximum_wins() {
        let tree = Tree::constant(1.0);
        let controller = TreeController::new(&tree);
        let mut rng = StdRng::seed_from_u64(0);
        // Every candidate ties, so the first one (down) is kept.
        let pos = controller.decide_move(&state(), Agent::Pursued, &mut rng);
        assert_eq!(pos, Position::new(0, 1));
    }

    #[test]
    fn test_moves_toward_pill() {
        let tree = Tree::operator(
            Operator::Sub,
            Tree::constant(0.0),
            Tree::feature(Feature::NearestPill),
        );
        let controller = TreeController::new(&tree);
        let mut rng = StdRng::seed_from_u64(0);
        let pos = controller.decide_move(&state(), Agent::Pursued, &mut rng);
        assert_eq!(pos, Position::new(0, 1));
    }

    #[test]
    fn test_nan_never_selected_over_earlier_value() {
        let tree = Tree::constant(f64::NAN);
        let controller = TreeController::new(&tree);
        let mut rng = StdRng::seed_from_u64(0);
        let pos = controller.decide_move(&state(), Agent::Pursuer(0), &mut rng);
        assert_eq!(pos, Position::new(2, 1));
    }

    #[test]
    fn test_random_controller_stays_legal() {
        let state = state();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let pos = RandomController.decide_move(&state, Agent::Pursuer(0), &mut rng);
            assert!(state.valid_positions(Agent::Pursuer(0)).contains(&pos));
        }
    }
}
