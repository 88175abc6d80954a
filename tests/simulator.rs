use chasegp::config::GameConfig;
use chasegp::data::maps::GameMap;
use chasegp::engines::evaluation::{
    Agent, Controller, GameState, MatchRunner, RandomController, TreeController, WorldTrace,
};
use chasegp::engines::generation::{Operator, Tree};
use chasegp::types::{Feature, Position};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn quiet_config(num_pursuers: usize) -> GameConfig {
    GameConfig {
        fruit_spawning_probability: 0.0,
        num_pursuers,
        ..GameConfig::default()
    }
}

fn pill_seeker() -> Tree {
    Tree::operator(
        Operator::Sub,
        Tree::constant(0.0),
        Tree::feature(Feature::NearestPill),
    )
}

#[test]
fn test_pursued_eats_last_pill_with_time_bonus() {
    let map = GameMap::open(2, 2);
    let state = GameState::with_pills(&map, &quiet_config(1), &[Position::new(0, 0)]).unwrap();
    let pursued = pill_seeker();
    let pursuer = Tree::constant(1.0);

    let outcome = MatchRunner::play_state(
        state,
        &TreeController::new(&pursued),
        &TreeController::new(&pursuer),
        &mut StdRng::seed_from_u64(0),
    );

    assert_eq!(outcome.turns, 1);
    assert!(!outcome.pursuer_won);
    assert_eq!(outcome.orig_time, 4);
    assert_eq!(outcome.time, 3);
    assert_eq!(outcome.score, 175.0);
    assert_eq!(
        outcome.trace.to_string(),
        "2\n2\nm 0 1\n1 1 0\np 0 0\nt 4 0\nm 0 0\n1 1 1\nt 3 175\n"
    );
}

#[test]
fn test_match_times_out_without_reaching_pill() {
    let map = GameMap::open(2, 2);
    let state = GameState::with_pills(&map, &quiet_config(0), &[Position::new(1, 0)]).unwrap();
    // A constant tree keeps stepping between the two left cells.
    let pursued = Tree::constant(3.0);

    let outcome = MatchRunner::play_state(
        state,
        &TreeController::new(&pursued),
        &RandomController,
        &mut StdRng::seed_from_u64(0),
    );

    assert_eq!(outcome.turns, 4);
    assert_eq!(outcome.time, 0);
    assert_eq!(outcome.score, 0.0);
    assert!(!outcome.pursuer_won);
}

#[test]
fn test_capture_on_same_cell() {
    // Single row: the pursued agent steps right toward the pill while the
    // pursuer's only move is left.
    let map = GameMap::open(3, 1);
    let state = GameState::with_pills(&map, &quiet_config(1), &[Position::new(2, 0)]).unwrap();
    let pursued = pill_seeker();
    let pursuer = Tree::constant(0.0);

    let outcome = MatchRunner::play_state(
        state,
        &TreeController::new(&pursued),
        &TreeController::new(&pursuer),
        &mut StdRng::seed_from_u64(0),
    );

    assert!(outcome.pursuer_won);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.score, 0.0);
}

#[test]
fn test_fruit_spawns_on_open_cell() {
    let map = GameMap::from_walls(3, 3, &[Position::new(1, 1)]).unwrap();
    let config = GameConfig {
        fruit_spawning_probability: 1.0,
        num_pursuers: 0,
        ..GameConfig::default()
    };
    let mut state = GameState::with_pills(&map, &config, &[Position::new(2, 0)]).unwrap();
    let pursued = Tree::constant(0.0);
    let controller = TreeController::new(&pursued);
    let mut trace = WorldTrace::new();
    let mut rng = StdRng::seed_from_u64(12);

    let over = state.play_turn(&controller, &RandomController, &mut trace, &mut rng);

    assert!(!over);
    let fruit = state.fruit_pos().unwrap();
    assert_ne!(fruit, state.pursued_pos());
    assert_ne!(fruit, Position::new(1, 1));
    assert_ne!(fruit, Position::new(2, 0));
    assert!(trace
        .to_string()
        .lines()
        .any(|l| l == format!("f {} {}", fruit.x, fruit.y)));
}

#[test]
fn test_random_controller_never_stays() {
    let map = GameMap::open(3, 3);
    let state = GameState::with_pills(&map, &quiet_config(1), &[]).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let pos = RandomController.decide_move(&state, Agent::Pursuer(0), &mut rng);
        assert_ne!(pos, Position::new(2, 0));
    }
}
