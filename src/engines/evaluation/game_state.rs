use super::controller::Controller;
use super::trace::{TraceLine, WorldTrace};
use crate::config::GameConfig;
use crate::data::maps::GameMap;
use crate::error::{ChaseError, Result};
use crate::types::{Feature, FeatureVector, Position, Role};
use rand::{Rng, RngCore};

/// Distance reported when the set being searched is empty.
pub const NO_TARGET_DISTANCE: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Open,
    Wall,
    Pill,
}

/// The agent a controller is asked to steer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Pursued,
    Pursuer(usize),
}

impl Agent {
    pub fn role(self) -> Role {
        match self {
            Agent::Pursued => Role::Pursued,
            Agent::Pursuer(_) => Role::Pursuer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    time: u32,
    orig_time: u32,
    score: f64,
    fruit_score: f64,
    fruit_spawning_probability: f64,
    fruit_eaten: u32,
    orig_num_pills: usize,
    num_pills_eaten: usize,
    pursued_pos: Position,
    pursuer_pos: Vec<Position>,
    fruit_pos: Option<Position>,
    pursuer_won: bool,
}

impl GameState {
    /// Fresh match on `map` with pills scattered at `pill_density`.
    pub fn new<R: Rng + ?Sized>(map: &GameMap, config: &GameConfig, rng: &mut R) -> Self {
        let mut state = Self::empty(map, config);
        let start = state.pursued_pos;
        for y in 0..state.height {
            for x in 0..state.width {
                let pos = Position::new(x as i32, y as i32);
                if state.cell(pos) == Some(Cell::Open)
                    && pos != start
                    && rng.gen::<f64>() < config.pill_density
                {
                    state.set_cell(pos, Cell::Pill);
                    state.orig_num_pills += 1;
                }
            }
        }
        state
    }

    /// Match with an explicit pill layout.
    pub fn with_pills(map: &GameMap, config: &GameConfig, pills: &[Position]) -> Result<Self> {
        let mut state = Self::empty(map, config);
        for &pos in pills {
            match state.cell(pos) {
                Some(Cell::Open) => {
                    state.set_cell(pos, Cell::Pill);
                    state.orig_num_pills += 1;
                }
                Some(Cell::Pill) => {}
                _ => {
                    return Err(ChaseError::Simulation(format!(
                        "Cannot place pill at ({}, {})",
                        pos.x, pos.y
                    )))
                }
            }
        }
        Ok(state)
    }

    fn empty(map: &GameMap, config: &GameConfig) -> Self {
        let (width, height) = (map.width(), map.height());
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let wall = map.is_wall(Position::new(x as i32, y as i32));
                cells.push(if wall { Cell::Wall } else { Cell::Open });
            }
        }
        let orig_time = ((config.time_multiplier * (width * height) as f64).floor() as u32).max(1);

        Self {
            width,
            height,
            cells,
            time: orig_time,
            orig_time,
            score: 0.0,
            fruit_score: config.fruit_score,
            fruit_spawning_probability: config.fruit_spawning_probability,
            fruit_eaten: 0,
            orig_num_pills: 0,
            num_pills_eaten: 0,
            pursued_pos: Position::new(0, height as i32 - 1),
            pursuer_pos: vec![Position::new(width as i32 - 1, 0); config.num_pursuers],
            fruit_pos: None,
            pursuer_won: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn orig_time(&self) -> u32 {
        self.orig_time
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn pursuer_won(&self) -> bool {
        self.pursuer_won
    }

    pub fn pursued_pos(&self) -> Position {
        self.pursued_pos
    }

    pub fn pursuer_positions(&self) -> &[Position] {
        &self.pursuer_pos
    }

    pub fn fruit_pos(&self) -> Option<Position> {
        self.fruit_pos
    }

    pub fn num_pills(&self) -> usize {
        self.orig_num_pills
    }

    pub fn num_pills_eaten(&self) -> usize {
        self.num_pills_eaten
    }

    pub fn fruit_eaten(&self) -> u32 {
        self.fruit_eaten
    }

    pub fn all_pills_eaten(&self) -> bool {
        self.num_pills_eaten == self.orig_num_pills
    }

    pub fn agent_pos(&self, agent: Agent) -> Position {
        match agent {
            Agent::Pursued => self.pursued_pos,
            Agent::Pursuer(id) => self.pursuer_pos[id],
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    fn set_cell(&mut self, pos: Position, cell: Cell) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = cell;
        }
    }

    fn is_legal(&self, pos: Position) -> bool {
        matches!(self.cell(pos), Some(Cell::Open) | Some(Cell::Pill))
    }

    /// Legal destinations in up, down, right, left order. Only the pursued agent may stay.
    pub fn valid_positions(&self, agent: Agent) -> Vec<Position> {
        let pos = self.agent_pos(agent);
        let mut moves: Vec<Position> = [pos.up(), pos.down(), pos.right(), pos.left()]
            .into_iter()
            .filter(|&p| self.is_legal(p))
            .collect();
        if agent == Agent::Pursued {
            moves.push(pos);
        }
        moves
    }

    /// Sensor readings as seen by `agent` if it stood on `pos`.
    pub fn features(&self, agent: Agent, pos: Position) -> FeatureVector {
        let mut values = [0.0; Feature::COUNT];
        let own_pursuer = match agent {
            Agent::Pursuer(id) => Some(id),
            Agent::Pursued => None,
        };
        values[Feature::NearestPursuer.index()] = self.nearest_pursuer(pos, own_pursuer);
        values[Feature::NearestPill.index()] = self.nearest_pill(pos);
        values[Feature::AdjacentWalls.index()] = self.adjacent_walls(pos);
        values[Feature::Fruit.index()] = self.fruit_distance(pos);
        values[Feature::NearestPursued.index()] =
            self.nearest_pursued(pos, agent == Agent::Pursued);
        FeatureVector(values)
    }

    fn nearest_pursuer(&self, pos: Position, exclude: Option<usize>) -> f64 {
        self.pursuer_pos
            .iter()
            .enumerate()
            .filter(|(id, _)| Some(*id) != exclude)
            .map(|(_, g)| pos.manhattan(*g))
            .min()
            .map_or(NO_TARGET_DISTANCE, f64::from)
    }

    fn nearest_pursued(&self, pos: Position, exclude_self: bool) -> f64 {
        if exclude_self {
            return NO_TARGET_DISTANCE;
        }
        f64::from(pos.manhattan(self.pursued_pos))
    }

    /// Searches rings of growing Manhattan radius around `pos`.
    fn nearest_pill(&self, pos: Position) -> f64 {
        let limit = (self.width + self.height) as i32;
        for radius in 0..=limit {
            for i in 0..=radius {
                let dx = radius - i;
                let candidates = [
                    Position::new(pos.x - dx, pos.y - i),
                    Position::new(pos.x - dx, pos.y + i),
                    Position::new(pos.x + dx, pos.y - i),
                    Position::new(pos.x + dx, pos.y + i),
                ];
                if candidates.iter().any(|&c| self.cell(c) == Some(Cell::Pill)) {
                    return f64::from(radius);
                }
            }
        }
        if !self.all_pills_eaten() {
            log::error!(
                "No pill found from ({}, {}) with {} pills left",
                pos.x,
                pos.y,
                self.orig_num_pills - self.num_pills_eaten
            );
        }
        f64::from(limit)
    }

    /// Board edges count as walls.
    fn adjacent_walls(&self, pos: Position) -> f64 {
        [pos.up(), pos.down(), pos.right(), pos.left()]
            .into_iter()
            .filter(|&p| matches!(self.cell(p), None | Some(Cell::Wall)))
            .count() as f64
    }

    fn fruit_distance(&self, pos: Position) -> f64 {
        match self.fruit_pos {
            Some(fruit) => f64::from(pos.manhattan(fruit)),
            None => (self.width + self.height) as f64,
        }
    }

    /// Plays one turn and reports whether the match is over.
    pub fn play_turn(
        &mut self,
        pursued: &dyn Controller,
        pursuers: &dyn Controller,
        trace: &mut WorldTrace,
        rng: &mut dyn RngCore,
    ) -> bool {
        let prev_pursued = self.pursued_pos;
        let prev_pursuers = self.pursuer_pos.clone();

        let pursued_move = pursued.decide_move(self, Agent::Pursued, rng);
        let mut pursuer_moves = Vec::with_capacity(self.pursuer_pos.len());
        for id in 0..self.pursuer_pos.len() {
            pursuer_moves.push(pursuers.decide_move(self, Agent::Pursuer(id), rng));
        }

        self.pursued_pos = pursued_move;
        self.pursuer_pos = pursuer_moves;
        self.time = self.time.saturating_sub(1);
        self.trace_positions(trace);

        let mut game_over = self.check_capture(prev_pursued, &prev_pursuers);
        if !game_over {
            self.check_pill();
            self.check_fruit(trace, rng);
        }

        self.update_score();
        trace.push(TraceLine::TimeScore(self.time, self.score));

        if self.time == 0 || self.all_pills_eaten() {
            game_over = true;
        }
        game_over
    }

    fn check_capture(&mut self, prev_pursued: Position, prev_pursuers: &[Position]) -> bool {
        let pursued = self.pursued_pos;
        let caught = self
            .pursuer_pos
            .iter()
            .zip(prev_pursuers)
            .any(|(&now, &before)| now == pursued || (now == prev_pursued && before == pursued));
        if caught {
            self.pursuer_won = true;
        }
        caught
    }

    fn check_pill(&mut self) {
        if self.cell(self.pursued_pos) == Some(Cell::Pill) {
            self.set_cell(self.pursued_pos, Cell::Open);
            self.num_pills_eaten += 1;
        }
    }

    fn check_fruit(&mut self, trace: &mut WorldTrace, rng: &mut dyn RngCore) {
        if self.fruit_pos == Some(self.pursued_pos) {
            self.fruit_pos = None;
            self.fruit_eaten += 1;
        }
        if rng.gen::<f64>() < self.fruit_spawning_probability && self.fruit_pos.is_none() {
            self.spawn_fruit(trace, rng);
        }
    }

    fn spawn_fruit(&mut self, trace: &mut WorldTrace, rng: &mut dyn RngCore) {
        let open = self.cells.iter().filter(|c| **c == Cell::Open).count();
        if open <= 1 {
            log::debug!("No room to spawn fruit");
            return;
        }
        loop {
            let pos = Position::new(
                rng.gen_range(0..self.width) as i32,
                rng.gen_range(0..self.height) as i32,
            );
            if self.cell(pos) == Some(Cell::Open) && pos != self.pursued_pos {
                self.fruit_pos = Some(pos);
                trace.push(TraceLine::Fruit(pos));
                return;
            }
        }
    }

    fn update_score(&mut self) {
        let pill_term = if self.orig_num_pills == 0 {
            100.0
        } else {
            (self.num_pills_eaten as f64 * 100.0 / self.orig_num_pills as f64).trunc()
        };
        let mut score = pill_term + f64::from(self.fruit_eaten) * self.fruit_score;
        if self.all_pills_eaten() {
            score += self.time_bonus();
        }
        self.score = score.trunc();
    }

    /// `floor(100 * time / orig_time)`.
    pub fn time_bonus(&self) -> f64 {
        (f64::from(self.time) * 100.0 / f64::from(self.orig_time)).trunc()
    }

    fn trace_positions(&self, trace: &mut WorldTrace) {
        trace.push(TraceLine::Pursued(self.pursued_pos));
        for (id, pos) in self.pursuer_pos.iter().enumerate() {
            trace.push(TraceLine::Pursuer(id + 1, *pos));
        }
    }

    /// Header lines describing the starting board.
    pub fn write_world_config(&self, trace: &mut WorldTrace) {
        trace.push(TraceLine::Width(self.width));
        trace.push(TraceLine::Height(self.height));
        self.trace_positions(trace);
        for kind in [Cell::Wall, Cell::Pill] {
            for y in 0..self.height {
                for x in 0..self.width {
                    let pos = Position::new(x as i32, y as i32);
                    if self.cell(pos) == Some(kind) {
                        trace.push(match kind {
                            Cell::Wall => TraceLine::Wall(pos),
                            _ => TraceLine::Pill(pos),
                        });
                    }
                }
            }
        }
        trace.push(TraceLine::TimeScore(self.time, self.score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(num_pursuers: usize) -> GameConfig {
        GameConfig {
            fruit_spawning_probability: 0.0,
            num_pursuers,
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_setup_positions_and_time() {
        let map = GameMap::open(4, 3);
        let state = GameState::with_pills(&map, &config(2), &[]).unwrap();
        assert_eq!(state.pursued_pos(), Position::new(0, 2));
        assert_eq!(state.pursuer_positions(), &[Position::new(3, 0); 2]);
        assert_eq!(state.orig_time(), 12);
        assert_eq!(state.time(), 12);
    }

    #[test]
    fn test_random_pills_skip_walls_and_start() {
        let map = GameMap::from_walls(3, 3, &[Position::new(1, 1)]).unwrap();
        let cfg = GameConfig {
            pill_density: 1.0,
            ..config(1)
        };
        let mut rng = StdRng::seed_from_u64(3);
        let state = GameState::new(&map, &cfg, &mut rng);
        assert_eq!(state.num_pills(), 7);
        assert_eq!(state.cell(Position::new(0, 2)), Some(Cell::Open));
        assert_eq!(state.cell(Position::new(1, 1)), Some(Cell::Wall));
    }

    #[test]
    fn test_valid_positions() {
        let map = GameMap::from_walls(3, 3, &[Position::new(1, 2)]).unwrap();
        let state = GameState::with_pills(&map, &config(1), &[]).unwrap();
        // Pursued at the top-left corner with a wall to its right.
        assert_eq!(
            state.valid_positions(Agent::Pursued),
            vec![Position::new(0, 1), Position::new(0, 2)]
        );
        // Pursuer at the bottom-right corner.
        assert_eq!(
            state.valid_positions(Agent::Pursuer(0)),
            vec![Position::new(2, 1), Position::new(1, 0)]
        );
    }

    #[test]
    fn test_features() {
        let map = GameMap::from_walls(4, 4, &[Position::new(1, 3)]).unwrap();
        let state = GameState::with_pills(&map, &config(2), &[Position::new(2, 2)]).unwrap();

        let pursued = state.features(Agent::Pursued, Position::new(0, 3));
        assert_eq!(pursued.get(Feature::NearestPursuer), 6.0);
        assert_eq!(pursued.get(Feature::NearestPill), 3.0);
        assert_eq!(pursued.get(Feature::AdjacentWalls), 3.0);
        assert_eq!(pursued.get(Feature::Fruit), 8.0);
        assert_eq!(pursued.get(Feature::NearestPursued), NO_TARGET_DISTANCE);

        let pursuer = state.features(Agent::Pursuer(0), Position::new(3, 1));
        assert_eq!(pursuer.get(Feature::NearestPursuer), 1.0);
        assert_eq!(pursuer.get(Feature::NearestPursued), 5.0);
    }

    #[test]
    fn test_lone_pursuer_sees_no_other_pursuer() {
        let map = GameMap::open(3, 3);
        let state = GameState::with_pills(&map, &config(1), &[]).unwrap();
        let f = state.features(Agent::Pursuer(0), Position::new(2, 1));
        assert_eq!(f.get(Feature::NearestPursuer), NO_TARGET_DISTANCE);
    }

    #[test]
    fn test_missing_pills_fall_back_to_board_span() {
        let map = GameMap::open(3, 2);
        let state = GameState::with_pills(&map, &config(1), &[]).unwrap();
        let f = state.features(Agent::Pursued, Position::new(0, 1));
        assert_eq!(f.get(Feature::NearestPill), 5.0);
    }

    #[test]
    fn test_pill_on_wall_rejected() {
        let map = GameMap::from_walls(2, 2, &[Position::new(1, 1)]).unwrap();
        assert!(GameState::with_pills(&map, &config(1), &[Position::new(1, 1)]).is_err());
        assert!(GameState::with_pills(&map, &config(1), &[Position::new(5, 0)]).is_err());
    }

    #[test]
    fn test_world_config_header() {
        let map = GameMap::from_walls(2, 2, &[Position::new(1, 1)]).unwrap();
        let state = GameState::with_pills(&map, &config(1), &[Position::new(0, 0)]).unwrap();
        let mut trace = WorldTrace::new();
        state.write_world_config(&mut trace);
        assert_eq!(trace.to_string(), "2\n2\nm 0 1\n1 1 0\nw 1 1\np 0 0\nt 4 0\n");
    }
}
