use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the chase an agent or population plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Pursued,
    Pursuer,
}

impl Role {
    /// Terminal alphabet available to trees of this role.
    pub fn terminals(self) -> &'static [TerminalKind] {
        match self {
            Role::Pursued => &[
                TerminalKind::Feature(Feature::NearestPursuer),
                TerminalKind::Feature(Feature::NearestPill),
                TerminalKind::Feature(Feature::AdjacentWalls),
                TerminalKind::Feature(Feature::Fruit),
                TerminalKind::Constant,
            ],
            Role::Pursuer => &[
                TerminalKind::Feature(Feature::NearestPursuer),
                TerminalKind::Feature(Feature::NearestPill),
                TerminalKind::Feature(Feature::AdjacentWalls),
                TerminalKind::Feature(Feature::Fruit),
                TerminalKind::Feature(Feature::NearestPursued),
                TerminalKind::Constant,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Pursued => "pursued",
            Role::Pursuer => "pursuer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid coordinate. `y` grows upward: row `height - 1` is the top of a map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn up(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    pub fn down(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    pub fn right(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    pub fn left(self) -> Self {
        Self::new(self.x - 1, self.y)
    }
}

/// Sensor inputs a tree can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    NearestPursuer, // G
    NearestPill,    // P
    AdjacentWalls,  // W
    Fruit,          // F
    NearestPursued, // M
}

impl Feature {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            Feature::NearestPursuer => 0,
            Feature::NearestPill => 1,
            Feature::AdjacentWalls => 2,
            Feature::Fruit => 3,
            Feature::NearestPursued => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Feature::NearestPursuer => "G",
            Feature::NearestPill => "P",
            Feature::AdjacentWalls => "W",
            Feature::Fruit => "F",
            Feature::NearestPursued => "M",
        }
    }
}

/// Terminal choices offered to the tree builder. A constant draws its value at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Feature(Feature),
    Constant,
}

/// Feature values for one candidate destination cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector(pub [f64; Feature::COUNT]);

impl FeatureVector {
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }
}
