use crate::types::Position;
use std::fmt;

/// One line of a world file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceLine {
    Width(usize),
    Height(usize),
    Pursued(Position),
    /// 1-based pursuer number.
    Pursuer(usize, Position),
    Wall(Position),
    Pill(Position),
    Fruit(Position),
    TimeScore(u32, f64),
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceLine::Width(w) => write!(f, "{}", w),
            TraceLine::Height(h) => write!(f, "{}", h),
            TraceLine::Pursued(p) => write!(f, "m {} {}", p.x, p.y),
            TraceLine::Pursuer(k, p) => write!(f, "{} {} {}", k, p.x, p.y),
            TraceLine::Wall(p) => write!(f, "w {} {}", p.x, p.y),
            TraceLine::Pill(p) => write!(f, "p {} {}", p.x, p.y),
            TraceLine::Fruit(p) => write!(f, "f {} {}", p.x, p.y),
            TraceLine::TimeScore(time, score) => write!(f, "t {} {}", time, score),
        }
    }
}

/// Replayable record of a single match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldTrace {
    lines: Vec<TraceLine>,
}

impl WorldTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: TraceLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for WorldTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
