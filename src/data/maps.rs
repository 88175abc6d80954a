use crate::error::{ChaseError, Result};
use crate::types::Position;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Immutable map layout: dimensions and wall cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    width: usize,
    height: usize,
    /// Row-major, indexed `y * width + x`.
    walls: Vec<bool>,
}

impl GameMap {
    /// Map without walls.
    pub fn open(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            walls: vec![false; width * height],
        }
    }

    pub fn from_walls(width: usize, height: usize, walls: &[Position]) -> Result<Self> {
        let mut map = Self::open(width, height);
        for &wall in walls {
            let index = map.index(wall).ok_or_else(|| {
                ChaseError::Map(format!("Wall ({}, {}) outside {}x{} map", wall.x, wall.y, width, height))
            })?;
            map.walls[index] = true;
        }
        Ok(map)
    }

    /// Parse the text format: a `W H` header, then `H` rows of `#` (wall) and
    /// `~` (open). The first row is the top of the map (`y = H - 1`).
    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        let header = lines
            .next()
            .ok_or_else(|| ChaseError::Map("Empty map file".to_string()))?;

        let dims: Vec<usize> = header
            .split_whitespace()
            .map(|d| {
                d.parse::<usize>()
                    .map_err(|e| ChaseError::Map(format!("Bad dimension '{}': {}", d, e)))
            })
            .collect::<Result<_>>()?;
        let (width, height) = match dims.as_slice() {
            [w, h] if *w > 0 && *h > 0 => (*w, *h),
            _ => {
                return Err(ChaseError::Map(format!(
                    "Expected 'width height' header, found '{}'",
                    header
                )))
            }
        };

        let mut map = Self::open(width, height);
        for row_idx in 0..height {
            let row = lines.next().ok_or_else(|| {
                ChaseError::Map(format!("Expected {} rows, found {}", height, row_idx))
            })?;
            let cells: Vec<bool> = row
                .chars()
                .filter_map(|c| match c {
                    '#' => Some(true),
                    '~' => Some(false),
                    _ => None,
                })
                .collect();
            if cells.len() != width {
                return Err(ChaseError::Map(format!(
                    "Row {} has {} cells, expected {}",
                    row_idx,
                    cells.len(),
                    width
                )));
            }
            let y = height - row_idx - 1;
            map.walls[y * width..(y + 1) * width].copy_from_slice(&cells);
        }

        Ok(map)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
            .map_err(|e| ChaseError::Map(format!("{}: {}", path.display(), e)))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.index(pos).map_or(false, |i| self.walls[i])
    }

    pub fn num_walls(&self) -> usize {
        self.walls.iter().filter(|&&w| w).count()
    }
}

/// Read-only pool of maps; every match draws one uniformly.
#[derive(Debug, Clone)]
pub struct MapPool {
    maps: Vec<GameMap>,
}

impl MapPool {
    pub fn new(maps: Vec<GameMap>) -> Result<Self> {
        if maps.is_empty() {
            return Err(ChaseError::Map("Map pool is empty".to_string()));
        }
        Ok(Self { maps })
    }

    /// Load every `*.txt` file of `dir`, in file name order.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "txt"))
            .collect();
        paths.sort();

        let maps = paths
            .iter()
            .map(GameMap::load)
            .collect::<Result<Vec<_>>>()?;
        log::info!("Loaded {} maps from {}", maps.len(), dir.display());
        Self::new(maps)
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &GameMap {
        // non-empty by construction
        self.maps.choose(rng).unwrap_or(&self.maps[0])
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orients_rows_bottom_up() {
        let map = GameMap::parse("3 2\n#~~\n~~#\n").unwrap();
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        // first row of the file is the top (y = 1)
        assert!(map.is_wall(Position::new(0, 1)));
        assert!(map.is_wall(Position::new(2, 0)));
        assert!(!map.is_wall(Position::new(0, 0)));
        assert_eq!(map.num_walls(), 2);
    }

    #[test]
    fn test_parse_rejects_short_rows() {
        assert!(GameMap::parse("3 2\n#~\n~~#\n").is_err());
        assert!(GameMap::parse("3 2\n###\n").is_err());
        assert!(GameMap::parse("three 2\n").is_err());
    }

    #[test]
    fn test_out_of_bounds_is_not_a_wall() {
        let map = GameMap::open(2, 2);
        assert!(!map.in_bounds(Position::new(-1, 0)));
        assert!(!map.in_bounds(Position::new(0, 2)));
        assert!(!map.is_wall(Position::new(5, 5)));
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(MapPool::new(Vec::new()).is_err());
    }

    #[test]
    fn test_load_dir_reads_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("map0.txt"), "2 2\n~~\n~#\n").unwrap();
        std::fs::write(dir.path().join("map1.txt"), "3 1\n~~~\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let pool = MapPool::load_dir(dir.path()).unwrap();
        assert_eq!(pool.len(), 2);
    }
}
