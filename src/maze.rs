use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::error::MazeError;
use crate::movement::LevelGeometry;
use crate::types::Position;

/// Default level. `#` wall, `=` pen door, `.` node, `o` energizer, space open floor.
pub const BUILTIN_LAYOUT: [&str; 25] = [
    "###############################",
    "#.............................#",
    "#.####.###.#########.###.####.#",
    "#o...........................o#",
    "#.####.###.####.####.###.####.#",
    "#.............................#",
    "#.####.###.####.####.###.####.#",
    "#.####.###.####.####.###.####.#",
    "#.............................#",
    "#.####.###.####.####.###.####.#",
    "#.####.###.####.####.###.####.#",
    "#.............. ..............#",
    "#.########.####.####.########.#",
    "#.####.###.####.####.###.####.#",
    "#.............................#",
    "#.####.###.####=####.###.####.#",
    "#.####.###.#       #.###.####.#",
    "#.####.#####       #####.####.#",
    "#.####.###.#       #.###.####.#",
    "#.####.###.#########.###.####.#",
    "#o............. .............o#",
    "#.####.###.####.####.###.####.#",
    "#.####.###.#########.###.####.#",
    "#.............................#",
    "###############################",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collectible {
    Node,
    Energizer,
}

#[derive(Clone, Debug)]
pub struct Maze {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    collectibles: BTreeMap<(i32, i32), Collectible>,
}

impl Maze {
    pub fn builtin() -> Result<Self, MazeError> {
        Self::parse(&BUILTIN_LAYOUT)
    }

    pub fn parse(rows: &[&str]) -> Result<Self, MazeError> {
        let Some(first) = rows.first() else {
            return Err(MazeError::Empty);
        };
        let expected = first.chars().count();
        let mut tiles = Vec::with_capacity(rows.len());
        let mut collectibles = BTreeMap::new();

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(MazeError::Ragged { row: y, expected, found });
            }
            let mut line = String::with_capacity(found);
            for (x, tile) in row.chars().enumerate() {
                match tile {
                    '#' | '=' | ' ' => {}
                    '.' => {
                        collectibles.insert((x as i32, y as i32), Collectible::Node);
                    }
                    'o' => {
                        collectibles.insert((x as i32, y as i32), Collectible::Energizer);
                    }
                    _ => return Err(MazeError::UnknownTile { x, y, tile }),
                }
                // Collectible markers are tracked separately; the static tile is plain floor.
                line.push(if tile == '.' || tile == 'o' { ' ' } else { tile });
            }
            tiles.push(line);
        }

        Ok(Self {
            width: expected as i32,
            height: rows.len() as i32,
            tiles,
            collectibles,
        })
    }

    pub fn is_floor(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        self.tiles
            .get(y as usize)
            .and_then(|row| row.as_bytes().get(x as usize))
            .map(|tile| *tile == b' ')
            .unwrap_or(false)
    }

    pub fn collectible_at(&self, x: i32, y: i32) -> Option<Collectible> {
        self.collectibles.get(&(x, y)).copied()
    }

    pub fn take_collectible(&mut self, position: Position) -> Option<((i32, i32), Collectible)> {
        let cell = position.cell();
        self.collectibles.remove(&cell).map(|kind| (cell, kind))
    }

    pub fn remaining_nodes(&self) -> usize {
        self.collectibles.len()
    }

    pub fn reachable_cells(&self, from: Position) -> HashSet<(i32, i32)> {
        let start = from.cell();
        let mut seen = HashSet::new();
        if !self.is_floor(start.0, start.1) {
            return seen;
        }
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some((x, y)) = queue.pop_front() {
            for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                if self.is_floor(nx, ny) && seen.insert((nx, ny)) {
                    queue.push_back((nx, ny));
                }
            }
        }
        seen
    }
}

impl LevelGeometry for Maze {
    fn is_passable(&self, position: Position) -> bool {
        let (x, y) = position.cell();
        self.is_floor(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AGENT_SPAWN;

    #[test]
    fn builtin_layout_parses_with_nodes() {
        let maze = Maze::builtin().expect("builtin parses");
        assert_eq!(maze.width, 31);
        assert_eq!(maze.height, 25);
        assert!(maze.remaining_nodes() > 200);
        assert_eq!(maze.collectible_at(1, 3), Some(Collectible::Energizer));
    }

    #[test]
    fn spawn_is_open_floor_without_node() {
        let maze = Maze::builtin().expect("builtin parses");
        let (x, y) = AGENT_SPAWN.cell();
        assert!(maze.is_floor(x, y));
        assert_eq!(maze.collectible_at(x, y), None);
    }

    #[test]
    fn every_collectible_is_reachable_from_spawn() {
        let maze = Maze::builtin().expect("builtin parses");
        let reachable = maze.reachable_cells(AGENT_SPAWN);
        for y in 0..maze.height {
            for x in 0..maze.width {
                if maze.collectible_at(x, y).is_some() {
                    assert!(reachable.contains(&(x, y)), "({x}, {y}) unreachable");
                }
            }
        }
    }

    #[test]
    fn pen_door_blocks_movement() {
        let maze = Maze::builtin().expect("builtin parses");
        assert!(!maze.is_floor(15, 15));
        assert!(!maze.is_passable(Position::new(15.0, 15.0)));
    }

    #[test]
    fn take_collectible_removes_once() {
        let mut maze = Maze::parse(&["#.o#"]).expect("valid maze");
        assert_eq!(
            maze.take_collectible(Position::new(1.2, 0.0)),
            Some(((1, 0), Collectible::Node))
        );
        assert_eq!(maze.take_collectible(Position::new(1.0, 0.0)), None);
        assert_eq!(maze.remaining_nodes(), 1);
    }

    #[test]
    fn parse_rejects_bad_layouts() {
        assert_eq!(Maze::parse(&[]).expect_err("empty"), MazeError::Empty);
        assert_eq!(
            Maze::parse(&["###", "##"]).expect_err("ragged"),
            MazeError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        );
        assert!(matches!(
            Maze::parse(&["#x#"]),
            Err(MazeError::UnknownTile { x: 1, y: 0, tile: 'x' })
        ));
    }
}
