//! Border cells exchanged between neighboring shards.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ShardError;
use crate::grid::Grid;

/// One of the eight Moore-neighborhood directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Shard-grid offset as `(dy, dx)`.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
            Direction::NorthEast => (-1, 1),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (1, -1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::NorthEast => "north-east",
            Direction::NorthWest => "north-west",
            Direction::SouthEast => "south-east",
            Direction::SouthWest => "south-west",
        };
        f.write_str(name)
    }
}

/// Edge rows/columns and corner cells for one shard and one generation.
///
/// The same type carries both sides of the exchange: a shard's *outbound*
/// set holds its own edge cells, its *inbound* set holds the cells just past
/// its edges, taken from the neighbors' outbound sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderSet {
    /// Length = shard width.
    pub north: Vec<bool>,
    /// Length = shard width.
    pub south: Vec<bool>,
    /// Length = shard height.
    pub east: Vec<bool>,
    /// Length = shard height.
    pub west: Vec<bool>,
    pub north_east: bool,
    pub north_west: bool,
    pub south_east: bool,
    pub south_west: bool,
}

impl BorderSet {
    /// All-dead borders for a `width x height` shard.
    pub fn dead(width: usize, height: usize) -> Self {
        Self {
            north: vec![false; width],
            south: vec![false; width],
            east: vec![false; height],
            west: vec![false; height],
            north_east: false,
            north_west: false,
            south_east: false,
            south_west: false,
        }
    }

    /// The outbound set of `grid`: its own edge rows, columns and corners.
    pub fn edges_of(grid: &Grid) -> Self {
        let last_row = grid.height() - 1;
        let last_col = grid.width() - 1;
        Self {
            north: grid.row(0).to_vec(),
            south: grid.row(last_row).to_vec(),
            east: grid.column(last_col),
            west: grid.column(0),
            north_east: grid.get(0, last_col),
            north_west: grid.get(0, 0),
            south_east: grid.get(last_row, last_col),
            south_west: grid.get(last_row, 0),
        }
    }

    /// Reject arrays whose length does not match the shard dimensions.
    pub fn validate(&self, width: usize, height: usize) -> Result<(), ShardError> {
        let edges = [
            (Direction::North, self.north.len(), width),
            (Direction::South, self.south.len(), width),
            (Direction::East, self.east.len(), height),
            (Direction::West, self.west.len(), height),
        ];
        for (direction, actual, expected) in edges {
            if actual != expected {
                return Err(ShardError::InvalidBorderShape {
                    direction,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Copy the part of `source` that faces a neighbor in `direction`.
    ///
    /// `source` is the neighbor's outbound set; the neighbor lies in
    /// `direction` from the receiving shard, so the values come from the
    /// neighbor's opposite side.
    pub fn receive(&mut self, direction: Direction, source: &BorderSet) {
        match direction {
            Direction::North => self.north.clone_from(&source.south),
            Direction::South => self.south.clone_from(&source.north),
            Direction::East => self.east.clone_from(&source.west),
            Direction::West => self.west.clone_from(&source.east),
            Direction::NorthEast => self.north_east = source.south_west,
            Direction::NorthWest => self.north_west = source.south_east,
            Direction::SouthEast => self.south_east = source.north_west,
            Direction::SouthWest => self.south_west = source.north_east,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dy, dx) = direction.offset();
            assert_eq!(direction.opposite().offset(), (-dy, -dx));
        }
    }

    #[test]
    fn test_edges_of() {
        // . X .
        // . . X
        // X X X
        // X . .
        let grid = Grid::with_live_cells(3, 4, [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2), (3, 0)])
            .unwrap();
        let edges = BorderSet::edges_of(&grid);

        assert_eq!(edges.north, vec![false, true, false]);
        assert_eq!(edges.south, vec![true, false, false]);
        assert_eq!(edges.east, vec![false, true, true, false]);
        assert_eq!(edges.west, vec![false, false, true, true]);
        assert!(!edges.north_east);
        assert!(!edges.north_west);
        assert!(!edges.south_east);
        assert!(edges.south_west);
    }

    #[test]
    fn test_validate_reports_first_bad_edge() {
        let mut borders = BorderSet::dead(4, 3);
        assert!(borders.validate(4, 3).is_ok());

        borders.east.push(false);
        assert_eq!(
            borders.validate(4, 3),
            Err(ShardError::InvalidBorderShape {
                direction: Direction::East,
                expected: 3,
                actual: 4,
            })
        );
    }

    #[test]
    fn test_receive_takes_opposite_side() {
        let mut source = BorderSet::dead(3, 3);
        source.south = vec![true, false, true];
        source.south_west = true;

        let mut inbound = BorderSet::dead(3, 3);
        inbound.receive(Direction::North, &source);
        inbound.receive(Direction::NorthEast, &source);

        assert_eq!(inbound.north, vec![true, false, true]);
        assert!(inbound.north_east);
        assert!(!inbound.north_west);
    }
}
