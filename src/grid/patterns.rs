//! Named seed patterns.
//!
//! Cells are relative to the pattern's top-left corner and are placed with
//! toroidal wrap, so any pattern fits any board.

use super::{Grid, GridError};

pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "r-pentomino",
        cells: &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)],
    },
];

impl Pattern {
    /// Look up a pattern by case-insensitive name.
    pub fn find(name: &str) -> Result<&'static Pattern, GridError> {
        PATTERNS
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GridError::UnknownPattern(name.to_string()))
    }

    /// Set the pattern's cells alive with its corner at `(row, col)`.
    /// The corner may lie anywhere; it is reduced onto the board first.
    pub fn place(&self, grid: &mut Grid, row: usize, col: usize) {
        let (height, width) = (grid.height(), grid.width());
        let (row, col) = (row % height, col % width);
        for &(dr, dc) in self.cells {
            grid.set((row + dr % height) % height, (col + dc % width) % width, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Pattern::find("Glider").unwrap().name, "glider");
        assert!(matches!(
            Pattern::find("spaceship"),
            Err(GridError::UnknownPattern(_))
        ));
    }

    #[test]
    fn test_place_wraps_at_edges() {
        let mut grid = Grid::new(4, 4).unwrap();
        Pattern::find("blinker").unwrap().place(&mut grid, 3, 2);
        let live: Vec<_> = grid.live_cells().collect();
        assert_eq!(live, vec![(3, 0), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_place_with_far_corner() {
        let mut grid = Grid::new(5, 5).unwrap();
        Pattern::find("glider").unwrap().place(&mut grid, usize::MAX, usize::MAX);

        // usize::MAX is 0 modulo 5
        let mut expected = Grid::new(5, 5).unwrap();
        Pattern::find("glider").unwrap().place(&mut expected, 0, 0);
        assert_eq!(grid, expected);
    }

    #[test]
    fn test_glider_translates_after_four_generations() {
        let mut grid = Grid::new(8, 8).unwrap();
        Pattern::find("glider").unwrap().place(&mut grid, 1, 1);

        let mut moved = grid.clone();
        for _ in 0..4 {
            moved = moved.step_toroidal();
        }

        let expected: Vec<_> = grid.live_cells().map(|(r, c)| (r + 1, c + 1)).collect();
        assert_eq!(moved.live_cells().collect::<Vec<_>>(), expected);
    }
}
