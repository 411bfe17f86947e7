//! Cell grid and the Game of Life transition.
//!
//! A [`Grid`] is a fixed-size, row-major boolean matrix. Its shape never
//! changes after construction; only cell values do.
//!
//! # Module Structure
//!
//! - `lookup` - neighbor lookups for cells on the grid boundary
//! - `seed` - dead, random, pattern and explicit-cell seeding
//! - `patterns` - named seed patterns
//! - `encode` - per-row live-cell encodings for the board API
//!
//! The transition reads interior cells straight from the grid and asks the
//! [`NeighborLookup`] for anything that falls outside it. That is the only
//! difference between a whole toroidal board and a shard fed by its
//! neighbors.

mod encode;
mod lookup;
mod patterns;
mod seed;

pub use encode::{Encoding, decode, encode, to_json};
pub use lookup::{Bordered, NeighborLookup, Toroidal};
pub use patterns::{PATTERNS, Pattern};
pub use seed::Seed;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Moore neighborhood offsets as `(dr, dc)`.
const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Largest board a single grid may hold.
pub const MAX_CELLS: usize = 1 << 26;

/// Grid construction and seeding errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: usize, height: usize },

    #[error("a {width}x{height} grid exceeds the limit of {max} cells", max = MAX_CELLS)]
    TooLarge { width: usize, height: usize },

    #[error("a {width}x{height} grid needs {expected} cells, got {actual}")]
    CellCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("density must be within [0, 1], got {0}")]
    InvalidDensity(f64),

    #[error("unknown pattern `{0}`")]
    UnknownPattern(String),

    #[error("cell ({row}, {col}) is outside a {width}x{height} grid")]
    CellOutOfRange {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    #[error("expected {expected} encoded rows, got {actual}")]
    RowCount { expected: usize, actual: usize },

    #[error("row {row}: live columns are not strictly increasing")]
    NotIncreasing { row: usize },
}

/// Fixed-size boolean cell matrix.
///
/// Deserialized grids are checked like constructed ones, so a grid read off
/// the wire always has positive dimensions and exactly `width * height`
/// cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

/// Unchecked wire form of a [`Grid`].
#[derive(Deserialize)]
struct RawGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let RawGrid {
            width,
            height,
            cells,
        } = raw;
        let expected = Grid::cell_count(width, height)?;
        if cells.len() != expected {
            return Err(GridError::CellCount {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let count = Self::cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![false; count],
        })
    }

    /// Number of cells in a `width x height` grid, if one may be built.
    fn cell_count(width: usize, height: usize) -> Result<usize, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        width
            .checked_mul(height)
            .filter(|&count| count <= MAX_CELLS)
            .ok_or(GridError::TooLarge { width, height })
    }

    /// Create a grid with the given cells alive.
    pub fn with_live_cells(
        width: usize,
        height: usize,
        live: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GridError> {
        let mut grid = Self::new(width, height)?;
        for (row, col) in live {
            if row >= height || col >= width {
                return Err(GridError::CellOutOfRange {
                    row,
                    col,
                    width,
                    height,
                });
            }
            grid.set(row, col, true);
        }
        Ok(grid)
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Cell value. Panics on out-of-range indices.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, alive: bool) {
        let idx = self.idx(row, col);
        self.cells[idx] = alive;
    }

    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn column(&self, col: usize) -> Vec<bool> {
        (0..self.height).map(|row| self.get(row, col)).collect()
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Iterate live cells as `(row, col)` in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| (i / self.width, i % self.width))
    }

    /// Compute the next generation.
    ///
    /// Interior cells are counted from the grid directly; any neighbor that
    /// falls outside `[0, height) x [0, width)` goes through `lookup`.
    pub fn step<L: NeighborLookup + ?Sized>(&self, lookup: &L) -> Grid {
        let mut next = Grid {
            width: self.width,
            height: self.height,
            cells: vec![false; self.cells.len()],
        };

        for row in 0..self.height {
            let boundary_row = row == 0 || row + 1 == self.height;
            for col in 0..self.width {
                let count = if boundary_row || col == 0 || col + 1 == self.width {
                    self.count_boundary(row, col, lookup)
                } else {
                    self.count_interior(row, col)
                };
                let alive = self.get(row, col);
                next.cells[row * self.width + col] = matches!((alive, count), (_, 3) | (true, 2));
            }
        }

        next
    }

    /// Shorthand for a whole-board step with toroidal wrap.
    pub fn step_toroidal(&self) -> Grid {
        self.step(&Toroidal)
    }

    fn count_interior(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for (dr, dc) in NEIGHBORS {
            let r = row.wrapping_add_signed(dr);
            let c = col.wrapping_add_signed(dc);
            count += u8::from(self.get(r, c));
        }
        count
    }

    fn count_boundary<L: NeighborLookup + ?Sized>(&self, row: usize, col: usize, lookup: &L) -> u8 {
        let mut count = 0;
        for (dr, dc) in NEIGHBORS {
            let r = row as isize + dr;
            let c = col as isize + dc;
            let inside =
                r >= 0 && c >= 0 && (r as usize) < self.height && (c as usize) < self.width;
            let alive = if inside {
                self.get(r as usize, c as usize)
            } else {
                lookup.alive(self, r, c)
            };
            count += u8::from(alive);
        }
        count
    }

    /// Copy the `width x height` window whose top-left corner is `(row, col)`.
    pub fn sub_grid(&self, row: usize, col: usize, width: usize, height: usize) -> Grid {
        let mut cells = Vec::with_capacity(width * height);
        for r in row..row + height {
            let start = self.idx(r, col);
            cells.extend_from_slice(&self.cells[start..start + width]);
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Overwrite the window at `(row, col)` with `part`.
    pub fn paste(&mut self, row: usize, col: usize, part: &Grid) {
        for r in 0..part.height {
            let dst = self.idx(row + r, col);
            self.cells[dst..dst + part.width].copy_from_slice(part.row(r));
        }
    }

    /// Content fingerprint for cycle detection.
    pub fn fingerprint(&self) -> u64 {
        let packed: Vec<u8> = self
            .cells
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (bit, &alive)| byte | (u8::from(alive) << bit))
            })
            .collect();
        crate::utils::hash::compute(&packed)
    }
}
