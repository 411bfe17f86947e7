//! Board seeding: dead, Bernoulli-random, named pattern, or explicit cells.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Grid, GridError, Pattern};

/// How a freshly bootstrapped board is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    /// Every cell dead.
    Empty,
    /// Each cell independently alive with probability `density`.
    Random { density: f64, seed: u64 },
    /// A named pattern with its corner at `(row, col)`.
    Pattern {
        name: String,
        row: usize,
        col: usize,
    },
    /// An explicit live-cell set.
    Cells(Vec<(usize, usize)>),
}

impl Seed {
    /// Build a `width x height` grid from this seed.
    pub fn build(&self, width: usize, height: usize) -> Result<Grid, GridError> {
        match self {
            Self::Empty => Grid::new(width, height),
            Self::Random { density, seed } => {
                let mut grid = Grid::new(width, height)?;
                grid.randomize(*density, *seed)?;
                Ok(grid)
            }
            Self::Pattern { name, row, col } => {
                let pattern = Pattern::find(name)?;
                let mut grid = Grid::new(width, height)?;
                pattern.place(&mut grid, *row, *col);
                Ok(grid)
            }
            Self::Cells(cells) => Grid::with_live_cells(width, height, cells.iter().copied()),
        }
    }
}

impl Grid {
    /// Overwrite every cell with an independent Bernoulli(`density`) draw.
    pub fn randomize(&mut self, density: f64, seed: u64) -> Result<(), GridError> {
        if !(0.0..=1.0).contains(&density) {
            return Err(GridError::InvalidDensity(density));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for row in 0..self.height() {
            for col in 0..self.width() {
                self.set(row, col, rng.gen_bool(density));
            }
        }
        Ok(())
    }
}
