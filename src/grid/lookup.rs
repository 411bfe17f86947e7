//! Neighbor lookups for cells just outside a grid.

use super::Grid;
use crate::shard::BorderSet;

/// Supplies the value of a cell one step outside `grid`.
///
/// `row` is in `[-1, height]` and `col` in `[-1, width]`, with at least one
/// of them out of range.
pub trait NeighborLookup {
    fn alive(&self, grid: &Grid, row: isize, col: isize) -> bool;
}

/// Whole-board lookup: indices wrap modulo the grid dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Toroidal;

impl NeighborLookup for Toroidal {
    #[inline]
    fn alive(&self, grid: &Grid, row: isize, col: isize) -> bool {
        let r = row.rem_euclid(grid.height() as isize) as usize;
        let c = col.rem_euclid(grid.width() as isize) as usize;
        grid.get(r, c)
    }
}

/// Shard lookup: everything past the edge comes from the neighbors' borders.
#[derive(Debug, Clone, Copy)]
pub struct Bordered<'a>(pub &'a BorderSet);

impl NeighborLookup for Bordered<'_> {
    fn alive(&self, grid: &Grid, row: isize, col: isize) -> bool {
        let borders = self.0;
        let height = grid.height() as isize;
        let width = grid.width() as isize;

        match (row, col) {
            (-1, -1) => borders.north_west,
            (-1, c) if c == width => borders.north_east,
            (r, -1) if r == height => borders.south_west,
            (r, c) if r == height && c == width => borders.south_east,
            (-1, c) => borders.north[c as usize],
            (r, c) if r == height => borders.south[c as usize],
            (r, -1) => borders.west[r as usize],
            (r, _) => borders.east[r as usize],
        }
    }
}
