//! Shard-grid topology.
//!
//! A [`ShardLayout`] is validated once: the shard grid is a dense
//! `columns x rows` rectangle that evenly divides the board, and every shard
//! is at least [`MIN_SHARD_DIMENSION`] cells on each side so that its
//! interior and boundary cells are distinct.

use thiserror::Error;

use super::{BorderSet, Direction, ShardCoord};
use crate::grid::Grid;

/// Smallest shard width/height with a true interior.
pub const MIN_SHARD_DIMENSION: usize = 3;

/// Invalid shard-grid configuration. Always fatal for the board it describes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("shard grid must have at least one column and one row, got {columns}x{rows}")]
    Empty { columns: usize, rows: usize },

    #[error("shard count {0} is not a perfect square")]
    NotSquare(usize),

    #[error("{columns}x{rows} shard grid needs {expected} shards, got {actual}")]
    CountMismatch {
        columns: usize,
        rows: usize,
        expected: usize,
        actual: usize,
    },

    #[error("board {axis} {size} is not divisible by {parts} shards")]
    NotDivisible {
        axis: &'static str,
        size: usize,
        parts: usize,
    },

    #[error("shard {axis} {size} is below the minimum of {min}", min = MIN_SHARD_DIMENSION)]
    TooSmall { axis: &'static str, size: usize },
}

/// Dense `columns x rows` grid of equally sized shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    board_width: usize,
    board_height: usize,
    columns: usize,
    rows: usize,
    shard_width: usize,
    shard_height: usize,
}

impl ShardLayout {
    /// Partition a `board_width x board_height` board into `columns x rows` shards.
    pub fn new(
        board_width: usize,
        board_height: usize,
        columns: usize,
        rows: usize,
    ) -> Result<Self, LayoutError> {
        if columns == 0 || rows == 0 {
            return Err(LayoutError::Empty { columns, rows });
        }
        if board_width % columns != 0 {
            return Err(LayoutError::NotDivisible {
                axis: "width",
                size: board_width,
                parts: columns,
            });
        }
        if board_height % rows != 0 {
            return Err(LayoutError::NotDivisible {
                axis: "height",
                size: board_height,
                parts: rows,
            });
        }

        let shard_width = board_width / columns;
        let shard_height = board_height / rows;
        if shard_width < MIN_SHARD_DIMENSION {
            return Err(LayoutError::TooSmall {
                axis: "width",
                size: shard_width,
            });
        }
        if shard_height < MIN_SHARD_DIMENSION {
            return Err(LayoutError::TooSmall {
                axis: "height",
                size: shard_height,
            });
        }

        Ok(Self {
            board_width,
            board_height,
            columns,
            rows,
            shard_width,
            shard_height,
        })
    }

    /// Square layout from a bare shard count.
    pub fn square(board_width: usize, board_height: usize, count: usize) -> Result<Self, LayoutError> {
        let side = (count as f64).sqrt().round() as usize;
        if side * side != count {
            return Err(LayoutError::NotSquare(count));
        }
        Self::new(board_width, board_height, side, side)
    }

    /// Check that exactly one endpoint exists per shard.
    pub fn expect_count(&self, actual: usize) -> Result<(), LayoutError> {
        if actual != self.shard_count() {
            return Err(LayoutError::CountMismatch {
                columns: self.columns,
                rows: self.rows,
                expected: self.shard_count(),
                actual,
            });
        }
        Ok(())
    }

    pub const fn shard_count(&self) -> usize {
        self.columns * self.rows
    }

    pub const fn columns(&self) -> usize {
        self.columns
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn shard_width(&self) -> usize {
        self.shard_width
    }

    pub const fn shard_height(&self) -> usize {
        self.shard_height
    }

    pub const fn board_width(&self) -> usize {
        self.board_width
    }

    pub const fn board_height(&self) -> usize {
        self.board_height
    }

    /// All shard coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = ShardCoord> + use<> {
        let columns = self.columns;
        (0..self.shard_count()).map(move |i| ShardCoord::new(i / columns, i % columns))
    }

    /// Row-major index of `coord`.
    #[inline]
    pub const fn index(&self, coord: ShardCoord) -> usize {
        coord.row * self.columns + coord.col
    }

    /// Neighbor of `coord` in `direction`, wrapping at the shard-grid edge.
    pub fn neighbor(&self, coord: ShardCoord, direction: Direction) -> ShardCoord {
        let (dy, dx) = direction.offset();
        let rows = self.rows as isize;
        let columns = self.columns as isize;
        ShardCoord::new(
            ((coord.row as isize + dy + rows) % rows) as usize,
            ((coord.col as isize + dx + columns) % columns) as usize,
        )
    }

    /// Board position of the shard's top-left cell.
    pub const fn origin(&self, coord: ShardCoord) -> (usize, usize) {
        (coord.row * self.shard_height, coord.col * self.shard_width)
    }

    /// Cut a board into per-shard grids, row-major.
    pub fn split(&self, board: &Grid) -> Vec<Grid> {
        self.coords()
            .map(|coord| {
                let (row, col) = self.origin(coord);
                board.sub_grid(row, col, self.shard_width, self.shard_height)
            })
            .collect()
    }

    /// Reassemble a board from per-shard grids.
    pub fn assemble<'a>(&self, parts: impl IntoIterator<Item = (ShardCoord, &'a Grid)>) -> Grid {
        let mut board = match Grid::new(self.board_width, self.board_height) {
            Ok(board) => board,
            Err(_) => unreachable!("layout dimensions are validated to be positive"),
        };
        for (coord, part) in parts {
            let (row, col) = self.origin(coord);
            board.paste(row, col, part);
        }
        board
    }

    /// Build every shard's inbound borders from every shard's outbound borders.
    ///
    /// `outbound` is indexed row-major. Each neighbor slot is written from
    /// exactly one source, so the order results arrived in is irrelevant.
    pub fn route(&self, outbound: &[BorderSet]) -> Vec<BorderSet> {
        self.coords()
            .map(|coord| {
                let mut inbound = BorderSet::dead(self.shard_width, self.shard_height);
                for direction in Direction::ALL {
                    let source = self.neighbor(coord, direction);
                    inbound.receive(direction, &outbound[self.index(source)]);
                }
                inbound
            })
            .collect()
    }

    /// Inbound borders for generation 0 of a board bootstrapped in one piece.
    pub fn seed_borders(&self, board: &Grid) -> Vec<BorderSet> {
        let outbound: Vec<_> = self.split(board).iter().map(BorderSet::edges_of).collect();
        self.route(&outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let layout = ShardLayout::new(12, 9, 4, 3).unwrap();
        assert_eq!(layout.shard_count(), 12);
        assert_eq!(layout.shard_width(), 3);
        assert_eq!(layout.shard_height(), 3);
    }

    #[test]
    fn test_new_rejects_non_divisible() {
        assert_eq!(
            ShardLayout::new(10, 9, 3, 3),
            Err(LayoutError::NotDivisible {
                axis: "width",
                size: 10,
                parts: 3
            })
        );
        assert!(matches!(
            ShardLayout::new(9, 10, 3, 3),
            Err(LayoutError::NotDivisible { axis: "height", .. })
        ));
    }

    #[test]
    fn test_new_rejects_small_shards() {
        assert_eq!(
            ShardLayout::new(8, 12, 4, 2),
            Err(LayoutError::TooSmall {
                axis: "width",
                size: 2
            })
        );
        assert!(matches!(
            ShardLayout::new(9, 2, 3, 1),
            Err(LayoutError::TooSmall { axis: "height", size: 2 })
        ));
    }

    #[test]
    fn test_new_rejects_empty_grid() {
        assert!(matches!(
            ShardLayout::new(9, 9, 0, 3),
            Err(LayoutError::Empty { .. })
        ));
    }

    #[test]
    fn test_square_requires_perfect_square() {
        assert_eq!(ShardLayout::square(12, 12, 4).unwrap().columns(), 2);
        assert_eq!(ShardLayout::square(12, 12, 3), Err(LayoutError::NotSquare(3)));
    }

    #[test]
    fn test_expect_count() {
        let layout = ShardLayout::new(6, 6, 2, 2).unwrap();
        assert!(layout.expect_count(4).is_ok());
        assert!(matches!(
            layout.expect_count(3),
            Err(LayoutError::CountMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_neighbor_wraps() {
        let layout = ShardLayout::new(9, 6, 3, 2).unwrap();
        let corner = ShardCoord::new(0, 0);
        assert_eq!(layout.neighbor(corner, Direction::North), ShardCoord::new(1, 0));
        assert_eq!(layout.neighbor(corner, Direction::West), ShardCoord::new(0, 2));
        assert_eq!(layout.neighbor(corner, Direction::NorthWest), ShardCoord::new(1, 2));
        assert_eq!(
            layout.neighbor(ShardCoord::new(1, 2), Direction::SouthEast),
            ShardCoord::new(0, 0)
        );
    }

    #[test]
    fn test_single_shard_is_its_own_neighbor() {
        let layout = ShardLayout::new(5, 5, 1, 1).unwrap();
        let only = ShardCoord::new(0, 0);
        for direction in Direction::ALL {
            assert_eq!(layout.neighbor(only, direction), only);
        }
    }

    #[test]
    fn test_split_then_assemble() {
        let board = Grid::with_live_cells(6, 6, [(0, 0), (2, 4), (5, 5), (3, 1)]).unwrap();
        let layout = ShardLayout::new(6, 6, 2, 2).unwrap();
        let parts = layout.split(&board);

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].live_cells().collect::<Vec<_>>(), vec![(2, 1)]);

        let rebuilt = layout.assemble(layout.coords().zip(parts.iter()));
        assert_eq!(rebuilt, board);
    }

    #[test]
    fn test_seed_borders_match_toroidal_neighbors() {
        // Every inbound border cell must equal the board cell one step past
        // the shard edge, with board-level wrap.
        let board = Grid::with_live_cells(9, 6, [(0, 0), (5, 8), (2, 3), (3, 5), (0, 4)]).unwrap();
        let layout = ShardLayout::new(9, 6, 3, 2).unwrap();
        let inbound = layout.seed_borders(&board);

        let at = |r: isize, c: isize| {
            board.get(r.rem_euclid(6) as usize, c.rem_euclid(9) as usize)
        };

        for coord in layout.coords() {
            let borders = &inbound[layout.index(coord)];
            let (r0, c0) = layout.origin(coord);
            let (r0, c0) = (r0 as isize, c0 as isize);
            let (w, h) = (3isize, 3isize);

            for i in 0..w {
                assert_eq!(borders.north[i as usize], at(r0 - 1, c0 + i));
                assert_eq!(borders.south[i as usize], at(r0 + h, c0 + i));
            }
            for i in 0..h {
                assert_eq!(borders.west[i as usize], at(r0 + i, c0 - 1));
                assert_eq!(borders.east[i as usize], at(r0 + i, c0 + w));
            }
            assert_eq!(borders.north_west, at(r0 - 1, c0 - 1));
            assert_eq!(borders.north_east, at(r0 - 1, c0 + w));
            assert_eq!(borders.south_west, at(r0 + h, c0 - 1));
            assert_eq!(borders.south_east, at(r0 + h, c0 + w));
        }
    }
}
