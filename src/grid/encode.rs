//! Per-row live-cell encodings.
//!
//! Densities in Life are usually low, so a board is sent as one list of
//! numbers per row rather than as a full bitmap:
//!
//! ```text
//! row:      . X . . X X .
//! columns:  [1, 4, 5]
//! delta:    [1, 3, 1]
//! ```

use std::fmt::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Grid, GridError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// First live column, then the gap to each following live column.
    #[default]
    Delta,
    /// Absolute live columns.
    Columns,
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delta" => Ok(Self::Delta),
            "columns" => Ok(Self::Columns),
            other => Err(format!("unknown encoding `{other}` (expected delta or columns)")),
        }
    }
}

/// Encode each row as a list of live-cell positions.
pub fn encode(grid: &Grid, encoding: Encoding) -> Vec<Vec<usize>> {
    (0..grid.height())
        .map(|row| {
            let columns = grid
                .row(row)
                .iter()
                .enumerate()
                .filter(|(_, alive)| **alive)
                .map(|(col, _)| col);
            match encoding {
                Encoding::Columns => columns.collect(),
                Encoding::Delta => {
                    let mut prev = 0;
                    columns
                        .map(|col| {
                            let gap = col - prev;
                            prev = col;
                            gap
                        })
                        .collect()
                }
            }
        })
        .collect()
}

/// Rebuild a grid from encoded rows.
pub fn decode(rows: &[Vec<usize>], width: usize, encoding: Encoding) -> Result<Grid, GridError> {
    let height = rows.len();
    let mut grid = Grid::new(width, height)?;

    for (row, values) in rows.iter().enumerate() {
        let mut col = 0;
        for (i, &value) in values.iter().enumerate() {
            let next = match encoding {
                Encoding::Columns => value,
                Encoding::Delta if i == 0 => value,
                Encoding::Delta => col + value,
            };
            if i > 0 && next <= col {
                return Err(GridError::NotIncreasing { row });
            }
            if next >= width {
                return Err(GridError::CellOutOfRange {
                    row,
                    col: next,
                    width,
                    height,
                });
            }
            grid.set(row, next, true);
            col = next;
        }
    }

    Ok(grid)
}

/// Render the encoding as a JSON array, one row per line.
pub fn to_json(grid: &Grid, encoding: Encoding) -> String {
    let mut out = String::from("[");
    let mut prefix = "\n  ";
    for row in encode(grid, encoding) {
        let _ = write!(out, "{prefix}{}", serde_json::Value::from(row));
        prefix = ",\n  ";
    }
    out.push_str("\n]\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        Grid::with_live_cells(7, 2, [(0, 1), (0, 4), (0, 5)]).unwrap()
    }

    #[test]
    fn test_encode_columns() {
        assert_eq!(encode(&sample(), Encoding::Columns), vec![vec![1, 4, 5], vec![]]);
    }

    #[test]
    fn test_encode_delta() {
        assert_eq!(encode(&sample(), Encoding::Delta), vec![vec![1, 3, 1], vec![]]);
    }

    #[test]
    fn test_decode_delta() {
        let grid = decode(&[vec![1, 3, 1], vec![]], 7, Encoding::Delta).unwrap();
        assert_eq!(grid, sample());
    }

    #[test]
    fn test_decode_rejects_duplicate_column() {
        let err = decode(&[vec![2, 2]], 5, Encoding::Columns).unwrap_err();
        assert_eq!(err, GridError::NotIncreasing { row: 0 });

        let err = decode(&[vec![2, 0]], 5, Encoding::Delta).unwrap_err();
        assert_eq!(err, GridError::NotIncreasing { row: 0 });
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let err = decode(&[vec![1, 5]], 5, Encoding::Delta).unwrap_err();
        assert!(matches!(err, GridError::CellOutOfRange { col: 6, .. }));
    }

    #[test]
    fn test_to_json_layout() {
        assert_eq!(to_json(&sample(), Encoding::Delta), "[\n  [1,3,1],\n  []\n]\n");
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("Columns".parse::<Encoding>().unwrap(), Encoding::Columns);
        assert!("bitmap".parse::<Encoding>().is_err());
    }
}
