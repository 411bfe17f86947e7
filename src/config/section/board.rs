//! `[board]` section configuration.
//!
//! Size and initial contents of the board bootstrapped at startup.
//!
//! # Example
//!
//! ```toml
//! [board]
//! width = 100            # Board width in cells
//! height = 100           # Defaults to width
//! density = 0.2          # Probability each cell starts alive
//! seed = 32              # RNG seed for density seeding
//! pattern = "glider"     # Named pattern instead of random cells
//! offset = [1, 1]        # Pattern corner as [row, col]
//! ```
//!
//! Explicit cells may be given as encoded rows instead:
//!
//! ```toml
//! [board]
//! width = 6
//! encoding = "columns"
//! rows = [[], [2], [3], [1, 2, 3], [], []]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::grid::{Encoding, GridError, Pattern, Seed, decode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: usize,

    /// Board height; `None` means square.
    pub height: Option<usize>,

    /// Bernoulli probability per cell when seeding randomly.
    pub density: f64,

    pub seed: u64,

    /// Named pattern to place instead of random cells.
    pub pattern: Option<String>,

    /// Pattern corner as `[row, col]`.
    pub offset: [usize; 2],

    /// Explicit live cells, one encoded list per row.
    pub rows: Option<Vec<Vec<usize>>>,

    /// Encoding of `rows`.
    pub encoding: Encoding,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: None,
            density: 0.0,
            seed: 32,
            pattern: None,
            offset: [0, 0],
            rows: None,
            encoding: Encoding::Delta,
        }
    }
}

impl BoardConfig {
    pub const WIDTH: FieldPath = FieldPath::new("board.width");
    pub const HEIGHT: FieldPath = FieldPath::new("board.height");
    pub const DENSITY: FieldPath = FieldPath::new("board.density");
    pub const PATTERN: FieldPath = FieldPath::new("board.pattern");
    pub const ROWS: FieldPath = FieldPath::new("board.rows");

    pub fn height(&self) -> usize {
        self.height.unwrap_or(self.width)
    }

    /// How to populate the board: explicit rows, then pattern, then density.
    pub fn seeding(&self) -> Result<Seed, GridError> {
        if let Some(rows) = &self.rows {
            let height = self.height();
            if rows.len() != height {
                return Err(GridError::RowCount {
                    expected: height,
                    actual: rows.len(),
                });
            }
            let grid = decode(rows, self.width, self.encoding)?;
            return Ok(Seed::Cells(grid.live_cells().collect()));
        }
        if let Some(name) = &self.pattern {
            let [row, col] = self.offset;
            return Ok(Seed::Pattern {
                name: name.clone(),
                row,
                col,
            });
        }
        Ok(Seed::Random {
            density: self.density,
            seed: self.seed,
        })
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.width == 0 {
            diag.error(Self::WIDTH, "must be at least 1");
        }
        if self.height == Some(0) {
            diag.error(Self::HEIGHT, "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.density) {
            diag.error_with_hint(
                Self::DENSITY,
                format!("{} is not a probability", self.density),
                "use a value between 0.0 and 1.0",
            );
        }
        if let Some(name) = &self.pattern
            && Pattern::find(name).is_err()
        {
            let known: Vec<_> = crate::grid::PATTERNS.iter().map(|p| p.name).collect();
            diag.error_with_hint(
                Self::PATTERN,
                format!("unknown pattern `{name}`"),
                format!("available: {}", known.join(", ")),
            );
        }
        if self.rows.is_some()
            && self.width > 0
            && let Err(e) = self.seeding()
        {
            diag.error(Self::ROWS, e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_board_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.board.width, 100);
        assert_eq!(config.board.height(), 100);
        assert_eq!(config.board.seed, 32);
        assert_eq!(
            config.board.seeding().unwrap(),
            Seed::Random {
                density: 0.0,
                seed: 32
            }
        );
    }

    #[test]
    fn test_pattern_seed() {
        let config = test_parse_config("[board]\nwidth = 12\nheight = 9\npattern = \"toad\"\noffset = [2, 3]");
        assert_eq!(config.board.height(), 9);
        assert_eq!(
            config.board.seeding().unwrap(),
            Seed::Pattern {
                name: "toad".into(),
                row: 2,
                col: 3
            }
        );
    }

    #[test]
    fn test_rows_seed() {
        let config = test_parse_config(
            "[board]\nwidth = 4\nheight = 2\nencoding = \"columns\"\nrows = [[0, 3], [1]]",
        );
        assert_eq!(
            config.board.seeding().unwrap(),
            Seed::Cells(vec![(0, 0), (0, 3), (1, 1)])
        );
    }

    #[test]
    fn test_validate_collects_every_error() {
        let config = test_parse_config("[board]\nwidth = 0\ndensity = 1.5\npattern = \"spaceship\"");
        let mut diag = ConfigDiagnostics::new();
        config.board.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![BoardConfig::WIDTH, BoardConfig::DENSITY, BoardConfig::PATTERN]
        );
    }

    #[test]
    fn test_validate_rows_height() {
        let config = test_parse_config("[board]\nwidth = 3\nheight = 3\nrows = [[1]]");
        let mut diag = ConfigDiagnostics::new();
        config.board.validate(&mut diag);
        assert_eq!(diag.errors()[0].field, BoardConfig::ROWS);
    }
}
