//! `[shards]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [shards]
//! grid = [2, 2]          # Columns x rows; omit for an unsharded board
//! count = 4              # Or a perfect-square shard count
//! addresses = [          # Remote `shardlife shard` workers, row-major
//!     "10.0.0.1:8200", "10.0.0.2:8200",
//!     "10.0.0.3:8200", "10.0.0.4:8200",
//! ]
//! ```
//!
//! Without `addresses`, shards run inside the coordinator process.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::shard::{LayoutError, ShardLayout};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardsConfig {
    /// `[columns, rows]` of the shard grid.
    pub grid: Option<[usize; 2]>,

    /// Square shard grid of `count` shards.
    pub count: Option<usize>,

    /// Remote shard worker addresses, row-major.
    pub addresses: Vec<String>,
}

impl ShardsConfig {
    pub const GRID: FieldPath = FieldPath::new("shards.grid");
    pub const COUNT: FieldPath = FieldPath::new("shards.count");
    pub const ADDRESSES: FieldPath = FieldPath::new("shards.addresses");

    pub fn is_sharded(&self) -> bool {
        self.grid.is_some() || self.count.is_some() || !self.addresses.is_empty()
    }

    /// Check the shard grid against a `width x height` board.
    pub fn validate(&self, width: usize, height: usize, diag: &mut ConfigDiagnostics) {
        if self.grid.is_some() && self.count.is_some() {
            diag.error_with_hint(
                Self::COUNT,
                "cannot be combined with `shards.grid`",
                "set either `grid` or `count`",
            );
            return;
        }
        if width == 0 || height == 0 {
            // Reported by [board]
            return;
        }

        let layout = match (self.grid, self.count) {
            (Some([columns, rows]), _) => ShardLayout::new(width, height, columns, rows),
            (None, Some(count)) => ShardLayout::square(width, height, count),
            (None, None) if !self.addresses.is_empty() => {
                ShardLayout::square(width, height, self.addresses.len())
            }
            (None, None) => return,
        };

        match layout {
            Ok(layout) => {
                if !self.addresses.is_empty()
                    && let Err(e) = layout.expect_count(self.addresses.len())
                {
                    diag.error(Self::ADDRESSES, e.to_string());
                }
            }
            Err(e) => {
                let field = match (&e, self.grid, self.count) {
                    (LayoutError::NotSquare(_), _, None) => Self::ADDRESSES,
                    (_, Some(_), _) => Self::GRID,
                    (_, None, Some(_)) => Self::COUNT,
                    _ => Self::ADDRESSES,
                };
                let hint = match &e {
                    LayoutError::NotDivisible { axis, size, .. } => {
                        Some(format!("board {axis} {size} must be a multiple of the shard count"))
                    }
                    LayoutError::TooSmall { .. } => {
                        Some("use fewer shards or a larger board".to_string())
                    }
                    _ => None,
                };
                match hint {
                    Some(hint) => diag.error_with_hint(field, e.to_string(), hint),
                    None => diag.error(field, e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn errors(extra: &str, width: usize, height: usize) -> Vec<FieldPath> {
        let config = test_parse_config(extra);
        let mut diag = ConfigDiagnostics::new();
        config.shards.validate(width, height, &mut diag);
        diag.errors().iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_unsharded_by_default() {
        let config = test_parse_config("");
        assert!(!config.shards.is_sharded());
        assert!(errors("", 7, 7).is_empty());
    }

    #[test]
    fn test_grid_must_divide_board() {
        assert!(errors("[shards]\ngrid = [2, 3]", 12, 9).is_empty());
        assert_eq!(errors("[shards]\ngrid = [3, 3]", 10, 9), vec![ShardsConfig::GRID]);
        assert_eq!(errors("[shards]\ngrid = [5, 1]", 10, 9), vec![ShardsConfig::GRID]);
    }

    #[test]
    fn test_count_must_be_square() {
        assert_eq!(errors("[shards]\ncount = 3", 12, 12), vec![ShardsConfig::COUNT]);
        assert!(errors("[shards]\ncount = 9", 12, 12).is_empty());
    }

    #[test]
    fn test_grid_and_count_conflict() {
        assert_eq!(
            errors("[shards]\ngrid = [2, 2]\ncount = 4", 12, 12),
            vec![ShardsConfig::COUNT]
        );
    }

    #[test]
    fn test_addresses_must_match_grid() {
        let extra = "[shards]\ngrid = [2, 1]\naddresses = [\"a:1\", \"b:1\", \"c:1\"]";
        assert_eq!(errors(extra, 12, 12), vec![ShardsConfig::ADDRESSES]);

        let extra = "[shards]\naddresses = [\"a:1\", \"b:1\", \"c:1\"]";
        assert_eq!(errors(extra, 12, 12), vec![ShardsConfig::ADDRESSES]);
    }
}
