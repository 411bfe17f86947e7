//! Shards: partitions of the global board and the workers that own them.
//!
//! ```text
//!            col 0      col 1
//!         +----------+----------+
//!  row 0  |  (0,0)   |  (0,1)   |      each shard: shard_width x shard_height
//!         +----------+----------+      borders: 4 edges + 4 corners
//!  row 1  |  (1,0)   |  (1,1)   |      neighbors wrap at the shard-grid edge
//!         +----------+----------+
//! ```
//!
//! # Module Structure
//!
//! - `border` - `Direction` and the per-generation `BorderSet`
//! - `layout` - shard-grid topology, split/assemble, border routing
//! - `worker` - `ShardWorker::compute_step`
//! - `host` - request dispatch shared by the in-process and TCP shards

mod border;
mod host;
mod layout;
mod worker;

pub use border::{BorderSet, Direction};
pub use host::ShardHost;
pub use layout::{LayoutError, MIN_SHARD_DIMENSION, ShardLayout};
pub use worker::{ShardSnapshot, ShardWorker, StepOutcome};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of a shard in the shard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardCoord {
    pub row: usize,
    pub col: usize,
}

impl ShardCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for ShardCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Errors raised by a shard worker.
///
/// These are protocol errors: retrying the same request cannot fix them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ShardError {
    #[error("invalid border shape: {direction} edge has {actual} cells, expected {expected}")]
    InvalidBorderShape {
        direction: Direction,
        expected: usize,
        actual: usize,
    },

    #[error("generation mismatch: shard is at {actual}, request expects {expected}")]
    GenerationMismatch { expected: u64, actual: u64 },

    #[error("shard has not been provisioned")]
    NotProvisioned,

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}
