//! Request/response payloads between the coordinator and a shard.
//!
//! The TCP transport sends these as newline-delimited JSON; the in-process
//! transport passes them through a channel unchanged.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::shard::{BorderSet, ShardCoord, ShardError, ShardSnapshot, StepOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ShardRequest {
    /// Install a fresh worker at generation 0.
    Provision { coord: ShardCoord, grid: Grid },
    /// Compute `generation + 1` from the given inbound borders.
    Step { generation: u64, borders: BorderSet },
    /// Undo the last step if it moved past `generation`.
    Rollback { generation: u64 },
    /// Current grid and generation.
    Snapshot,
    /// Drop the worker; the slot can be provisioned again.
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum ShardResponse {
    Provisioned,
    Stepped(StepOutcome),
    RolledBack,
    Snapshot(ShardSnapshot),
    Released,
    Failed(ShardError),
}

impl ShardResponse {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::Stepped(_) => "stepped",
            Self::RolledBack => "rolled_back",
            Self::Snapshot(_) => "snapshot",
            Self::Released => "released",
            Self::Failed(_) => "failed",
        }
    }
}
