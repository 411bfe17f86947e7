//! Actor Message Definitions
//!
//! ```text
//! HTTP thread --BoardMsg--> BoardActor --ShardMsg--> ShardActor (one per shard)
//! ```

use tokio::sync::oneshot;

use super::board::BoardSnapshot;
use super::simulation::{BoardSpec, SimulationError};
use crate::shard::{ShardCoord, ShardSnapshot};
use crate::transport::{ShardRequest, ShardResponse};
use std::sync::Arc;

// =============================================================================
// ShardActor Messages
// =============================================================================

/// Messages to a Shard Actor
#[derive(Debug)]
pub enum ShardMsg {
    /// Handle one request and send the reply back
    Request {
        request: ShardRequest,
        reply: oneshot::Sender<ShardResponse>,
    },
    /// Stop the actor; the shard's state is dropped
    Shutdown,
}

// =============================================================================
// BoardActor Messages
// =============================================================================

pub type BoardReply = oneshot::Sender<Result<Arc<BoardSnapshot>, SimulationError>>;

/// Messages to the Board Actor
#[derive(Debug)]
pub enum BoardMsg {
    /// Replace the current board with a freshly seeded one
    Bootstrap { spec: BoardSpec, reply: BoardReply },
    /// Advance the board `count` generations
    Step { count: u64, reply: BoardReply },
    /// Read one shard of the current board
    Shard {
        coord: ShardCoord,
        reply: oneshot::Sender<Result<ShardSnapshot, SimulationError>>,
    },
    /// Release all shards and stop
    Shutdown,
}
