//! Actor System for the sharded board
//!
//! ```text
//! HTTP threads --> BoardActor --> Coordinator --> ShardActor xN  (local)
//! (blocking)       (simulation)   (rounds)    \-> shard servers  (tcp)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `board` - Owns the simulation, publishes committed snapshots
//! - `simulation` - Single-grid or sharded engine behind one interface
//! - `coordinator` - Lock-step rounds, border routing, retry and rollback
//! - `shard` - In-process shard worker

pub mod board;
pub mod coordinator;
pub mod messages;
pub mod shard;
pub mod simulation;

pub use board::{BoardActor, BoardHandle, BoardSnapshot, board_channel};
pub use coordinator::{Coordinator, CoordinatorError};
pub use messages::ShardMsg;
pub use shard::ShardActor;
pub use simulation::{BoardSpec, ShardPlan, Simulation, SimulationError};
