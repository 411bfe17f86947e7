//! Configuration section definitions.
//!
//! Each module corresponds to a section in `shardlife.toml`:
//!
//! | Module      | TOML Section   | Purpose                               |
//! |-------------|----------------|---------------------------------------|
//! | `board`     | `[board]`      | Board size and initial cells          |
//! | `shards`    | `[shards]`     | Shard grid and remote workers         |
//! | `serve`     | `[serve]`      | HTTP board server                     |
//! | `transport` | `[transport]`  | Shard request retry and timeout       |

mod board;
mod serve;
mod shards;
mod transport;

pub use board::BoardConfig;
pub use serve::ServeConfig;
pub use shards::ShardsConfig;
pub use transport::TransportConfig;
