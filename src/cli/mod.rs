//! Command-line interface module.

mod args;
pub mod run;
pub mod serve;
pub mod shard;

pub use args::{BoardArgs, Cli, Commands};
