//! shardlife - Conway's Game of Life on a toroidal board split into shards.

mod actor;
mod cli;
mod config;
mod core;
mod grid;
mod logger;
mod shard;
mod transport;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{LifeConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    init_config(LifeConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(),
        Commands::Shard { listen } => cli::shard::shard(listen),
        Commands::Run {
            generations,
            verify,
            encoding,
            ..
        } => cli::run::run(*generations, *verify, *encoding),
    }
}
