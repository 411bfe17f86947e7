//! Configuration management for `shardlife.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── board      # [board]
//! │   ├── shards     # [shards]
//! │   ├── serve      # [serve]
//! │   └── transport  # [transport]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # LifeConfig (this file)
//! ```
//!
//! The config file is optional: without one every section takes its
//! defaults, and command-line flags override whatever was loaded.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BoardConfig, ServeConfig, ShardsConfig, TransportConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    actor::BoardSpec,
    cli::{BoardArgs, Cli, Commands},
    grid::GridError,
    log,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing shardlife.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifeConfig {
    /// Path of the loaded config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Board bootstrapped at startup
    #[serde(default)]
    pub board: BoardConfig,

    /// Shard grid and remote workers
    #[serde(default)]
    pub shards: ShardsConfig,

    /// HTTP board server
    #[serde(default)]
    pub serve: ServeConfig,

    /// Coordinator-to-shard retry and timeout
    #[serde(default)]
    pub transport: TransportConfig,
}

impl LifeConfig {
    /// Load configuration for `cli`.
    ///
    /// Searches upward from cwd for the config file. A missing file is not
    /// an error: the defaults are used.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self::default()
            }
        };

        config.apply_command_options(cli);
        config.validate(cli)?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// The board described by the `[board]` section.
    pub fn board_spec(&self) -> Result<BoardSpec, GridError> {
        Ok(BoardSpec {
            width: self.board.width,
            height: self.board.height(),
            seed: self.board.seeding()?,
        })
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve {
                board_args,
                interface,
                port,
                static_dir,
            } => {
                self.apply_board_args(board_args);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.static_dir, static_dir.as_ref());
            }
            Commands::Run { board_args, .. } => self.apply_board_args(board_args),
            // Shard workers receive their cells from the coordinator
            Commands::Shard { .. } => {}
        }
    }

    /// Apply board and shard arguments from CLI.
    ///
    /// A height set in the config file survives a bare `--width`; without
    /// one the board stays square. Any seeding flag replaces explicit `rows`
    /// from the config file, and `--density` without `--pattern` drops a
    /// configured pattern.
    fn apply_board_args(&mut self, args: &BoardArgs) {
        let board = &mut self.board;
        Self::update_option(&mut board.width, args.width.as_ref());
        if args.height.is_some() {
            board.height = args.height;
        }

        if args.pattern.is_some() || args.density.is_some() || args.seed.is_some() {
            board.rows = None;
        }
        if args.pattern.is_some() {
            board.pattern = args.pattern.clone();
        } else if args.density.is_some() {
            board.pattern = None;
        }
        Self::update_option(&mut board.density, args.density.as_ref());
        Self::update_option(&mut board.seed, args.seed.as_ref());

        let shards = &mut self.shards;
        if let Some(grid) = args.shard_grid {
            shards.grid = Some([grid.columns, grid.rows]);
            shards.count = None;
        } else if args.shard_count.is_some() {
            shards.grid = None;
            shards.count = args.shard_count;
        }
        if !args.shards.is_empty() {
            shards.addresses = args.shards.clone();
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if !cli.is_shard() {
            self.board.validate(&mut diag);
            if self.board.width > 0 && self.board.height() > 0 {
                self.shards
                    .validate(self.board.width, self.board.height(), &mut diag);
            }
            self.transport.validate(&mut diag);
        }
        if cli.is_serve() {
            self.serve.validate(&mut diag);
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text. Panics if there are unknown fields (to catch config
/// typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> LifeConfig {
    let (parsed, ignored) = LifeConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
