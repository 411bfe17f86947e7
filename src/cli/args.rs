//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::grid::Encoding;

/// Sharded Game of Life: coordinator, board server and shard workers
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: shardlife.toml)
    #[arg(short = 'C', long, global = true, default_value = "shardlife.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve a board over HTTP
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        board_args: BoardArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for static files
        #[arg(short = 'd', long, value_hint = clap::ValueHint::DirPath)]
        static_dir: Option<PathBuf>,
    },

    /// Run one shard worker for a remote coordinator
    #[command(visible_alias = "w")]
    Shard {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8200")]
        listen: String,
    },

    /// Run a board for N generations and print the result
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        board_args: BoardArgs,

        /// Number of generations
        #[arg(short = 'n', long, default_value_t = 100)]
        generations: u64,

        /// Also run the board unsharded and fail if the results differ
        #[arg(long)]
        verify: bool,

        /// Output encoding (delta, columns)
        #[arg(short, long, default_value = "delta")]
        encoding: Encoding,
    },
}

/// Board and shard arguments shared by `serve` and `run`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BoardArgs {
    /// Board width in cells
    #[arg(short = 'W', long)]
    pub width: Option<usize>,

    /// Board height in cells (defaults to width)
    #[arg(short = 'H', long)]
    pub height: Option<usize>,

    /// Probability each cell starts alive
    #[arg(short = 'D', long)]
    pub density: Option<f64>,

    /// Random seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Named seed pattern (glider, blinker, toad, beacon, r-pentomino)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Shard grid as COLUMNSxROWS, e.g. 2x2
    #[arg(short = 'g', long = "shard-grid", value_name = "XxY")]
    pub shard_grid: Option<ShardGrid>,

    /// Square shard grid from a shard count
    #[arg(long = "shard-count")]
    pub shard_count: Option<usize>,

    /// Remote shard worker addresses, row-major
    #[arg(long = "shards", value_name = "ADDR", num_args = 1.., value_delimiter = ',')]
    pub shards: Vec<String>,
}

/// `COLUMNSxROWS` shard grid argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardGrid {
    pub columns: usize,
    pub rows: usize,
}

impl FromStr for ShardGrid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid shard grid `{s}` (expected COLUMNSxROWS, e.g. 2x2)");
        let (columns, rows) = s
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        Ok(Self {
            columns: columns.trim().parse().map_err(|_| invalid())?,
            rows: rows.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for ShardGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
    pub const fn is_shard(&self) -> bool {
        matches!(self.command, Commands::Shard { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_shard_grid_parse() {
        assert_eq!(
            "3x2".parse::<ShardGrid>(),
            Ok(ShardGrid {
                columns: 3,
                rows: 2
            })
        );
        assert_eq!("4X4".parse::<ShardGrid>().unwrap().to_string(), "4x4");
        assert!("4".parse::<ShardGrid>().is_err());
        assert!("ax2".parse::<ShardGrid>().is_err());
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "shardlife", "run", "-W", "12", "-g", "2x3", "-n", "5", "--verify", "-e", "columns",
        ]);
        match cli.command {
            Commands::Run {
                board_args,
                generations,
                verify,
                encoding,
            } => {
                assert_eq!(board_args.width, Some(12));
                assert_eq!(board_args.shard_grid.map(|g| g.rows), Some(3));
                assert_eq!(generations, 5);
                assert!(verify);
                assert_eq!(encoding, Encoding::Columns);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_shard_addresses() {
        let cli = Cli::parse_from(["shardlife", "serve", "--shards", "a:1,b:1", "c:1", "d:1"]);
        let Commands::Serve { board_args, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(board_args.shards, vec!["a:1", "b:1", "c:1", "d:1"]);
    }
}
