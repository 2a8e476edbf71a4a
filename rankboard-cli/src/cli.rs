//! CLI definition for the rankboard command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rankboard - LexoRank allocation and optimistic board moves.
///
/// Ranks are written `bucket|payload:` (for example `0|hzzzzz:`); a bare
/// payload such as `hzzzzz` is accepted anywhere a rank is expected.
#[derive(Parser, Debug)]
#[command(name = "rankboard")]
#[command(version)]
#[command(about = "LexoRank allocation and optimistic board moves")]
#[command(
    long_about = "Allocate LexoRank keys and replay card moves against a board snapshot.\n\n\
    Environment variables:\n  \
    RUST_LOG                         Log filter when --debug is not given\n  \
    RANKBOARD_NOTIFICATION_CAPACITY  Buffered notifications per subscriber\n  \
    RANKBOARD_NOTIFICATION_TTL_MS    Notification lifetime in milliseconds"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Allocate a rank between two neighbours (either may be omitted)
    Between {
        /// Rank of the entity that will sort before the new one
        #[arg(long)]
        before: Option<String>,
        /// Rank of the entity that will sort after the new one
        #[arg(long)]
        after: Option<String>,
    },

    /// Print N evenly spaced ranks for populating an empty container
    Seed {
        /// Number of ranks to generate
        count: usize,
    },

    /// Apply a card move optimistically to a board file and print the result
    Simulate {
        /// Board detail JSON file
        #[arg(long, value_name = "FILE")]
        board: PathBuf,
        /// Id of the card to move
        #[arg(long, value_name = "ID")]
        card: String,
        /// Id of the destination list
        #[arg(long, value_name = "LIST")]
        to: String,
        /// Display index in the destination list
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Make the authoritative store reject the move
        #[arg(long)]
        fail: bool,
        /// Configuration file (toml, yaml or json)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}
