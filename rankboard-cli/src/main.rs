//! Rankboard CLI - LexoRank allocation and optimistic board moves.
//!
//! Commands:
//! - `rankboard between [--before R] [--after R]`: Allocate a rank between neighbours
//! - `rankboard seed <N>`: Print N evenly spaced ranks
//! - `rankboard simulate --board FILE --card ID --to LIST [--index N] [--fail]`:
//!   Apply a move to a board file and print the resulting board
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Between { before, after } => {
            println!("{}", commands::between(before.as_deref(), after.as_deref())?);
        }
        Commands::Seed { count } => {
            let ranks = commands::seed(count);
            if !ranks.is_empty() {
                println!("{}", ranks);
            }
        }
        Commands::Simulate {
            board,
            card,
            to,
            index,
            fail,
            config,
        } => {
            let json =
                commands::simulate(&board, &card, &to, index, fail, config.as_deref()).await?;
            println!("{}", json);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("rankboard=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
