//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod batch;
pub mod completions;
pub mod config;
pub mod init;
pub mod parse;
pub mod search;
pub mod stats;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Init(args) => init::run(ctx, args),
        Commands::Search(args) => search::run(ctx, args),
        Commands::Batch(args) => batch::run(ctx, args),
        Commands::Parse(args) => parse::run(ctx, args),
        Commands::Config(args) => config::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
        Commands::Completions(args) => completions::run(args),
    }
}
