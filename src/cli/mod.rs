//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod formatters;
pub mod output;

/// Vibe Search - multimodal product search over a local catalog
#[derive(Parser, Debug)]
#[command(name = "vibe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit JSON for machine consumption (responses and structured errors)
    #[arg(long, global = true)]
    pub robot: bool,

    /// Output format (human, json, jsonl, plain, tsv)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/vibe/config.toml, then <VIBE_ROOT>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective output format. `--robot` forces JSON.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_args(self.robot, self.output_format)
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the catalog database
    Init(commands::init::InitArgs),

    /// Search the catalog by text or image
    Search(commands::search::SearchArgs),

    /// Run many search requests from a JSON or JSON-lines file
    Batch(commands::batch::BatchArgs),

    /// Show how a query is parsed and which filters it compiles to
    Parse(commands::parse::ParseArgs),

    /// Print the effective configuration
    Config(commands::config::ConfigArgs),

    /// Catalog size and embedding coverage
    Stats(commands::stats::StatsArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn robot_forces_json() {
        let cli = Cli::parse_from(["vibe", "--robot", "-O", "plain", "stats"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn parses_image_search_flags() {
        let cli = Cli::parse_from([
            "vibe",
            "search",
            "image",
            "--url",
            "https://cdn.example.com/a.jpg",
            "--text",
            "in red",
            "--image-weight",
            "0.4",
            "--color",
            "Red,Blue",
            "--color",
            "Green",
        ]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        let commands::search::SearchMode::Image(image) = args.mode else {
            panic!("expected image mode");
        };
        assert_eq!(image.image_weight, Some(0.4));
        assert_eq!(image.filters.color, vec!["Red", "Blue", "Green"]);
    }
}
