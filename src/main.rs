//! vibe - multimodal product search CLI
//!
//! Natural-language and image queries over a local product catalog.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vibe_search::Result;
use vibe_search::app::AppContext;
use vibe_search::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.output_format().is_machine_readable() {
                // Robot mode: structured error envelope on stdout
                let response = vibe_search::cli::output::robot_error_structured(&e);
                println!("{}", serde_json::to_string(&response).unwrap_or_default());
            } else {
                let structured = e.to_structured();
                eprintln!("Error [{}]: {e}", structured.code.code_string());
                eprintln!("  {}", structured.suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Completions(args) = &cli.command {
        return vibe_search::cli::commands::completions::run(args);
    }
    let ctx = AppContext::from_cli(cli)?;
    vibe_search::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,vibe_search=info",
        1 => "info,vibe_search=debug",
        2 => "debug,vibe_search=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
