//! vibe batch - Run many search requests on the worker pool
//!
//! Input is a JSON array or JSON lines of tagged items:
//! `{"type": "text", "query": ...}` / `{"type": "image", "image_url": ...}`.
//! A failing item is counted and left out; it never fails its siblings.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{self, OutputFormat, robot_ok, robot_partial};
use crate::error::Result;
use crate::search::parse_batch;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Batch file, or `-` for stdin
    pub file: PathBuf,
}

pub fn run(ctx: &AppContext, args: &BatchArgs) -> Result<()> {
    let input = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.file)?
    };

    let items = parse_batch(&input)?;
    let total = items.len();
    let batch = ctx.executor.execute_batch_items(&ctx.services, items)?;

    match ctx.output_format {
        OutputFormat::Json => {
            if batch.failed > 0 {
                output::emit_json(&robot_partial(&batch, batch.results.len(), batch.failed))
            } else {
                output::emit_json(&robot_ok(&batch))
            }
        }
        OutputFormat::Jsonl => output::emit_jsonl(&batch.results),
        _ => {
            for entry in &batch.results {
                let top = entry
                    .response
                    .results
                    .first()
                    .map_or_else(|| "-".to_string(), |r| r.title.clone());
                println!(
                    "{:>4}  {:>3} results  {:>8.2}ms  {}",
                    entry.index,
                    entry.response.total,
                    entry.response.query_time_ms,
                    top
                );
            }
            let summary = format!("{} of {total} succeeded", batch.results.len());
            if batch.failed > 0 {
                println!("{} {summary}, {} failed (see log)", "!".yellow(), batch.failed);
            } else {
                println!("{} {summary}", "✓".green());
            }
            Ok(())
        }
    }
}
