//! vibe init - Create or migrate the catalog database

use std::time::Duration;

use clap::Args;
use colored::Colorize;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{self, robot_ok};
use crate::error::Result;
use crate::storage::CatalogDb;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also write a default config.toml into the data directory if none exists
    #[arg(long)]
    pub write_config: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    catalog_path: String,
    schema_version: u32,
    products: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_written: Option<String>,
}

pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<()> {
    let db = CatalogDb::open(
        &ctx.catalog_path,
        Duration::from_millis(ctx.config.catalog.busy_timeout_ms),
    )?;

    let config_written = if args.write_config {
        write_default_config(ctx)?
    } else {
        None
    };

    let report = InitReport {
        catalog_path: ctx.catalog_path.display().to_string(),
        schema_version: db.schema_version(),
        products: db.count_products()?,
        config_written,
    };
    tracing::info!(path = %report.catalog_path, schema_version = report.schema_version, "catalog initialized");

    if ctx.output_format.is_machine_readable() {
        return output::emit_json(&robot_ok(report));
    }

    println!("{} Catalog ready at {}", "✓".green(), report.catalog_path.cyan());
    println!("  schema version {}", report.schema_version);
    println!("  {} products", report.products);
    if let Some(path) = &report.config_written {
        println!("  wrote {}", path.cyan());
    }
    Ok(())
}

fn write_default_config(ctx: &AppContext) -> Result<Option<String>> {
    let path = ctx.vibe_root.join("config.toml");
    if path.exists() {
        return Ok(None);
    }
    std::fs::create_dir_all(&ctx.vibe_root)?;
    let rendered = toml::to_string_pretty(&ctx.config)
        .map_err(|err| crate::error::VibeError::Config(format!("render config: {err}")))?;
    std::fs::write(&path, rendered)?;
    Ok(Some(path.display().to_string()))
}
