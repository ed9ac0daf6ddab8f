//! vibe config - Show the effective configuration
//!
//! Values are the result of defaults, config files and `VIBE_*` overrides.

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{self, robot_ok};
use crate::config::Config;
use crate::error::{Result, VibeError};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print a single key, e.g. `search.max_limit`
    pub key: Option<String>,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    match &args.key {
        Some(key) => emit_key(ctx, key),
        None => emit_config(ctx),
    }
}

fn emit_config(ctx: &AppContext) -> Result<()> {
    if ctx.output_format.is_machine_readable() {
        return output::emit_json(&robot_ok(serde_json::json!({
            "config": ctx.config,
            "config_path": ctx.config_path,
            "catalog_path": ctx.catalog_path,
            "vibe_root": ctx.vibe_root,
        })));
    }

    let rendered = toml::to_string_pretty(&ctx.config)
        .map_err(|err| VibeError::Config(format!("render config: {err}")))?;
    println!("# catalog: {}", ctx.catalog_path.display());
    println!("{rendered}");
    Ok(())
}

fn emit_key(ctx: &AppContext, key: &str) -> Result<()> {
    let value = lookup_key(&ctx.config, key)?;
    if ctx.output_format.is_machine_readable() {
        return output::emit_json(&robot_ok(serde_json::json!({ "key": key, "value": value })));
    }
    match value {
        serde_json::Value::String(text) => println!("{text}"),
        serde_json::Value::Null => println!(),
        other => println!("{other}"),
    }
    Ok(())
}

/// Resolve a dotted key against the serialized config.
fn lookup_key(config: &Config, key: &str) -> Result<serde_json::Value> {
    let root = serde_json::to_value(config)?;
    let mut current = &root;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| VibeError::Config(format!("unknown config key: {key}")))?;
    }
    Ok(current.clone())
}
