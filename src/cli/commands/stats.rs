//! vibe stats - Catalog size and embedding coverage

use std::time::Duration;

use clap::Args;
use itertools::Itertools;

use crate::app::AppContext;
use crate::cli::output::{self, HumanLayout, robot_ok};
use crate::error::Result;
use crate::storage::CatalogDb;

#[derive(Args, Debug)]
pub struct StatsArgs {}

pub fn run(ctx: &AppContext, _args: &StatsArgs) -> Result<()> {
    let db = CatalogDb::open(
        &ctx.catalog_path,
        Duration::from_millis(ctx.config.catalog.busy_timeout_ms),
    )?;
    let stats = db.stats()?;

    warn_on_dimension_drift("image", &stats.image_dims, ctx.config.embedding.image_dims);
    warn_on_dimension_drift("text", &stats.text_dims, ctx.config.embedding.text_dims);

    if ctx.output_format.is_machine_readable() {
        return output::emit_json(&robot_ok(&stats));
    }

    let dims = |values: &[u32]| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.iter().join(", ")
        }
    };

    let mut layout = HumanLayout::new();
    layout
        .section("Catalog")
        .kv("path", &ctx.catalog_path.display().to_string())
        .kv("products", &stats.total.to_string())
        .kv("active", &stats.active.to_string())
        .kv("image embeddings", &stats.with_image_embedding.to_string())
        .kv("text embeddings", &stats.with_text_embedding.to_string())
        .kv("image dims", &dims(&stats.image_dims))
        .kv("text dims", &dims(&stats.text_dims));
    output::emit_human(layout);
    Ok(())
}

fn warn_on_dimension_drift(kind: &str, stored: &[u32], configured: u32) {
    if stored.iter().any(|dims| *dims != configured) {
        tracing::warn!(
            kind,
            configured,
            stored = ?stored,
            "stored embedding dimensions differ from configuration; affected searches will fail"
        );
    }
}
