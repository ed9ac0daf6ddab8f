//! vibe parse - Show query understanding without searching
//!
//! Prints the `ParsedQuery` and the predicate it compiles to. Bound values
//! are listed separately from the predicate, which never embeds them.

use clap::Args;
use itertools::Itertools;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::commands::search::FilterArgs;
use crate::cli::output::{self, HumanLayout, robot_ok};
use crate::error::Result;
use crate::search::{FilterCompiler, FilterValue, ParsedQuery, QueryParser};

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Query text to analyze
    pub query: String,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(Debug, Serialize)]
struct ParseReport {
    parsed: ParsedQuery,
    predicate: String,
    params: Vec<FilterValue>,
}

pub fn run(ctx: &AppContext, args: &ParseArgs) -> Result<()> {
    let parsed = QueryParser::new().parse(&args.query);
    let compiled = FilterCompiler::new(ctx.config.search.infer_price_bounds)
        .compile(&args.filters.to_filters(), &parsed);

    let report = ParseReport {
        predicate: compiled.describe(),
        params: compiled.params().cloned().collect(),
        parsed,
    };

    if ctx.output_format.is_machine_readable() {
        return output::emit_json(&robot_ok(report));
    }

    let mut layout = HumanLayout::new();
    layout
        .title(&format!("Query: {}", args.query))
        .kv("categories", &join_or_dash(&report.parsed.categories))
        .kv("keywords", &join_or_dash(&report.parsed.keywords))
        .kv("exclude_keywords", &join_or_dash(&report.parsed.exclude_keywords))
        .kv("min_price", &price_or_dash(report.parsed.min_price))
        .kv("max_price", &price_or_dash(report.parsed.max_price))
        .blank()
        .section("Compiled filter")
        .kv("predicate", &report.predicate)
        .kv("params", &join_or_dash(report.params.iter().map(describe_value)));
    output::emit_human(layout);
    Ok(())
}

fn join_or_dash<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    let joined = items.into_iter().join(", ");
    if joined.is_empty() { "-".to_string() } else { joined }
}

fn price_or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}"))
}

fn describe_value(value: &FilterValue) -> String {
    match value {
        FilterValue::Text(text) => format!("{text:?}"),
        FilterValue::Real(real) => real.to_string(),
        FilterValue::Integer(int) => int.to_string(),
        FilterValue::Blob(blob) => format!("<{} bytes>", blob.len()),
    }
}
