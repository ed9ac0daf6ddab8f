//! Output formatters for CLI commands
//!
//! Render to every [`OutputFormat`](crate::cli::OutputFormat): Human, JSON,
//! JSONL, Plain, TSV.

mod search_results;

pub use search_results::SearchResults;
