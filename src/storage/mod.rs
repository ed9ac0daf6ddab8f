//! Storage layer for vibe-search
//!
//! The catalog lives in SQLite. The ranker talks to it only through
//! [`VectorStore`], so tests and benches can substitute their own store.

use std::time::Duration;

use crate::error::Result;
use crate::search::filters::FilterValue;

pub mod migrations;
pub mod sqlite;

pub use sqlite::{
    CatalogDb, CatalogStats, ProductRecord, decode_embedding_f16, encode_embedding_f16, encode_embedding_f32,
};

/// Columns every candidate query must select, in this order.
pub const CANDIDATE_COLUMNS: &[&str] = &[
    "id",
    "product_id",
    "title",
    "category",
    "sub_category",
    "brand_name",
    "featured_image",
    "lowest_price",
    "pdp_url",
    "distance",
    "keyword_boost",
];

/// A fully parameterized candidate query.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateQuery {
    /// SQL with `?` placeholders only.
    pub sql: String,
    /// Bound values in placeholder order.
    pub params: Vec<FilterValue>,
    /// Caller filter predicate, for error reports.
    pub predicate: String,
}

/// One row returned by a candidate query.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub id: i64,
    pub product_id: String,
    pub title: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub brand_name: Option<String>,
    pub featured_image: Option<String>,
    pub lowest_price: Option<f64>,
    pub pdp_url: Option<String>,
    /// Cosine distance to the query vector.
    pub distance: f64,
    /// Sum of lexical keyword boosts.
    pub keyword_boost: f64,
}

/// A catalog that can order rows by cosine distance under a predicate.
pub trait VectorStore: Send + Sync {
    /// Run `query`, giving up once `timeout` elapses.
    ///
    /// Predicate or connectivity problems surface as `StoreQueryFailed`; an
    /// exhausted budget as `Timeout`. An empty result is not an error.
    fn fetch_candidates(&self, query: &CandidateQuery, timeout: Duration) -> Result<Vec<CandidateRow>>;
}
