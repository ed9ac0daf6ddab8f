//! Vector ranking with optional lexical keyword boosts
//!
//! Two modes over the same candidate set:
//!
//! ```text
//! pure:    ORDER BY distance ASC
//! hybrid:  ORDER BY (1 - distance) + Σ boost(keyword) DESC
//!
//! boost(k) = title_boost         if k in lower(title)
//!          | category_boost      else if k in lower(category)
//!          | sub_category_boost  else if k in lower(sub_category)
//!          | 0
//! ```
//!
//! Ties keep catalog order (`rowid`). Only active rows with an embedding in
//! the searched column are candidates.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::{Result, VibeError};
use crate::search::filters::{CompiledFilter, FilterValue};
use crate::storage::{CANDIDATE_COLUMNS, CandidateQuery, CandidateRow, VectorStore, encode_embedding_f32};
use crate::storage::sqlite::{COSINE_DISTANCE_FN, LOWER_FN};

/// Additive boosts per matched keyword.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostWeights {
    pub title: f64,
    pub category: f64,
    pub sub_category: f64,
}

impl Default for BoostWeights {
    fn default() -> Self {
        Self {
            title: 0.3,
            category: 0.2,
            sub_category: 0.1,
        }
    }
}

impl BoostWeights {
    pub const fn from_config(config: &SearchConfig) -> Self {
        Self {
            title: config.title_boost,
            category: config.category_boost,
            sub_category: config.sub_category_boost,
        }
    }
}

/// Which stored embedding a query vector is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingColumn {
    Image,
    Text,
}

impl EmbeddingColumn {
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Image => "image_embedding",
            Self::Text => "text_embedding",
        }
    }
}

/// Query vector paired with the column it is comparable to.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryVector {
    pub column: EmbeddingColumn,
    pub values: Vec<f32>,
}

impl QueryVector {
    pub const fn new(column: EmbeddingColumn, values: Vec<f32>) -> Self {
        Self { column, values }
    }
}

/// A ranked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub id: i64,
    pub product_id: String,
    pub title: String,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub brand_name: Option<String>,
    pub featured_image: Option<String>,
    pub lowest_price: Option<f64>,
    pub pdp_url: Option<String>,
    /// `1 - cosine distance`.
    #[serde(rename = "similarity_score")]
    pub similarity: f64,
    /// Similarity plus keyword boosts; equals similarity in pure mode.
    pub combined_score: f64,
}

impl From<CandidateRow> for ScoredRecord {
    fn from(row: CandidateRow) -> Self {
        let similarity = 1.0 - row.distance;
        Self {
            id: row.id,
            product_id: row.product_id,
            title: row.title,
            category: row.category,
            sub_category: row.sub_category,
            brand_name: row.brand_name,
            featured_image: row.featured_image,
            lowest_price: row.lowest_price,
            pdp_url: row.pdp_url,
            similarity,
            combined_score: similarity + row.keyword_boost,
        }
    }
}

/// Builds and runs ranked candidate queries.
#[derive(Debug, Clone)]
pub struct HybridRanker {
    weights: BoostWeights,
    max_limit: u32,
}

impl HybridRanker {
    pub const fn new(weights: BoostWeights, max_limit: u32) -> Self {
        Self { weights, max_limit }
    }

    pub const fn from_config(config: &SearchConfig) -> Self {
        Self::new(BoostWeights::from_config(config), config.max_limit)
    }

    /// Build the parameterized ranking query.
    ///
    /// Parameters are bound in order: query vector, keyword boosts, filter
    /// values, limit.
    pub fn build_query(
        &self,
        query: &QueryVector,
        filter: &CompiledFilter,
        keywords: &BTreeSet<String>,
        limit: u32,
    ) -> CandidateQuery {
        let column = query.column.column_name();
        let mut params = vec![FilterValue::Blob(encode_embedding_f32(&query.values))];

        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>();

        let boost_sql = if keywords.is_empty() {
            "0.0".to_string()
        } else {
            let mut terms = Vec::with_capacity(keywords.len());
            for keyword in &keywords {
                terms.push(format!(
                    "CASE WHEN instr({LOWER_FN}(title), ?) > 0 THEN ? \
                     WHEN instr({LOWER_FN}(coalesce(category, '')), ?) > 0 THEN ? \
                     WHEN instr({LOWER_FN}(coalesce(sub_category, '')), ?) > 0 THEN ? \
                     ELSE 0.0 END"
                ));
                params.extend([
                    FilterValue::Text(keyword.clone()),
                    FilterValue::Real(self.weights.title),
                    FilterValue::Text(keyword.clone()),
                    FilterValue::Real(self.weights.category),
                    FilterValue::Text(keyword.clone()),
                    FilterValue::Real(self.weights.sub_category),
                ]);
            }
            format!("({})", terms.join(" + "))
        };

        let mut predicate = format!("{column} IS NOT NULL AND is_active = 1");
        if let Some(where_sql) = filter.where_sql() {
            predicate.push_str(" AND ");
            predicate.push_str(&where_sql);
            params.extend(filter.params().cloned());
        }

        let order_by = if keywords.is_empty() {
            "distance ASC, row_order ASC"
        } else {
            "(1.0 - distance + keyword_boost) DESC, row_order ASC"
        };

        let outer_columns = CANDIDATE_COLUMNS.join(", ");
        let sql = format!(
            "SELECT {outer_columns} FROM (\
             SELECT id, product_id, title, category, sub_category, brand_name, \
             featured_image, lowest_price, pdp_url, \
             {COSINE_DISTANCE_FN}({column}, ?) AS distance, \
             {boost_sql} AS keyword_boost, rowid AS row_order \
             FROM products WHERE {predicate}) \
             ORDER BY {order_by} LIMIT ?"
        );
        params.push(FilterValue::Integer(i64::from(limit)));

        CandidateQuery {
            sql,
            params,
            predicate: filter.describe(),
        }
    }

    /// Rank catalog rows against `query`.
    ///
    /// An empty keyword set ranks by vector distance alone. `limit` is
    /// clamped to the configured maximum and zero yields no rows.
    pub fn rank(
        &self,
        store: &dyn VectorStore,
        query: &QueryVector,
        filter: &CompiledFilter,
        keywords: &BTreeSet<String>,
        limit: u32,
        timeout: Duration,
    ) -> Result<Vec<ScoredRecord>> {
        let limit = limit.min(self.max_limit);
        if limit == 0 {
            return Ok(Vec::new());
        }
        if query.values.is_empty() {
            return Err(VibeError::InvalidRequest("empty query vector".to_string()));
        }

        let candidate_query = self.build_query(query, filter, keywords, limit);
        let rows = store.fetch_candidates(&candidate_query, timeout)?;

        tracing::debug!(
            column = query.column.column_name(),
            keywords = keywords.len(),
            rows = rows.len(),
            "ranked candidates"
        );

        Ok(rows.into_iter().map(ScoredRecord::from).collect())
    }
}
