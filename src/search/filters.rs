//! Filter compilation: explicit caller filters + parsed query -> predicate clauses
//!
//! Every value travels as a bound parameter. A [`Clause`] owns the parameters
//! for its own placeholders, so flattening clauses in order always yields the
//! parameter list in placeholder order.
//!
//! Precedence:
//! - An explicit caller value wins when present and not a sentinel.
//! - Otherwise category falls back to the parsed query's primary category.
//! - Price bounds fall back to parsed prices only when inference is enabled.
//! - Brand, gender and colors have no inferred source.

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::{Deserialize, Serialize};

use crate::search::query_parser::ParsedQuery;
use crate::storage::sqlite::LOWER_FN;

/// Literal filler that API tooling sends for "no value".
pub const SENTINEL: &str = "string";

/// Whether a caller-supplied string means "filter not provided".
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(SENTINEL)
}

/// Filters supplied explicitly by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplicitFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl ExplicitFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Real(f64),
    Integer(i64),
    #[serde(skip)]
    Blob(Vec<u8>),
}

impl ToSql for FilterValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Text(value) => value.to_sql(),
            Self::Real(value) => value.to_sql(),
            Self::Integer(value) => value.to_sql(),
            Self::Blob(value) => value.to_sql(),
        }
    }
}

/// Catalog field a clause tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRef {
    Category,
    Brand,
    Gender,
    Price,
    Colors,
    /// Category, sub-category and title together.
    ProductText,
}

impl FieldRef {
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Category => &["category"],
            Self::Brand => &["brand_name"],
            Self::Gender => &["gender"],
            Self::Price => &["lowest_price"],
            Self::Colors => &["extracted_colors"],
            Self::ProductText => &["category", "sub_category", "title"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    AtLeast,
    AtMost,
    /// Array column contains at least one of the params.
    ContainsAny,
    /// No column contains the term as a case-insensitive substring.
    ExcludesTerm,
}

/// One ANDed predicate with its own bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub field: FieldRef,
    pub operator: Operator,
    pub params: Vec<FilterValue>,
}

impl Clause {
    fn equals(field: FieldRef, value: &str) -> Self {
        Self {
            field,
            operator: Operator::Equals,
            params: vec![FilterValue::Text(value.to_string())],
        }
    }

    fn price(operator: Operator, value: f64) -> Self {
        Self {
            field: FieldRef::Price,
            operator,
            params: vec![FilterValue::Real(value)],
        }
    }

    fn colors(colors: Vec<String>) -> Self {
        Self {
            field: FieldRef::Colors,
            operator: Operator::ContainsAny,
            params: colors.into_iter().map(FilterValue::Text).collect(),
        }
    }

    /// The term is bound once per searched column.
    fn excludes(term: &str) -> Self {
        let term = term.to_lowercase();
        let field = FieldRef::ProductText;
        Self {
            field,
            operator: Operator::ExcludesTerm,
            params: field
                .columns()
                .iter()
                .map(|_| FilterValue::Text(term.clone()))
                .collect(),
        }
    }

    /// SQL text with `?` placeholders only.
    pub fn to_sql(&self) -> String {
        let columns = self.field.columns();
        match self.operator {
            Operator::Equals => format!("{} = ?", columns[0]),
            Operator::AtLeast => format!("{} >= ?", columns[0]),
            Operator::AtMost => format!("{} <= ?", columns[0]),
            Operator::ContainsAny => {
                let tests = self
                    .params
                    .iter()
                    .map(|_| {
                        format!(
                            "EXISTS (SELECT 1 FROM json_each({}) WHERE value = ?)",
                            columns[0]
                        )
                    })
                    .collect::<Vec<_>>();
                format!("({})", tests.join(" OR "))
            }
            Operator::ExcludesTerm => {
                let tests = columns
                    .iter()
                    .map(|column| format!("instr({LOWER_FN}(coalesce({column}, '')), ?) = 0"))
                    .collect::<Vec<_>>();
                format!("({})", tests.join(" AND "))
            }
        }
    }
}

/// Ordered, ANDed clause list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledFilter {
    clauses: Vec<Clause>,
}

impl CompiledFilter {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses joined with AND, or `None` when unfiltered.
    pub fn where_sql(&self) -> Option<String> {
        if self.clauses.is_empty() {
            return None;
        }
        Some(
            self.clauses
                .iter()
                .map(Clause::to_sql)
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> impl Iterator<Item = &FilterValue> {
        self.clauses.iter().flat_map(|clause| clause.params.iter())
    }

    pub fn param_count(&self) -> usize {
        self.clauses.iter().map(|clause| clause.params.len()).sum()
    }

    /// Rendered predicate for diagnostics; never contains values.
    pub fn describe(&self) -> String {
        self.where_sql().unwrap_or_else(|| "TRUE".to_string())
    }

    fn push(&mut self, clause: Clause) {
        if !clause.params.is_empty() {
            self.clauses.push(clause);
        }
    }
}

/// Merges explicit filters with a parsed query.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler {
    infer_price_bounds: bool,
}

impl FilterCompiler {
    pub const fn new(infer_price_bounds: bool) -> Self {
        Self { infer_price_bounds }
    }

    pub fn compile(&self, explicit: &ExplicitFilters, parsed: &ParsedQuery) -> CompiledFilter {
        let mut filter = CompiledFilter::default();

        let category = real_text(explicit.category.as_deref()).or_else(|| parsed.primary_category());
        if let Some(category) = category {
            filter.push(Clause::equals(FieldRef::Category, category));
        }
        if let Some(brand) = real_text(explicit.brand.as_deref()) {
            filter.push(Clause::equals(FieldRef::Brand, brand));
        }

        let inferred = |value: Option<f64>| value.filter(|_| self.infer_price_bounds);
        let min_price = real_price(explicit.min_price).or_else(|| real_price(inferred(parsed.min_price)));
        let max_price = real_price(explicit.max_price).or_else(|| real_price(inferred(parsed.max_price)));
        if let Some(min) = min_price {
            filter.push(Clause::price(Operator::AtLeast, min));
        }
        if let Some(max) = max_price {
            filter.push(Clause::price(Operator::AtMost, max));
        }

        if let Some(colors) = &explicit.colors {
            let colors = colors
                .iter()
                .filter(|color| !is_sentinel(color))
                .map(|color| color.trim().to_string())
                .collect::<Vec<_>>();
            filter.push(Clause::colors(colors));
        }

        if let Some(gender) = real_text(explicit.gender.as_deref()) {
            filter.push(Clause::equals(FieldRef::Gender, gender));
        }

        for term in parsed.exclude_categories.iter().chain(&parsed.exclude_keywords) {
            if !is_sentinel(term) {
                filter.push(Clause::excludes(term.trim()));
            }
        }

        tracing::debug!(
            clauses = filter.clauses.len(),
            params = filter.param_count(),
            "compiled filter"
        );

        filter
    }
}

fn real_text(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !is_sentinel(v)).map(str::trim)
}

/// Zero, negative, and non-finite prices mean "unset".
fn real_price(value: Option<f64>) -> Option<f64> {
    value.filter(|price| price.is_finite() && *price > 0.0)
}
