//! Natural-language query understanding.
//!
//! Turns free text such as "black sneakers under $80 not leather" into a
//! [`ParsedQuery`]: inferred categories, negated terms, price bounds and
//! generic keywords. Parsing is total: odd or adversarial input yields fewer
//! constraints, never an error.
//!
//! Precedence of the price passes:
//!
//! 1. Contextual numerals (`under 50`, `over $100`, `80 dollars`) feed a
//!    tightest-bound-wins accumulator. Bare numerals look 30 characters back
//!    for the same vocabulary.
//! 2. An explicit range (`$50-$100`) overwrites both bounds; the last range in
//!    the text wins.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Category keyword table, in precedence order.
///
/// A keyword may map to several categories (`jacket` is both a top and
/// outerwear); the first category listed wins when a single one is needed.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "shoes",
        &[
            "shoes", "shoe", "footwear", "sneakers", "sneaker", "boots", "boot", "sandals",
            "sandal", "heels", "heel", "flats", "flat",
        ],
    ),
    (
        "tops",
        &[
            "shirt", "shirts", "top", "tops", "t-shirt", "tshirt", "blouse", "blouses", "sweater",
            "sweaters", "hoodie", "hoodies", "jacket", "jackets", "coat", "coats",
        ],
    ),
    (
        "bottoms",
        &[
            "pants", "pant", "trousers", "trouser", "jeans", "jean", "shorts", "short", "skirt",
            "skirts",
        ],
    ),
    (
        "accessories",
        &[
            "accessory", "accessories", "bag", "bags", "handbag", "handbags", "watch", "watches",
            "sunglasses", "belt", "belts", "jewelry", "jewellery",
        ],
    ),
    ("dresses", &["dress", "dresses", "gown", "gowns"]),
    (
        "outerwear",
        &[
            "jacket", "jackets", "coat", "coats", "blazer", "blazers", "parka", "parkas",
        ],
    ),
];

/// Negation triggers; each negates exactly the next token.
static NEGATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["not", "no", "exclude", "except", "without", "avoid"]
        .iter()
        .map(|trigger| Regex::new(&format!(r"\b{trigger}\s+(\w+)")).expect("static pattern"))
        .collect()
});

/// Tokens a negation trigger may not capture.
const NEGATION_SKIP: &[&str] = &["the", "a", "an", "this", "that", "these", "those"];

static CONTEXTUAL_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(under|below|less than|max|maximum|over|above|more than|min|minimum)?\s*\$?([0-9]+)\s*(dollars?)?",
    )
    .expect("static pattern")
});

static PRICE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?([0-9]+)\s*-\s*\$?([0-9]+)").expect("static pattern"));

/// Bound vocabulary, matched as plain substrings ("thunderbird" reads as "under").
const UPPER_BOUND_WORDS: &[&str] = &["under", "below", "less than", "max", "maximum"];
const LOWER_BOUND_WORDS: &[&str] = &["over", "above", "more than", "min", "minimum"];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").expect("static pattern"));

/// How far back a bare numeral looks for bound vocabulary, in characters.
const LOOKBACK_CHARS: usize = 30;

const STOPWORDS: &[&str] = &[
    // request phrasing
    "show", "me", "find", "search", "that", "would", "match", "this", "outfit", "items",
    "similar", "to", "but", "with", "the", "a", "an", "and",
    // negation triggers
    "not", "no", "exclude", "except", "without", "avoid",
    // price vocabulary
    "under", "below", "less", "than", "max", "maximum", "over", "above", "more", "min",
    "minimum", "dollar", "dollars",
];

/// Keyword -> categories, built once in first-appearance order.
static CATEGORY_INDEX: LazyLock<Vec<(&'static str, Vec<&'static str>)>> = LazyLock::new(|| {
    let mut index: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for (category, keywords) in CATEGORY_KEYWORDS {
        for keyword in *keywords {
            match index.iter_mut().find(|(existing, _)| *existing == *keyword) {
                Some((_, categories)) => categories.push(*category),
                None => index.push((*keyword, vec![*category])),
            }
        }
    }
    index
});

/// Structured constraints extracted from free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Inferred categories, in discovery order, without duplicates.
    pub categories: Vec<String>,
    /// Never populated from text: negation is keyword-scoped.
    pub exclude_categories: BTreeSet<String>,
    pub exclude_keywords: BTreeSet<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub keywords: BTreeSet<String>,
}

impl ParsedQuery {
    /// The category a caller should use when it needs exactly one.
    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.exclude_categories.is_empty()
            && self.exclude_keywords.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.keywords.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Upper,
    Lower,
}

/// Stateless parser over the shared category index.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParser;

impl QueryParser {
    pub const fn new() -> Self {
        Self
    }

    /// Parse optional text; `None` behaves like the empty string.
    pub fn parse_optional(&self, text: Option<&str>) -> ParsedQuery {
        text.map_or_else(ParsedQuery::default, |text| self.parse(text))
    }

    pub fn parse(&self, text: &str) -> ParsedQuery {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        if normalized.trim().is_empty() {
            return ParsedQuery::default();
        }

        let mut parsed = ParsedQuery {
            exclude_keywords: extract_exclusions(&normalized),
            ..ParsedQuery::default()
        };

        extract_contextual_prices(&normalized, &mut parsed);
        extract_price_range(&normalized, &mut parsed);

        for (keyword, categories) in CATEGORY_INDEX.iter() {
            if !normalized.contains(*keyword) {
                continue;
            }
            for category in categories {
                if !parsed.categories.iter().any(|c| c == category) {
                    parsed.categories.push((*category).to_string());
                }
            }
            parsed.keywords.insert((*keyword).to_string());
        }

        for token in WORD.find_iter(&normalized).map(|m| m.as_str()) {
            if token.chars().count() < 2
                || token.chars().all(|c| c.is_ascii_digit())
                || STOPWORDS.contains(&token)
                || is_category_keyword(token)
            {
                continue;
            }
            parsed.keywords.insert(token.to_string());
        }

        let excluded = &parsed.exclude_keywords;
        parsed.keywords.retain(|keyword| !excluded.contains(keyword));

        tracing::debug!(
            categories = parsed.categories.len(),
            exclusions = parsed.exclude_keywords.len(),
            keywords = parsed.keywords.len(),
            has_min = parsed.min_price.is_some(),
            has_max = parsed.max_price.is_some(),
            "parsed query"
        );

        parsed
    }
}

fn is_category_keyword(token: &str) -> bool {
    CATEGORY_INDEX.iter().any(|(keyword, _)| *keyword == token)
}

fn extract_exclusions(text: &str) -> BTreeSet<String> {
    let mut excluded = BTreeSet::new();
    for pattern in NEGATION_PATTERNS.iter() {
        for captures in pattern.captures_iter(text) {
            let Some(target) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if !NEGATION_SKIP.contains(&target) {
                excluded.insert(target.to_string());
            }
        }
    }
    excluded
}

fn extract_contextual_prices(text: &str, parsed: &mut ParsedQuery) {
    for captures in CONTEXTUAL_PRICE.captures_iter(text) {
        let (Some(whole), Some(number)) = (captures.get(0), captures.get(2)) else {
            continue;
        };
        let Ok(value) = number.as_str().parse::<f64>() else {
            continue;
        };

        let bound = match captures.get(1) {
            Some(context) => bound_in(context.as_str()),
            None if whole.start() > 0 => bound_in(&lookback(text, whole.start())),
            None => None,
        };

        match bound {
            Some(Bound::Upper) => {
                parsed.max_price = Some(parsed.max_price.map_or(value, |max| max.min(value)));
            }
            Some(Bound::Lower) => {
                parsed.min_price = Some(parsed.min_price.map_or(value, |min| min.max(value)));
            }
            None => {}
        }
    }
}

fn extract_price_range(text: &str, parsed: &mut ParsedQuery) {
    for captures in PRICE_RANGE.captures_iter(text) {
        let low = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let high = captures.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let (Some(low), Some(high)) = (low, high) {
            parsed.min_price = Some(low);
            parsed.max_price = Some(high);
        }
    }
}

/// Upper-bound vocabulary is checked first.
fn bound_in(context: &str) -> Option<Bound> {
    if UPPER_BOUND_WORDS.iter().any(|word| context.contains(word)) {
        Some(Bound::Upper)
    } else if LOWER_BOUND_WORDS.iter().any(|word| context.contains(word)) {
        Some(Bound::Lower)
    } else {
        None
    }
}

fn lookback(text: &str, end: usize) -> String {
    let mut window: Vec<char> = text[..end].chars().rev().take(LOOKBACK_CHARS).collect();
    window.reverse();
    window.into_iter().collect()
}
