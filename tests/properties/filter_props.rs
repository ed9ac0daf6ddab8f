use std::collections::BTreeSet;

use proptest::prelude::*;

use vibe_search::search::{
    BoostWeights, EmbeddingColumn, ExplicitFilters, FilterCompiler, FilterValue, HybridRanker,
    ParsedQuery, QueryParser, QueryVector,
};

/// Values drawn from a marker alphabet so leaks into SQL are detectable.
fn marker() -> impl Strategy<Value = String> {
    "zq[a-z]{3,8}"
}

fn maybe_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("string".to_string())),
        Just(Some("  ".to_string())),
        marker().prop_map(Some),
    ]
}

fn maybe_price() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(0.0)),
        Just(Some(-5.0)),
        Just(Some(f64::NAN)),
        (1.0f64..10_000.0).prop_map(Some),
    ]
}

fn arb_filters() -> impl Strategy<Value = ExplicitFilters> {
    (
        maybe_text(),
        maybe_text(),
        maybe_price(),
        maybe_price(),
        prop::option::of(prop::collection::vec(
            prop_oneof![marker(), Just("string".to_string())],
            0..4,
        )),
        maybe_text(),
    )
        .prop_map(|(category, brand, min_price, max_price, colors, gender)| ExplicitFilters {
            category,
            brand,
            min_price,
            max_price,
            colors,
            gender,
        })
}

fn arb_parsed() -> impl Strategy<Value = ParsedQuery> {
    (
        prop::collection::vec(marker(), 0..3),
        prop::collection::btree_set(marker(), 0..4),
        prop::option::of(1.0f64..500.0),
        prop::option::of(1.0f64..500.0),
        prop::collection::btree_set(marker(), 0..4),
    )
        .prop_map(|(categories, exclude_keywords, min_price, max_price, keywords)| ParsedQuery {
            categories,
            exclude_keywords,
            min_price,
            max_price,
            keywords,
            ..ParsedQuery::default()
        })
}

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

fn text_params<'a>(params: impl Iterator<Item = &'a FilterValue>) -> Vec<String> {
    params
        .filter_map(|value| match value {
            FilterValue::Text(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn placeholders_match_params(
        filters in arb_filters(),
        parsed in arb_parsed(),
        infer in any::<bool>(),
    ) {
        let compiled = FilterCompiler::new(infer).compile(&filters, &parsed);
        let sql = compiled.where_sql().unwrap_or_default();
        prop_assert_eq!(placeholders(&sql), compiled.param_count());
        for clause in compiled.clauses() {
            prop_assert_eq!(placeholders(&clause.to_sql()), clause.params.len());
        }
    }

    #[test]
    fn predicate_never_embeds_values(filters in arb_filters(), parsed in arb_parsed()) {
        let compiled = FilterCompiler::new(true).compile(&filters, &parsed);
        let predicate = compiled.describe();
        prop_assert!(!predicate.contains("zq"), "value leaked into {}", predicate);
    }

    #[test]
    fn sentinels_never_become_params(filters in arb_filters(), parsed in arb_parsed()) {
        let compiled = FilterCompiler::new(true).compile(&filters, &parsed);
        for value in text_params(compiled.params()) {
            prop_assert!(value != "string" && !value.trim().is_empty());
        }
        for value in compiled.params() {
            if let FilterValue::Real(price) = value {
                prop_assert!(price.is_finite() && *price > 0.0);
            }
        }
    }

    #[test]
    fn explicit_category_wins(category in marker(), parsed in arb_parsed()) {
        let filters = ExplicitFilters::new().with_category(category.clone());
        let compiled = FilterCompiler::new(false).compile(&filters, &parsed);
        let first = &compiled.clauses()[0];
        prop_assert_eq!(first.to_sql(), "category = ?");
        prop_assert_eq!(&first.params[0], &FilterValue::Text(category));
    }

    #[test]
    fn candidate_query_binds_every_placeholder(
        filters in arb_filters(),
        text in ".{0,80}",
        dims in 1usize..16,
        limit in 1u32..500,
    ) {
        let parsed = QueryParser::new().parse(&text);
        let compiled = FilterCompiler::new(true).compile(&filters, &parsed);
        let ranker = HybridRanker::new(BoostWeights::default(), 100);
        let query = QueryVector::new(EmbeddingColumn::Text, vec![0.25; dims]);
        let candidate = ranker.build_query(&query, &compiled, &parsed.keywords, limit);
        prop_assert_eq!(placeholders(&candidate.sql), candidate.params.len());
        prop_assert_eq!(candidate.predicate, compiled.describe());
    }

    #[test]
    fn keywords_only_travel_as_params(keywords in prop::collection::btree_set(marker(), 0..6)) {
        let ranker = HybridRanker::new(BoostWeights::default(), 100);
        let query = QueryVector::new(EmbeddingColumn::Image, vec![1.0, 0.0]);
        let candidate = ranker.build_query(&query, &Default::default(), &keywords, 10);
        prop_assert!(!candidate.sql.contains("zq"));
        let bound: BTreeSet<String> = text_params(candidate.params.iter()).into_iter().collect();
        prop_assert_eq!(bound, keywords);
    }
}
