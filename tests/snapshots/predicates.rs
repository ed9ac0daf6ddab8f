use insta::assert_snapshot;

use vibe_search::search::{ExplicitFilters, FilterCompiler, QueryParser};

fn predicate(query: &str, filters: &ExplicitFilters, infer_price_bounds: bool) -> String {
    let parsed = QueryParser::new().parse(query);
    FilterCompiler::new(infer_price_bounds)
        .compile(filters, &parsed)
        .describe()
}

#[test]
fn test_predicate_unfiltered() {
    assert_snapshot!(predicate("something nice", &ExplicitFilters::new(), true), @"TRUE");
}

#[test]
fn test_predicate_inferred_category_and_price() {
    assert_snapshot!(
        predicate("black sneakers under $80", &ExplicitFilters::new(), true),
        @"category = ? AND lowest_price <= ?"
    );
}

#[test]
fn test_predicate_price_inference_disabled() {
    assert_snapshot!(
        predicate("black sneakers under $80", &ExplicitFilters::new(), false),
        @"category = ?"
    );
}

#[test]
fn test_predicate_negation() {
    assert_snapshot!(
        predicate("sneakers not leather", &ExplicitFilters::new(), false),
        @"category = ? AND (instr(vibe_lower(coalesce(category, '')), ?) = 0 AND instr(vibe_lower(coalesce(sub_category, '')), ?) = 0 AND instr(vibe_lower(coalesce(title, '')), ?) = 0)"
    );
}

#[test]
fn test_predicate_explicit_filters() {
    let filters = ExplicitFilters::new()
        .with_brand("Zara")
        .with_price_range(Some(20.0), None)
        .with_colors(vec!["Red".to_string(), "Navy".to_string()])
        .with_gender("women");
    assert_snapshot!(
        predicate("dress", &filters, false),
        @"category = ? AND brand_name = ? AND lowest_price >= ? AND (EXISTS (SELECT 1 FROM json_each(extracted_colors) WHERE value = ?) OR EXISTS (SELECT 1 FROM json_each(extracted_colors) WHERE value = ?)) AND gender = ?"
    );
}

#[test]
fn test_predicate_sentinels_ignored() {
    let filters = ExplicitFilters {
        category: Some("string".to_string()),
        brand: Some("".to_string()),
        colors: Some(vec!["string".to_string()]),
        gender: Some("  ".to_string()),
        ..ExplicitFilters::new()
    };
    assert_snapshot!(predicate("plain query", &filters, false), @"TRUE");
}
