use std::collections::BTreeSet;

use proptest::prelude::*;

use vibe_search::search::QueryParser;

fn arb_shopping_query() -> impl Strategy<Value = String> {
    let word = prop_oneof![
        Just("black".to_string()),
        Just("sneakers".to_string()),
        Just("dress".to_string()),
        Just("jacket".to_string()),
        Just("not".to_string()),
        Just("without".to_string()),
        Just("under".to_string()),
        Just("over".to_string()),
        Just("dollars".to_string()),
        "[a-z]{2,10}",
        r"\$?[0-9]{1,4}",
        r"\$[0-9]{1,3}-\$[0-9]{1,3}",
    ];
    prop::collection::vec(word, 0..12).prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn parse_never_panics_on_arbitrary_text(text in ".{0,200}") {
        let _ = QueryParser::new().parse(&text);
    }

    #[test]
    fn parse_is_deterministic(text in arb_shopping_query()) {
        let parser = QueryParser::new();
        prop_assert_eq!(parser.parse(&text), parser.parse(&text));
    }

    #[test]
    fn excluded_terms_never_remain_keywords(text in arb_shopping_query()) {
        let parsed = QueryParser::new().parse(&text);
        prop_assert!(parsed.keywords.is_disjoint(&parsed.exclude_keywords));
    }

    #[test]
    fn categories_are_unique_and_never_negated(text in arb_shopping_query()) {
        let parsed = QueryParser::new().parse(&text);
        let unique: BTreeSet<_> = parsed.categories.iter().collect();
        prop_assert_eq!(unique.len(), parsed.categories.len());
        prop_assert!(parsed.exclude_categories.is_empty());
    }

    #[test]
    fn prices_are_never_negative(text in arb_shopping_query()) {
        let parsed = QueryParser::new().parse(&text);
        prop_assert!(parsed.min_price.is_none_or(|p| p >= 0.0));
        prop_assert!(parsed.max_price.is_none_or(|p| p >= 0.0));
    }

    #[test]
    fn case_does_not_change_the_result(text in arb_shopping_query()) {
        let parser = QueryParser::new();
        prop_assert_eq!(parser.parse(&text), parser.parse(&text.to_uppercase()));
    }
}
