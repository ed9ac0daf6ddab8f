//! E2E Scenario: natural-language and visual search over a seeded catalog.

use super::fixture::{E2EFixture, product_ids};
use vibe_search::VibeError;
use vibe_search::config::Config;
use vibe_search::search::{ExplicitFilters, ImageInput, SearchRequest};
use vibe_search::test_utils::fixtures::product;

#[test]
fn test_price_capped_sneaker_search() {
    let mut fixture = E2EFixture::seeded("price_capped_sneaker_search");

    fixture.log_step("Parse the query without searching");
    let output = fixture.run_vibe(&["--robot", "parse", "black sneakers under $80"]);
    fixture.assert_success(&output, "parse");
    let json = output.json();
    assert_eq!(json["data"]["parsed"]["max_price"], 80.0);
    assert_eq!(json["data"]["parsed"]["categories"][0], "shoes");

    fixture.log_step("Search with price inference enabled");
    let output = fixture.run_vibe_with_env(
        &["--robot", "search", "text", "black sneakers under $80"],
        &[("VIBE_SEARCH_INFER_PRICE_BOUNDS", "1")],
    );
    fixture.assert_success(&output, "search text (inferred bounds)");
    assert_eq!(product_ids(&output.json()["data"]["results"]), vec!["sku-001"]);

    fixture.log_step("Search without inference; explicit bound does the same job");
    let output = fixture.run_vibe(&[
        "--robot",
        "search",
        "text",
        "black sneakers",
        "--max-price",
        "80",
    ]);
    fixture.assert_success(&output, "search text (explicit bound)");
    assert_eq!(product_ids(&output.json()["data"]["results"]), vec!["sku-001"]);

    fixture.log_step("Without any bound the pricier shoes come back");
    let output = fixture.run_vibe(&["--robot", "search", "text", "black sneakers under $80"]);
    fixture.assert_success(&output, "search text (no inference)");
    let ids = product_ids(&output.json()["data"]["results"]);
    assert_eq!(ids[0], "sku-001");
    assert!(ids.contains(&"sku-003".to_string()));

    fixture.generate_report();
}

#[test]
fn test_negated_material_is_excluded() {
    let mut fixture = E2EFixture::seeded("negated_material_is_excluded");

    fixture.log_step("Search sneakers, excluding leather");
    let output = fixture.run_vibe(&["--robot", "search", "text", "sneakers not leather"]);
    fixture.assert_success(&output, "search text");
    let ids = product_ids(&output.json()["data"]["results"]);
    assert!(ids.contains(&"sku-001".to_string()));
    assert!(!ids.contains(&"sku-002".to_string()), "leather sneakers leaked: {ids:?}");

    fixture.generate_report();
}

#[test]
fn test_retired_product_disappears() {
    let mut fixture = E2EFixture::seeded("retired_product_disappears");

    fixture.log_step("Retire the canvas sneakers");
    assert!(fixture.catalog.db.set_active("sku-001", false).unwrap());

    fixture.log_step("Search again");
    let output = fixture.run_vibe(&["--robot", "search", "text", "black canvas sneakers"]);
    fixture.assert_success(&output, "search text");
    let ids = product_ids(&output.json()["data"]["results"]);
    assert!(!ids.contains(&"sku-001".to_string()));
    assert!(!ids.is_empty());

    fixture.log_step("Stats still count the retired row");
    let output = fixture.run_vibe(&["--robot", "stats"]);
    fixture.assert_success(&output, "stats");
    let json = output.json();
    assert_eq!(json["data"]["total"], 6);
    assert_eq!(json["data"]["active"], 5);

    fixture.generate_report();
}

#[test]
fn test_image_search_with_text_hint() {
    let mut fixture = E2EFixture::seeded("image_search_with_text_hint");
    let url = "https://cdn.example.com/black-canvas-sneakers.jpg";

    fixture.log_step("Image only");
    let output = fixture.run_vibe(&["--robot", "search", "image", "--url", url]);
    fixture.assert_success(&output, "search image");
    let json = output.json();
    assert_eq!(product_ids(&json["data"]["results"])[0], "sku-001");
    assert_eq!(json["data"]["total"], 6);

    fixture.log_step("Image with a text hint at full image weight");
    let output = fixture.run_vibe(&[
        "--robot",
        "search",
        "image",
        "--url",
        url,
        "--text",
        "in red",
        "--image-weight",
        "1.0",
    ]);
    fixture.assert_success(&output, "search image + text");
    let results = output.json()["data"]["results"].clone();
    let sneaker = results
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["product_id"] == "sku-001")
        .expect("sku-001 present");
    assert!((sneaker["similarity_score"].as_f64().unwrap() - 1.0).abs() < 1e-3);

    fixture.generate_report();
}

#[test]
fn test_dimension_drift_surfaces_predicate() {
    let mut fixture = E2EFixture::seeded("dimension_drift_surfaces_predicate");

    fixture.log_step("Insert a product embedded at the wrong size");
    let mut drifted = product("sku-900", "Drifted Sneakers");
    drifted.category = Some("shoes".to_string());
    drifted.text_embedding = Some(vec![0.5; 8]);
    fixture.insert(&drifted);

    fixture.log_step("Stats flag the drift");
    let output = fixture.run_vibe(&["--robot", "stats"]);
    fixture.assert_success(&output, "stats");
    assert_eq!(output.json()["data"]["text_dims"], serde_json::json!([8, 384]));

    fixture.log_step("Text search fails with the predicate attached");
    let output = fixture.run_vibe(&["--robot", "search", "text", "sneakers"]);
    fixture.assert_failure(&output, "search text");
    let error = output.json()["status"]["error"].clone();
    assert_eq!(error["code"], "STORE_QUERY_FAILED");
    assert_eq!(error["http_status"], 500);
    let predicate = error["context"]["predicate"].as_str().unwrap();
    assert_eq!(predicate, "category = ?");

    fixture.log_step("Image search is unaffected");
    let output = fixture.run_vibe(&[
        "--robot",
        "search",
        "image",
        "--url",
        "https://cdn.example.com/striped-cotton-tee.jpg",
    ]);
    fixture.assert_success(&output, "search image");

    fixture.generate_report();
}

#[test]
fn test_library_executor_matches_cli() {
    let mut fixture = E2EFixture::seeded("library_executor_matches_cli");
    let config = Config::default();
    let (services, executor) = fixture.services(&config);

    fixture.log_step("Run the same query through the library");
    let request = SearchRequest::text("red dress").with_filters(ExplicitFilters::new().with_gender("women"));
    let response = executor.execute(&services, &request).unwrap();
    let library_ids: Vec<_> = response.results.iter().map(|r| r.product_id.clone()).collect();
    assert_eq!(library_ids, vec!["sku-004"]);

    fixture.log_step("And through the CLI");
    let output = fixture.run_vibe(&["--robot", "search", "text", "red dress", "--gender", "women"]);
    fixture.assert_success(&output, "search text");
    assert_eq!(product_ids(&output.json()["data"]["results"]), library_ids);

    fixture.log_step("Validation errors never touch the services");
    let err = executor
        .execute(
            &services,
            &SearchRequest::image(ImageInput::Url("https://cdn.example.com/a.jpg".to_string()))
                .with_image_weight(-0.1),
        )
        .unwrap_err();
    assert!(matches!(err, VibeError::InvalidWeight(_)));
    assert_eq!(err.http_status(), 400);

    fixture.generate_report();
}
