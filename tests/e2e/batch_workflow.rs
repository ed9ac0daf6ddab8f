//! E2E Scenario: batches run on the worker pool with per-item isolation.

use super::fixture::{E2EFixture, product_ids};
use vibe_search::config::Config;
use vibe_search::search::{ExplicitFilters, ImageInput, SearchRequest};

#[test]
fn test_batch_items_fail_independently() {
    let mut fixture = E2EFixture::seeded("batch_items_fail_independently");
    let mut config = Config::default();
    config.search.batch_workers = 2;
    let (services, executor) = fixture.services(&config);

    fixture.log_step("Mix valid and invalid requests");
    let requests = vec![
        SearchRequest::text("black sneakers").with_limit(1),
        SearchRequest::image(ImageInput::Url("https://cdn.example.com/x.jpg".to_string()))
            .with_image_weight(2.0),
        SearchRequest::text("   "),
        SearchRequest::image(ImageInput::Url(
            "https://cdn.example.com/red-floral-midi-dress.jpg".to_string(),
        ))
        .with_filters(ExplicitFilters::new().with_category("dresses")),
        SearchRequest::text("red dress").with_limit(0),
    ];

    let batch = executor.execute_batch(&services, requests).unwrap();
    assert_eq!(batch.failed, 3);
    let indexes: Vec<_> = batch.results.iter().map(|e| e.index).collect();
    assert_eq!(indexes, vec![0, 3]);
    assert_eq!(batch.results[0].response.results[0].product_id, "sku-001");
    assert_eq!(batch.results[0].response.total, 1);
    assert_eq!(batch.results[1].response.results[0].product_id, "sku-004");

    fixture.generate_report();
}

#[test]
fn test_batch_file_through_cli() {
    let mut fixture = E2EFixture::seeded("batch_file_through_cli");

    fixture.log_step("Write a JSON array batch file");
    let batch_path = fixture.catalog.root.join("batch.json");
    std::fs::write(
        &batch_path,
        r#"[
            {"type": "text", "query": "denim trucker", "limit": 3},
            {"type": "image", "image_url": "https://cdn.example.com/black-chelsea-boots.jpg", "category": "shoes"},
            {"type": "image", "image_url": "https://cdn.example.com/a.jpg", "image_bytes": "aGVsbG8="}
        ]"#,
    )
    .unwrap();

    fixture.log_step("Run the batch");
    let path = batch_path.to_string_lossy().to_string();
    let output = fixture.run_vibe(&["--robot", "batch", path.as_str()]);
    fixture.assert_success(&output, "batch");

    let json = output.json();
    assert_eq!(json["status"]["partial"]["completed"], 2);
    assert_eq!(json["status"]["partial"]["failed"], 1);
    let results = json["data"]["results"].as_array().unwrap();
    assert_eq!(product_ids(&results[0]["response"]["results"])[0], "sku-005");
    assert_eq!(product_ids(&results[1]["response"]["results"])[0], "sku-003");

    fixture.generate_report();
}
