use insta::assert_snapshot;

use vibe_search::VibeError;

/// Code, HTTP status and category on one line.
fn classify(err: &VibeError) -> String {
    let structured = err.to_structured();
    format!(
        "{} {} {}",
        structured.code.code_string(),
        err.http_status(),
        structured.category
    )
}

#[test]
fn test_error_invalid_weight() {
    let err = VibeError::InvalidWeight(1.5);
    assert_snapshot!(err.to_string(), @"Image weight must be within [0, 1], got 1.5");
    assert_snapshot!(classify(&err), @"E402 400 search");
}

#[test]
fn test_error_invalid_request() {
    let err = VibeError::InvalidRequest("query text or image is required".to_string());
    assert_snapshot!(err.to_string(), @"Invalid search request: query text or image is required");
    assert_snapshot!(classify(&err), @"E401 400 search");
}

#[test]
fn test_error_embedding_dimension() {
    let err = VibeError::EmbeddingDimension {
        expected: 512,
        actual: 384,
    };
    assert_snapshot!(err.to_string(), @"Embedding has 384 dimensions, expected 512");
    assert_snapshot!(classify(&err), @"E502 502 upstream");
}

#[test]
fn test_error_embedding_unavailable() {
    let err = VibeError::EmbeddingUnavailable("connection refused".to_string());
    assert_snapshot!(err.to_string(), @"Embedding service unavailable: connection refused");
    assert_snapshot!(classify(&err), @"E501 502 upstream");
}

#[test]
fn test_error_store_query_failed() {
    let err = VibeError::StoreQueryFailed {
        detail: "dimension mismatch".to_string(),
        predicate: "category = ?".to_string(),
    };
    assert_snapshot!(err.to_string(), @"Candidate query failed: dimension mismatch");
    assert_snapshot!(classify(&err), @"E602 500 storage");
}

#[test]
fn test_error_timeout() {
    let err = VibeError::Timeout("catalog query".to_string());
    assert_snapshot!(err.to_string(), @"Timeout: catalog query");
    assert_snapshot!(classify(&err), @"E403 503 search");
}

#[test]
fn test_error_missing_config() {
    let err = VibeError::MissingConfig("embedding.endpoint".to_string());
    assert_snapshot!(err.to_string(), @"Missing required config: embedding.endpoint");
    assert_snapshot!(classify(&err), @"E304 500 config");
}
