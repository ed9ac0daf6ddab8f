//! Search request and response records
//!
//! The wire records (`TextSearchRequest`, `ImageSearchRequest`, batch items)
//! convert into the single internal [`SearchRequest`] the executor runs.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeError};
use crate::search::embeddings::ImageInput;
use crate::search::filters::{ExplicitFilters, is_sentinel};
use crate::search::hybrid::ScoredRecord;

/// `POST /search/text` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(flatten)]
    pub filters: ExplicitFilters,
}

/// `POST /search/image` body. Exactly one of `image_url` / `image_bytes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSearchRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    /// Base64-encoded image.
    #[serde(default)]
    pub image_bytes: Option<String>,
    #[serde(default)]
    pub text_query: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub image_weight: Option<f32>,
    #[serde(flatten)]
    pub filters: ExplicitFilters,
}

/// A request as the executor sees it: text, an image, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub text: Option<String>,
    pub image: Option<ImageInput>,
    /// Image share of a fused embedding; defaults to the configured weight.
    pub image_weight: Option<f32>,
    pub limit: Option<u32>,
    pub filters: ExplicitFilters,
}

impl SearchRequest {
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            text: Some(query.into()),
            ..Self::default()
        }
    }

    pub fn image(image: ImageInput) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub const fn with_image_weight(mut self, weight: f32) -> Self {
        self.image_weight = Some(weight);
        self
    }

    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_filters(mut self, filters: ExplicitFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Free text with sentinel and blank values removed.
    pub fn text_query(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|text| !is_sentinel(text))
            .map(str::trim)
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match (&self.image, self.text_query()) {
            (Some(image), Some(text)) => format!("image {} + text {text:?}", image.describe()),
            (Some(image), None) => format!("image {}", image.describe()),
            (None, Some(text)) => format!("text {text:?}"),
            (None, None) => "empty request".to_string(),
        }
    }
}

impl From<TextSearchRequest> for SearchRequest {
    fn from(request: TextSearchRequest) -> Self {
        Self {
            text: Some(request.query),
            image: None,
            image_weight: None,
            limit: request.limit,
            filters: request.filters,
        }
    }
}

impl TryFrom<ImageSearchRequest> for SearchRequest {
    type Error = VibeError;

    fn try_from(request: ImageSearchRequest) -> Result<Self> {
        let url = request.image_url.filter(|url| !is_sentinel(url));
        let bytes = request.image_bytes.filter(|bytes| !is_sentinel(bytes));

        let image = match (url, bytes) {
            (Some(_), Some(_)) => {
                return Err(VibeError::InvalidRequest(
                    "provide either image_url or image_bytes, not both".to_string(),
                ));
            }
            (Some(url), None) => ImageInput::Url(url.trim().to_string()),
            (None, Some(encoded)) => {
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|err| {
                        VibeError::InvalidRequest(format!("image_bytes is not valid base64: {err}"))
                    })?;
                ImageInput::Bytes(decoded)
            }
            (None, None) => {
                return Err(VibeError::InvalidRequest(
                    "image_url or image_bytes is required".to_string(),
                ));
            }
        };

        Ok(Self {
            text: request.text_query,
            image: Some(image),
            image_weight: request.image_weight,
            limit: request.limit,
            filters: request.filters,
        })
    }
}

/// Ranked results for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredRecord>,
    pub total: usize,
    /// Wall-clock time, rounded to hundredths of a millisecond.
    pub query_time_ms: f64,
}

impl SearchResponse {
    pub fn new(results: Vec<ScoredRecord>, elapsed: std::time::Duration) -> Self {
        let millis = elapsed.as_secs_f64() * 1000.0;
        Self {
            total: results.len(),
            results,
            query_time_ms: (millis * 100.0).round() / 100.0,
        }
    }
}

/// One tagged line of a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchItem {
    Text(TextSearchRequest),
    Image(ImageSearchRequest),
}

impl TryFrom<BatchItem> for SearchRequest {
    type Error = VibeError;

    fn try_from(item: BatchItem) -> Result<Self> {
        match item {
            BatchItem::Text(request) => Ok(request.into()),
            BatchItem::Image(request) => request.try_into(),
        }
    }
}

/// Parse a batch file: a JSON array, or one JSON object per line.
pub fn parse_batch(input: &str) -> Result<Vec<BatchItem>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|err| VibeError::InvalidRequest(format!("batch array: {err}")));
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|err| VibeError::InvalidRequest(format!("batch line {}: {err}", idx + 1)))
        })
        .collect()
}

/// Successful batch entry, keyed by input position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    pub response: SearchResponse,
}

/// Batch output. Failed items are omitted from `results` and counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_request_deserializes_flat_filters() {
        let request: TextSearchRequest = serde_json::from_str(
            r#"{"query": "red dress", "limit": 5, "brand": "Zara", "colors": ["Red"], "max_price": 80}"#,
        )
        .unwrap();
        assert_eq!(request.query, "red dress");
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.filters.brand.as_deref(), Some("Zara"));
        assert_eq!(request.filters.colors, Some(vec!["Red".to_string()]));
        assert_eq!(request.filters.max_price, Some(80.0));
    }

    #[test]
    fn image_request_with_url() {
        let request: ImageSearchRequest = serde_json::from_str(
            r#"{"image_url": "https://cdn.example.com/a.jpg", "text_query": "in black", "image_weight": 0.6}"#,
        )
        .unwrap();
        let search = SearchRequest::try_from(request).unwrap();
        assert_eq!(
            search.image,
            Some(ImageInput::Url("https://cdn.example.com/a.jpg".to_string()))
        );
        assert_eq!(search.text_query(), Some("in black"));
        assert_eq!(search.image_weight, Some(0.6));
    }

    #[test]
    fn image_request_decodes_base64() {
        let request = ImageSearchRequest {
            image_bytes: Some("AQID".to_string()),
            ..ImageSearchRequest::default()
        };
        let search = SearchRequest::try_from(request).unwrap();
        assert_eq!(search.image, Some(ImageInput::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn image_request_requires_exactly_one_image() {
        let neither = ImageSearchRequest {
            image_url: Some("string".to_string()),
            ..ImageSearchRequest::default()
        };
        assert!(matches!(
            SearchRequest::try_from(neither),
            Err(VibeError::InvalidRequest(_))
        ));

        let both = ImageSearchRequest {
            image_url: Some("https://cdn.example.com/a.jpg".to_string()),
            image_bytes: Some("AQID".to_string()),
            ..ImageSearchRequest::default()
        };
        assert!(matches!(
            SearchRequest::try_from(both),
            Err(VibeError::InvalidRequest(_))
        ));

        let garbage = ImageSearchRequest {
            image_bytes: Some("***".to_string()),
            ..ImageSearchRequest::default()
        };
        assert!(matches!(
            SearchRequest::try_from(garbage),
            Err(VibeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn sentinel_text_query_is_absent() {
        let request = SearchRequest::image(ImageInput::Url("u".to_string())).with_text("string");
        assert_eq!(request.text_query(), None);
        assert_eq!(request.describe(), "image url:u");
    }

    #[test]
    fn parse_batch_accepts_lines_and_arrays() {
        let lines = "{\"type\": \"text\", \"query\": \"boots\"}\n\n{\"type\": \"image\", \"image_url\": \"https://x/y.jpg\"}\n";
        let items = parse_batch(lines).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], BatchItem::Text(_)));
        assert!(matches!(items[1], BatchItem::Image(_)));

        let array = r#"[{"type": "text", "query": "boots", "limit": 3}]"#;
        let items = parse_batch(array).unwrap();
        match &items[0] {
            BatchItem::Text(request) => assert_eq!(request.limit, Some(3)),
            other => panic!("unexpected item {other:?}"),
        }
    }

    #[test]
    fn parse_batch_reports_line_number() {
        let err = parse_batch("{\"type\": \"text\", \"query\": \"ok\"}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("batch line 2"), "{err}");
    }

    #[test]
    fn search_response_rounds_elapsed() {
        let response = SearchResponse::new(Vec::new(), std::time::Duration::from_micros(12_345));
        assert_eq!(response.total, 0);
        assert!((response.query_time_ms - 12.35).abs() < 1e-9);
    }
}
