//! Error handling for vibe-search.
//!
//! This module provides:
//! - [`VibeError`]: The main error enum for all search operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context
//!
//! Query parsing and filter compilation never fail; everything here comes
//! from configuration, the embedding service, or the catalog store.

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for vibe-search operations.
#[derive(Error, Debug)]
pub enum VibeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    EmbeddingDimension { expected: usize, actual: usize },

    #[error("Catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Candidate query failed: {detail}")]
    StoreQueryFailed { detail: String, predicate: String },

    #[error("Image weight must be within [0, 1], got {0}")]
    InvalidWeight(f32),

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VibeError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) | Self::Serialization(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::EmbeddingUnavailable(_) => ErrorCode::EmbeddingUnavailable,
            Self::EmbeddingDimension { .. } => ErrorCode::EmbeddingDimensionMismatch,
            Self::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
            Self::StoreQueryFailed { .. } => ErrorCode::StoreQueryFailed,
            Self::InvalidWeight(_) => ErrorCode::SearchInvalidWeight,
            Self::InvalidRequest(_) => ErrorCode::SearchRequestInvalid,
            Self::Timeout(_) => ErrorCode::SearchTimeout,
        }
    }

    /// HTTP status a front end should answer with for this error.
    ///
    /// Validation failures are 400, upstream embedding failures 502, an
    /// unreachable store or exhausted budget 503, everything else 500.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidWeight(_) | Self::InvalidRequest(_) => 400,
            Self::EmbeddingUnavailable(_) | Self::EmbeddingDimension { .. } => 502,
            Self::StoreUnavailable(_) | Self::Timeout(_) => 503,
            _ => 500,
        }
    }

    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable(_) | Self::StoreUnavailable(_) | Self::Timeout(_)
        )
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::EmbeddingDimension { expected, actual } => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            Self::StoreQueryFailed { predicate, .. } => {
                Some(serde_json::json!({ "predicate": predicate }))
            }
            Self::InvalidWeight(weight) => Some(serde_json::json!({ "image_weight": weight })),
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_vibe_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// This is what robot mode prints, so scripts can branch on `code` and
/// `http_status` without parsing messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SEARCH_INVALID_WEIGHT")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 402)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// HTTP status the error maps to
    pub http_status: u16,

    /// Error category (e.g., "search", "upstream", "storage")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            http_status: 500,
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`VibeError`].
    #[must_use]
    pub fn from_vibe_error(err: &VibeError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            http_status: err.http_status(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<VibeError> for StructuredError {
    fn from(err: VibeError) -> Self {
        Self::from_vibe_error(&err)
    }
}

impl From<&VibeError> for StructuredError {
    fn from(err: &VibeError) -> Self {
        Self::from_vibe_error(err)
    }
}

/// Result type alias using VibeError.
pub type Result<T> = std::result::Result<T, VibeError>;
