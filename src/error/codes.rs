//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 3xx: Config errors
//! - 4xx: Search errors
//! - 5xx: Upstream (embedding service) errors
//! - 6xx: Storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for robot mode output.
///
/// Each variant maps to a numeric code (e.g., `SearchInvalidWeight` -> E402).
/// Codes are grouped by category for easy identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Search errors (4xx)
    // ========================================
    /// E401: Search request is malformed (no text or image, empty query, zero limit)
    SearchRequestInvalid,
    /// E402: Image weight outside [0, 1]
    SearchInvalidWeight,
    /// E403: Search exceeded its request budget
    SearchTimeout,

    // ========================================
    // Upstream errors (5xx)
    // ========================================
    /// E501: Embedding service unreachable or returned an error
    EmbeddingUnavailable,
    /// E502: Embedding service returned a vector of the wrong size
    EmbeddingDimensionMismatch,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Catalog database could not be opened
    StoreUnavailable,
    /// E602: Candidate query failed
    StoreQueryFailed,
    /// E604: Low-level SQLite error
    DatabaseError,
    /// E605: Stored or transmitted data could not be (de)serialized
    SerializationError,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SearchInvalidWeight` -> 402).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            // Config errors (3xx)
            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            // Search errors (4xx)
            Self::SearchRequestInvalid => 401,
            Self::SearchInvalidWeight => 402,
            Self::SearchTimeout => 403,

            // Upstream errors (5xx)
            Self::EmbeddingUnavailable => 501,
            Self::EmbeddingDimensionMismatch => 502,

            // Storage errors (6xx)
            Self::StoreUnavailable => 601,
            Self::StoreQueryFailed => 602,
            Self::DatabaseError => 604,
            Self::SerializationError => 605,

            // Internal errors (9xx)
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E402").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "Check TOML syntax and value ranges in the config file. Run `vibe config` to see current values",
            Self::ConfigMissingRequired => "Set the missing value in config.toml or through its VIBE_* environment variable",

            Self::SearchRequestInvalid => "Provide non-empty query text or an image (URL or bytes), and a limit of at least 1",
            Self::SearchInvalidWeight => "Pass an image weight between 0.0 and 1.0 (default 0.7)",
            Self::SearchTimeout => "Retry the request, or raise search.request_timeout_ms",

            Self::EmbeddingUnavailable => "Check that the embedding service is running and embedding.endpoint is correct. Retry later",
            Self::EmbeddingDimensionMismatch => "embedding.text_dims / embedding.image_dims must match the model behind the embedding service",

            Self::StoreUnavailable => "Run `vibe init` to create the catalog, and check catalog.db_path permissions",
            Self::StoreQueryFailed => "Inspect the failing predicate in the error context. Run `vibe parse <query>` to see compiled clauses",
            Self::DatabaseError => "The catalog database reported an error. Check the file is a vibe catalog and not locked",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",

            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::SearchRequestInvalid
            | Self::SearchInvalidWeight
            | Self::SearchTimeout
            | Self::EmbeddingUnavailable
            | Self::EmbeddingDimensionMismatch
            | Self::StoreUnavailable
            | Self::IoError => true,

            Self::StoreQueryFailed
            | Self::DatabaseError
            | Self::SerializationError => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            3 => "config",
            4 => "search",
            5 => "upstream",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::SearchRequestInvalid,
            Self::SearchInvalidWeight,
            Self::SearchTimeout,
            Self::EmbeddingUnavailable,
            Self::EmbeddingDimensionMismatch,
            Self::StoreUnavailable,
            Self::StoreQueryFailed,
            Self::DatabaseError,
            Self::SerializationError,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
