//! Multimodal product search
//!
//! Free text and/or an image become a vector lookup over the catalog,
//! narrowed by structured filters and re-ranked with lexical keyword boosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │               SearchRequest (text | image | both)              │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                ┌───────────────────────────────┐
//!                │  SearchExecutor (executor.rs) │  validate, deadline
//!                └───────────────────────────────┘
//!          │                     │                        │
//!          ▼                     ▼                        ▼
//! ┌─────────────────┐  ┌──────────────────┐  ┌──────────────────────┐
//! │ EmbeddingService│  │   QueryParser    │  │   FilterCompiler     │
//! │ (embeddings.rs) │  │(query_parser.rs) │─▶│    (filters.rs)      │
//! └─────────────────┘  └──────────────────┘  └──────────────────────┘
//!          │                     │ keywords               │ clauses
//!          └─────────────────────┼────────────────────────┘
//!                                ▼
//!                ┌───────────────────────────────┐
//!                │   HybridRanker (hybrid.rs)    │
//!                └───────────────────────────────┘
//!                                │
//!                                ▼
//!                      VectorStore (storage/)
//! ```

pub mod context;
pub mod embeddings;
pub mod executor;
pub mod filters;
pub mod hybrid;
pub mod query_parser;
pub mod request;

pub use context::ServiceContext;
pub use embeddings::{
    EmbeddingService, HashEmbedder, HashEmbeddingService, HttpEmbeddingClient, ImageInput,
    build_embedding_service, fuse_embeddings,
};
pub use executor::SearchExecutor;
pub use filters::{CompiledFilter, ExplicitFilters, FilterCompiler, FilterValue, is_sentinel};
pub use hybrid::{BoostWeights, EmbeddingColumn, HybridRanker, QueryVector, ScoredRecord};
pub use query_parser::{ParsedQuery, QueryParser};
pub use request::{
    BatchEntry, BatchItem, BatchResponse, ImageSearchRequest, SearchRequest, SearchResponse,
    TextSearchRequest, parse_batch,
};
