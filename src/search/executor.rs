//! Search orchestration
//!
//! One request runs: validate → embed → parse → compile → rank. Validation
//! happens before any service is touched, so a bad `image_weight` never
//! costs an embedding call. Blocking steps share one request deadline.

use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::config::SearchConfig;
use crate::error::{Result, VibeError};
use crate::search::context::ServiceContext;
use crate::search::embeddings::fuse_embeddings;
use crate::search::filters::FilterCompiler;
use crate::search::hybrid::{EmbeddingColumn, HybridRanker, QueryVector};
use crate::search::query_parser::QueryParser;
use crate::search::request::{BatchEntry, BatchItem, BatchResponse, SearchRequest, SearchResponse};

/// Runs search requests against a [`ServiceContext`].
#[derive(Debug, Clone)]
pub struct SearchExecutor {
    parser: QueryParser,
    compiler: FilterCompiler,
    ranker: HybridRanker,
    default_limit: u32,
    max_limit: u32,
    default_image_weight: f32,
    request_timeout: Duration,
    batch_workers: usize,
}

/// Validated knobs for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Plan {
    limit: u32,
    image_weight: f32,
}

/// Remaining time for one request.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    const fn new(started: Instant, budget: Duration) -> Self {
        Self { started, budget }
    }

    fn remaining(&self, stage: &str) -> Result<Duration> {
        let left = self.budget.saturating_sub(self.started.elapsed());
        if left.is_zero() {
            return Err(VibeError::Timeout(format!(
                "request budget of {}ms exhausted before {stage}",
                self.budget.as_millis()
            )));
        }
        Ok(left)
    }
}

impl SearchExecutor {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            parser: QueryParser::new(),
            compiler: FilterCompiler::new(config.infer_price_bounds),
            ranker: HybridRanker::from_config(config),
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            default_image_weight: config.default_image_weight,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            batch_workers: config.batch_workers.max(1) as usize,
        }
    }

    /// Run one request.
    pub fn execute(&self, services: &ServiceContext, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let plan = self.validate(request)?;
        let deadline = Deadline::new(started, self.request_timeout);
        let text = request.text_query();

        let embeddings = services.embeddings()?;
        let query_vector = match &request.image {
            Some(image) => {
                let image_vec = embeddings.image_embedding(image, deadline.remaining("image embedding")?)?;
                let values = match text {
                    Some(text) => {
                        let text_vec = embeddings
                            .cross_modal_text_embedding(text, deadline.remaining("text embedding")?)?;
                        fuse_embeddings(&image_vec, &text_vec, plan.image_weight)?
                    }
                    None => image_vec,
                };
                QueryVector::new(EmbeddingColumn::Image, values)
            }
            None => {
                let text = text.ok_or_else(|| {
                    VibeError::InvalidRequest("query text or image is required".to_string())
                })?;
                let values = embeddings.text_embedding(text, deadline.remaining("text embedding")?)?;
                QueryVector::new(EmbeddingColumn::Text, values)
            }
        };

        let parsed = self.parser.parse_optional(text);
        let filter = self.compiler.compile(&request.filters, &parsed);

        let store = services.store()?;
        let results = self.ranker.rank(
            store.as_ref(),
            &query_vector,
            &filter,
            &parsed.keywords,
            plan.limit,
            deadline.remaining("catalog query")?,
        )?;

        let response = SearchResponse::new(results, started.elapsed());
        tracing::info!(
            request = %request.describe(),
            column = query_vector.column.column_name(),
            predicate = %filter.describe(),
            total = response.total,
            query_time_ms = response.query_time_ms,
            "search complete"
        );
        Ok(response)
    }

    /// Run independent requests on a fixed-size worker pool.
    ///
    /// A failing item is logged and counted; it never fails the batch.
    pub fn execute_batch(
        &self,
        services: &ServiceContext,
        requests: Vec<SearchRequest>,
    ) -> Result<BatchResponse> {
        self.run_batch(services, requests.into_iter().map(Ok).collect())
    }

    /// Like [`Self::execute_batch`], for raw batch-file items. Items that do
    /// not convert into a request count as failures.
    pub fn execute_batch_items(
        &self,
        services: &ServiceContext,
        items: Vec<BatchItem>,
    ) -> Result<BatchResponse> {
        self.run_batch(services, items.into_iter().map(SearchRequest::try_from).collect())
    }

    fn run_batch(
        &self,
        services: &ServiceContext,
        requests: Vec<Result<SearchRequest>>,
    ) -> Result<BatchResponse> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.batch_workers)
            .thread_name(|idx| format!("vibe-batch-{idx}"))
            .build()
            .map_err(|err| VibeError::Config(format!("batch worker pool: {err}")))?;

        let outcomes: Vec<(usize, Result<SearchResponse>)> = pool.install(|| {
            requests
                .into_par_iter()
                .enumerate()
                .map(|(index, request)| {
                    let outcome = request.and_then(|request| self.execute(services, &request));
                    (index, outcome)
                })
                .collect()
        });

        let mut batch = BatchResponse::default();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(response) => batch.results.push(BatchEntry { index, response }),
                Err(err) => {
                    tracing::warn!(index, code = %err.code().code_string(), error = %err, "batch item failed");
                    batch.failed += 1;
                }
            }
        }

        tracing::info!(
            succeeded = batch.results.len(),
            failed = batch.failed,
            workers = self.batch_workers,
            "batch complete"
        );
        Ok(batch)
    }

    fn validate(&self, request: &SearchRequest) -> Result<Plan> {
        let image_weight = request.image_weight.unwrap_or(self.default_image_weight);
        if !(0.0..=1.0).contains(&image_weight) {
            return Err(VibeError::InvalidWeight(image_weight));
        }

        if request.image.is_none() && request.text_query().is_none() {
            return Err(VibeError::InvalidRequest(
                "query text or image is required".to_string(),
            ));
        }

        let limit = match request.limit {
            Some(0) => {
                return Err(VibeError::InvalidRequest(
                    "limit must be at least 1".to_string(),
                ));
            }
            Some(limit) => limit,
            None => self.default_limit,
        };

        Ok(Plan {
            limit: limit.min(self.max_limit),
            image_weight,
        })
    }
}
