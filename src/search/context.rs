//! Shared service handles for search execution
//!
//! The embedding client and the catalog connection are expensive to build,
//! so they are created on first use and then shared. Each slot is guarded by
//! its own mutex; concurrent first callers build the handle exactly once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::{CatalogConfig, EmbeddingConfig};
use crate::error::Result;
use crate::search::embeddings::{EmbeddingService, build_embedding_service};
use crate::storage::{CatalogDb, VectorStore};

/// Lazily initialized embedding service and vector store.
pub struct ServiceContext {
    embedding_config: EmbeddingConfig,
    catalog_path: PathBuf,
    busy_timeout: Duration,
    embeddings: Mutex<Option<Arc<dyn EmbeddingService>>>,
    store: Mutex<Option<Arc<dyn VectorStore>>>,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("backend", &self.embedding_config.backend)
            .field("catalog_path", &self.catalog_path)
            .field("embeddings_ready", &self.embeddings.lock().is_some())
            .field("store_ready", &self.store.lock().is_some())
            .finish()
    }
}

impl ServiceContext {
    pub fn new(embedding: &EmbeddingConfig, catalog: &CatalogConfig, catalog_path: PathBuf) -> Self {
        Self {
            embedding_config: embedding.clone(),
            catalog_path,
            busy_timeout: Duration::from_millis(catalog.busy_timeout_ms),
            embeddings: Mutex::new(None),
            store: Mutex::new(None),
        }
    }

    /// Context with pre-built services; nothing is created lazily.
    pub fn with_services(
        embeddings: Arc<dyn EmbeddingService>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            embedding_config: EmbeddingConfig::default(),
            catalog_path: PathBuf::new(),
            busy_timeout: Duration::ZERO,
            embeddings: Mutex::new(Some(embeddings)),
            store: Mutex::new(Some(store)),
        }
    }

    /// The embedding service, built on first call.
    pub fn embeddings(&self) -> Result<Arc<dyn EmbeddingService>> {
        let mut slot = self.embeddings.lock();
        if let Some(service) = slot.as_ref() {
            return Ok(Arc::clone(service));
        }

        let service: Arc<dyn EmbeddingService> =
            Arc::from(build_embedding_service(&self.embedding_config)?);
        tracing::debug!(backend = %self.embedding_config.backend, "embedding service initialized");
        *slot = Some(Arc::clone(&service));
        Ok(service)
    }

    /// The vector store, opened on first call.
    pub fn store(&self) -> Result<Arc<dyn VectorStore>> {
        let mut slot = self.store.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn VectorStore> =
            Arc::new(CatalogDb::open(&self.catalog_path, self.busy_timeout)?);
        tracing::debug!(path = %self.catalog_path.display(), "catalog opened");
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }
}
