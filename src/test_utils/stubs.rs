use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Result, VibeError};
use crate::search::embeddings::{EmbeddingService, ImageInput};
use crate::storage::{CandidateQuery, CandidateRow, VectorStore};

/// Embedding service returning fixed vectors and counting calls.
#[derive(Debug, Default)]
pub struct CountingEmbeddings {
    text: Vec<f32>,
    image: Vec<f32>,
    cross_modal: Option<Vec<f32>>,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    cross_modal_calls: AtomicUsize,
}

impl CountingEmbeddings {
    /// Cross-modal text embeddings default to the image vector.
    pub fn new(text: Vec<f32>, image: Vec<f32>) -> Self {
        Self {
            text,
            image,
            ..Self::default()
        }
    }

    pub fn with_cross_modal(mut self, vector: Vec<f32>) -> Self {
        self.cross_modal = Some(vector);
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn cross_modal_calls(&self) -> usize {
        self.cross_modal_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.text_calls() + self.image_calls() + self.cross_modal_calls()
    }
}

impl EmbeddingService for CountingEmbeddings {
    fn text_embedding(&self, _text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }

    fn image_embedding(&self, _image: &ImageInput, _timeout: Duration) -> Result<Vec<f32>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.image.clone())
    }

    fn cross_modal_text_embedding(&self, _text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        self.cross_modal_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cross_modal.clone().unwrap_or_else(|| self.image.clone()))
    }
}

/// Embedding service that is always down.
#[derive(Debug, Default)]
pub struct UnavailableEmbeddings;

impl EmbeddingService for UnavailableEmbeddings {
    fn text_embedding(&self, _text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        Err(VibeError::EmbeddingUnavailable("encoder offline".to_string()))
    }

    fn image_embedding(&self, _image: &ImageInput, _timeout: Duration) -> Result<Vec<f32>> {
        Err(VibeError::EmbeddingUnavailable("encoder offline".to_string()))
    }

    fn cross_modal_text_embedding(&self, _text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        Err(VibeError::EmbeddingUnavailable("encoder offline".to_string()))
    }
}

/// Embedding service that is down only for text containing a marker.
#[derive(Debug)]
pub struct FlakyEmbeddings {
    inner: CountingEmbeddings,
    marker: String,
}

impl FlakyEmbeddings {
    pub fn new(inner: CountingEmbeddings, marker: impl Into<String>) -> Self {
        Self {
            inner,
            marker: marker.into(),
        }
    }

    fn check(&self, text: &str) -> Result<()> {
        if text.contains(&self.marker) {
            return Err(VibeError::EmbeddingUnavailable(format!("encoder rejected {text:?}")));
        }
        Ok(())
    }
}

impl EmbeddingService for FlakyEmbeddings {
    fn text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        self.check(text)?;
        self.inner.text_embedding(text, timeout)
    }

    fn image_embedding(&self, image: &ImageInput, timeout: Duration) -> Result<Vec<f32>> {
        self.inner.image_embedding(image, timeout)
    }

    fn cross_modal_text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        self.check(text)?;
        self.inner.cross_modal_text_embedding(text, timeout)
    }
}

/// Store whose every query fails, reporting the predicate it was given.
#[derive(Debug, Default)]
pub struct FailingStore;

impl VectorStore for FailingStore {
    fn fetch_candidates(&self, query: &CandidateQuery, _timeout: Duration) -> Result<Vec<CandidateRow>> {
        Err(VibeError::StoreQueryFailed {
            detail: "connection reset".to_string(),
            predicate: query.predicate.clone(),
        })
    }
}
