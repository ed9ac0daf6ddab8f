//! Embedding services
//!
//! Two vector spaces are in play: the text encoder's space (compared against
//! `text_embedding`) and the image model's space (compared against
//! `image_embedding`). A text hint fused with an image must be encoded into
//! the image space, which is what `cross_modal_text_embedding` does.
//!
//! Backends:
//! - `hash`: FNV-1a hash embeddings, deterministic and offline.
//! - `http`: remote encoder service over JSON.

use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{Result, VibeError};

/// Image supplied with a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    Url(String),
    Bytes(Vec<u8>),
}

impl ImageInput {
    /// Short description for logs; never includes image bytes.
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => format!("url:{url}"),
            Self::Bytes(bytes) => format!("bytes:{}", bytes.len()),
        }
    }
}

/// Encoder interface used by the executor.
///
/// Each call receives the remaining request budget as `timeout`.
pub trait EmbeddingService: Send + Sync {
    /// Text in the text encoder's space.
    fn text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>>;

    /// Image in the image model's space.
    fn image_embedding(&self, image: &ImageInput, timeout: Duration) -> Result<Vec<f32>>;

    /// Text in the image model's space, for fusion with an image vector.
    fn cross_modal_text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>>;
}

/// Build the configured embedding backend.
pub fn build_embedding_service(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingService>> {
    let backend = config.backend.trim().to_lowercase();
    if config.text_dims == 0 || config.image_dims == 0 {
        return Err(VibeError::Config(
            "embedding.text_dims and embedding.image_dims must be greater than 0".to_string(),
        ));
    }

    match backend.as_str() {
        "" | "hash" => Ok(Box::new(HashEmbeddingService::new(
            config.text_dims as usize,
            config.image_dims as usize,
        ))),
        "http" => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                VibeError::MissingConfig("embedding.endpoint".to_string())
            })?;
            Ok(Box::new(HttpEmbeddingClient::new(endpoint, config)?))
        }
        other => Err(VibeError::Config(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

/// Fuse an image vector with a text vector from the same space.
///
/// `normalize(w * image + (1 - w) * text)`. If the weighted sum has zero
/// norm the image vector is returned unchanged.
pub fn fuse_embeddings(image: &[f32], text: &[f32], image_weight: f32) -> Result<Vec<f32>> {
    if image.len() != text.len() {
        return Err(VibeError::EmbeddingDimension {
            expected: image.len(),
            actual: text.len(),
        });
    }

    let text_weight = 1.0 - image_weight;
    let mut fused: Vec<f32> = image
        .iter()
        .zip(text)
        .map(|(i, t)| image_weight * i + text_weight * t)
        .collect();

    if l2_normalize(&mut fused) {
        Ok(fused)
    } else {
        tracing::debug!("fused embedding has zero norm, using image embedding");
        Ok(image.to_vec())
    }
}

// =============================================================================
// Hash backend
// =============================================================================

/// Hash embedder using FNV-1a
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Embed text into an L2-normalized vector (all zeros if no tokens survive).
    pub fn embed(&self, text: &str) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }

        let tokens = tokenize(text);
        let mut embedding = vec![0.0; self.dim];

        if tokens.is_empty() {
            return embedding;
        }

        for token in &tokens {
            accumulate_embedding(&mut embedding, token.as_bytes(), 1.0);
        }

        for window in tokens.windows(2) {
            let bigram = format!("{} {}", window[0], window[1]);
            accumulate_embedding(&mut embedding, bigram.as_bytes(), 0.5);
        }

        l2_normalize(&mut embedding);
        embedding
    }

    /// Embed raw bytes by hashing fixed-size shingles.
    pub fn embed_bytes(&self, bytes: &[u8]) -> Vec<f32> {
        if self.dim == 0 {
            return Vec::new();
        }

        let mut embedding = vec![0.0; self.dim];
        for chunk in bytes.chunks(BYTE_SHINGLE) {
            accumulate_embedding(&mut embedding, chunk, 1.0);
        }
        l2_normalize(&mut embedding);
        embedding
    }
}

const BYTE_SHINGLE: usize = 16;

/// Offline backend: text uses `text_dims`, images and cross-modal text use
/// `image_dims`.
///
/// Image URLs are embedded from their path tokens, so a URL such as
/// `.../black-sneaker.jpg` lands near the text "black sneaker" in the image
/// space.
#[derive(Debug, Clone)]
pub struct HashEmbeddingService {
    text: HashEmbedder,
    image: HashEmbedder,
}

impl HashEmbeddingService {
    pub const fn new(text_dims: usize, image_dims: usize) -> Self {
        Self {
            text: HashEmbedder::new(text_dims),
            image: HashEmbedder::new(image_dims),
        }
    }
}

impl EmbeddingService for HashEmbeddingService {
    fn text_embedding(&self, text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        Ok(self.text.embed(text))
    }

    fn image_embedding(&self, image: &ImageInput, _timeout: Duration) -> Result<Vec<f32>> {
        Ok(match image {
            ImageInput::Url(url) => self.image.embed(url),
            ImageInput::Bytes(bytes) => self.image.embed_bytes(bytes),
        })
    }

    fn cross_modal_text_embedding(&self, text: &str, _timeout: Duration) -> Result<Vec<f32>> {
        Ok(self.image.embed(text))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2)
        .map(str::to_string)
        .collect()
}

fn accumulate_embedding(embedding: &mut [f32], token: &[u8], weight: f32) {
    let token_hash = fnv1a_hash(token);

    for i in 0..embedding.len() {
        // FNV-1a low bits are weak; sign and slot come from the mixed high half.
        let dim_hash = mix64(fnv1a_hash_with_salt(token_hash, i as u64));
        let sign = if dim_hash >> 63 == 0 { weight } else { -weight };
        let dim = ((dim_hash >> 32) as usize) % embedding.len();
        embedding[dim] += sign;
    }
}

/// SplitMix64 finalizer.
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

fn fnv1a_hash_with_salt(seed: u64, salt: u64) -> u64 {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes[8..].copy_from_slice(&salt.to_le_bytes());
    fnv1a_hash(&bytes)
}

fn fnv1a_hash(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Normalize in place; returns false for a zero vector.
fn l2_normalize(vec: &mut [f32]) -> bool {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in vec.iter_mut() {
            *value /= norm;
        }
        true
    } else {
        false
    }
}

// =============================================================================
// HTTP backend
// =============================================================================

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ImagePayload<'a> {
    Url { image_url: &'a str },
    Base64 { image_base64: String },
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client for a remote encoder service.
pub struct HttpEmbeddingClient {
    endpoint: String,
    client: reqwest::blocking::Client,
    text_dims: usize,
    image_dims: usize,
}

impl std::fmt::Debug for HttpEmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingClient")
            .field("endpoint", &self.endpoint)
            .field("text_dims", &self.text_dims)
            .field("image_dims", &self.image_dims)
            .finish_non_exhaustive()
    }
}

impl HttpEmbeddingClient {
    pub fn new(endpoint: &str, config: &EmbeddingConfig) -> Result<Self> {
        if endpoint.starts_with("http://") {
            tracing::debug!(endpoint, "embedding endpoint uses unencrypted HTTP");
        }

        let timeout = Duration::from_millis(config.timeout_ms.max(1));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| VibeError::Config(format!("embedding http client: {err}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            text_dims: config.text_dims as usize,
            image_dims: config.image_dims as usize,
        })
    }

    fn post<T: Serialize>(
        &self,
        route: &str,
        payload: &T,
        expected_dims: usize,
        timeout: Duration,
    ) -> Result<Vec<f32>> {
        let url = format!("{}/{route}", self.endpoint);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(payload)
            .send()
            .map_err(|err| transport_error(route, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VibeError::EmbeddingUnavailable(format!(
                "{route} returned HTTP {status}"
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .map_err(|err| transport_error(route, &err))?;

        if body.embedding.len() != expected_dims {
            return Err(VibeError::EmbeddingDimension {
                expected: expected_dims,
                actual: body.embedding.len(),
            });
        }
        Ok(body.embedding)
    }
}

fn transport_error(route: &str, err: &reqwest::Error) -> VibeError {
    if err.is_timeout() {
        VibeError::Timeout(format!("embedding request {route} timed out"))
    } else {
        VibeError::EmbeddingUnavailable(format!("{route}: {err}"))
    }
}

impl EmbeddingService for HttpEmbeddingClient {
    fn text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        self.post("embed/text", &TextPayload { text }, self.text_dims, timeout)
    }

    fn image_embedding(&self, image: &ImageInput, timeout: Duration) -> Result<Vec<f32>> {
        let payload = match image {
            ImageInput::Url(url) => ImagePayload::Url { image_url: url },
            ImageInput::Bytes(bytes) => ImagePayload::Base64 {
                image_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        };
        self.post("embed/image", &payload, self.image_dims, timeout)
    }

    fn cross_modal_text_embedding(&self, text: &str, timeout: Duration) -> Result<Vec<f32>> {
        self.post("embed/clip-text", &TextPayload { text }, self.image_dims, timeout)
    }
}
