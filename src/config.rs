use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, vibe_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("VIBE_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(vibe_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let path = dirs::config_dir()
            .ok_or_else(|| VibeError::MissingConfig("config directory not found".to_string()))?
            .join("vibe/config.toml");
        Self::load_patch(&path)
    }

    fn load_project(vibe_root: &Path) -> Result<Option<ConfigPatch>> {
        let path = vibe_root.join("config.toml");
        Self::load_patch(&path)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| VibeError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| VibeError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.catalog {
            self.catalog.merge(patch);
        }
        if let Some(patch) = patch.embedding {
            self.embedding.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_string("VIBE_CATALOG_DB") {
            self.catalog.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = env_u64("VIBE_CATALOG_BUSY_TIMEOUT_MS")? {
            self.catalog.busy_timeout_ms = value;
        }

        if let Some(value) = env_string("VIBE_EMBEDDING_BACKEND") {
            self.embedding.backend = value;
        }
        if let Some(value) = env_string("VIBE_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = Some(value);
        }
        if let Some(value) = env_u32("VIBE_EMBEDDING_TEXT_DIMS")? {
            self.embedding.text_dims = value;
        }
        if let Some(value) = env_u32("VIBE_EMBEDDING_IMAGE_DIMS")? {
            self.embedding.image_dims = value;
        }
        if let Some(value) = env_u64("VIBE_EMBEDDING_TIMEOUT_MS")? {
            self.embedding.timeout_ms = value;
        }

        if let Some(value) = env_u32("VIBE_SEARCH_DEFAULT_LIMIT")? {
            self.search.default_limit = value;
        }
        if let Some(value) = env_u32("VIBE_SEARCH_MAX_LIMIT")? {
            self.search.max_limit = value;
        }
        if let Some(value) = env_u64("VIBE_SEARCH_REQUEST_TIMEOUT_MS")? {
            self.search.request_timeout_ms = value;
        }
        if let Some(value) = env_f32("VIBE_SEARCH_IMAGE_WEIGHT")? {
            self.search.default_image_weight = value;
        }
        if let Some(value) = env_u32("VIBE_SEARCH_BATCH_WORKERS")? {
            self.search.batch_workers = value;
        }
        if let Some(value) = env_bool("VIBE_SEARCH_INFER_PRICE_BOUNDS") {
            self.search.infer_price_bounds = value;
        }

        Ok(())
    }

    /// Reject values that would make every search fail or behave nonsensically.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.text_dims == 0 || self.embedding.image_dims == 0 {
            return Err(VibeError::Config(
                "embedding.text_dims and embedding.image_dims must be positive".to_string(),
            ));
        }
        match self.embedding.backend.as_str() {
            "hash" => {}
            "http" => {
                if self.embedding.endpoint.as_deref().is_none_or(str::is_empty) {
                    return Err(VibeError::MissingConfig("embedding.endpoint".to_string()));
                }
            }
            other => {
                return Err(VibeError::Config(format!(
                    "unknown embedding.backend {other} (expected hash|http)"
                )));
            }
        }
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(VibeError::Config(
                "search.default_limit and search.max_limit must be positive".to_string(),
            ));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(VibeError::Config(format!(
                "search.default_limit {} exceeds search.max_limit {}",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.search.batch_workers == 0 {
            return Err(VibeError::Config(
                "search.batch_workers must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.search.default_image_weight) {
            return Err(VibeError::Config(format!(
                "search.default_image_weight {} outside [0, 1]",
                self.search.default_image_weight
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog database file; `<vibe_root>/catalog.db` when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub busy_timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: 5000,
        }
    }
}

impl CatalogConfig {
    /// Effective catalog path under `vibe_root`.
    pub fn resolve_db_path(&self, vibe_root: &Path) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| vibe_root.join("catalog.db"))
    }

    fn merge(&mut self, patch: CatalogPatch) {
        if let Some(value) = patch.db_path {
            self.db_path = Some(value);
        }
        if let Some(value) = patch.busy_timeout_ms {
            self.busy_timeout_ms = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub text_dims: u32,
    #[serde(default)]
    pub image_dims: u32,
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            endpoint: None,
            text_dims: 384,
            image_dims: 512,
            timeout_ms: 10_000,
        }
    }
}

impl EmbeddingConfig {
    fn merge(&mut self, patch: EmbeddingPatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
        if let Some(value) = patch.endpoint {
            self.endpoint = Some(value);
        }
        if let Some(value) = patch.text_dims {
            self.text_dims = value;
        }
        if let Some(value) = patch.image_dims {
            self.image_dims = value;
        }
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_limit: u32,
    #[serde(default)]
    pub max_limit: u32,
    #[serde(default)]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub default_image_weight: f32,
    #[serde(default)]
    pub batch_workers: u32,
    /// Fall back to prices parsed from free text when the caller gave none.
    #[serde(default)]
    pub infer_price_bounds: bool,
    #[serde(default)]
    pub title_boost: f64,
    #[serde(default)]
    pub category_boost: f64,
    #[serde(default)]
    pub sub_category_boost: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            request_timeout_ms: 15_000,
            default_image_weight: 0.7,
            batch_workers: 4,
            infer_price_bounds: false,
            title_boost: 0.3,
            category_boost: 0.2,
            sub_category_boost: 0.1,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_limit {
            self.default_limit = value;
        }
        if let Some(value) = patch.max_limit {
            self.max_limit = value;
        }
        if let Some(value) = patch.request_timeout_ms {
            self.request_timeout_ms = value;
        }
        if let Some(value) = patch.default_image_weight {
            self.default_image_weight = value;
        }
        if let Some(value) = patch.batch_workers {
            self.batch_workers = value;
        }
        if let Some(value) = patch.infer_price_bounds {
            self.infer_price_bounds = value;
        }
        if let Some(value) = patch.title_boost {
            self.title_boost = value;
        }
        if let Some(value) = patch.category_boost {
            self.category_boost = value;
        }
        if let Some(value) = patch.sub_category_boost {
            self.sub_category_boost = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub catalog: Option<CatalogPatch>,
    pub embedding: Option<EmbeddingPatch>,
    pub search: Option<SearchPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogPatch {
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingPatch {
    pub backend: Option<String>,
    pub endpoint: Option<String>,
    pub text_dims: Option<u32>,
    pub image_dims: Option<u32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub default_limit: Option<u32>,
    pub max_limit: Option<u32>,
    pub request_timeout_ms: Option<u64>,
    pub default_image_weight: Option<f32>,
    pub batch_workers: Option<u32>,
    pub infer_price_bounds: Option<bool>,
    pub title_boost: Option<f64>,
    pub category_boost: Option<f64>,
    pub sub_category_boost: Option<f64>,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u32>().map(Some).map_err(|err| {
            VibeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            VibeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f32(key: &str) -> Result<Option<f32>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<f32>().map(Some).map_err(|err| {
            VibeError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}
