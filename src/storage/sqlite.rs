//! SQLite catalog store

use std::path::Path;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use half::f16;
use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Row, params, params_from_iter};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeError};
use crate::storage::{CandidateQuery, CandidateRow, VectorStore, migrations};

/// SQL name of the cosine distance function registered on every connection.
///
/// Arguments: a stored f16 blob and an f32 query blob.
pub const COSINE_DISTANCE_FN: &str = "vibe_cosine_distance";

/// SQL name of the Unicode-aware `lower()`; SQLite's built-in only folds ASCII.
pub const LOWER_FN: &str = "vibe_lower";

/// SQLite-backed product catalog.
///
/// A single connection is shared behind a mutex; SQLite serializes writers
/// anyway and reads are short.
pub struct CatalogDb {
    conn: Mutex<Connection>,
    schema_version: u32,
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb")
            .field("schema_version", &self.schema_version)
            .finish_non_exhaustive()
    }
}

/// A product as written to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub lowest_price: Option<f64>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub pdp_url: Option<String>,
    #[serde(default)]
    pub extracted_colors: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub image_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub text_embedding: Option<Vec<f32>>,
}

const fn default_active() -> bool {
    true
}

/// Catalog size and embedding coverage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: u64,
    pub active: u64,
    pub with_image_embedding: u64,
    pub with_text_embedding: u64,
    /// Distinct stored image vector sizes.
    pub image_dims: Vec<u32>,
    /// Distinct stored text vector sizes.
    pub text_dims: Vec<u32>,
}

impl CatalogDb {
    /// Open (and migrate) the catalog at the given path
    ///
    /// Any setup failure (directory, open, pragmas, migrations) means the
    /// catalog is unusable and is reported as [`VibeError::StoreUnavailable`].
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        Self::open_inner(path, busy_timeout).map_err(|err| match err {
            VibeError::StoreUnavailable(_) => err,
            other => VibeError::StoreUnavailable(format!("open {}: {other}", path.display())),
        })
    }

    fn open_inner(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::configure_pragmas(&conn)?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory catalog, used by tests and benches.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| VibeError::StoreUnavailable(format!("open in-memory catalog: {err}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;
        tracing::debug!(schema_version, "catalog ready");
        Ok(Self {
            conn: Mutex::new(conn),
            schema_version,
        })
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Insert a product, or replace every field of the one with the same `product_id`.
    pub fn upsert_product(&self, product: &ProductRecord) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        let colors = serde_json::to_string(&product.extracted_colors)?;
        let image_blob = product.image_embedding.as_deref().map(encode_embedding_f16);
        let text_blob = product.text_embedding.as_deref().map(encode_embedding_f16);
        let image_dims = product.image_embedding.as_ref().map(|v| v.len() as i64);
        let text_dims = product.text_embedding.as_ref().map(|v| v.len() as i64);

        let conn = self.conn.lock();
        let id = conn.query_row(
            "INSERT INTO products (product_id, title, category, sub_category, brand_name, gender, \
             lowest_price, featured_image, pdp_url, extracted_colors, is_active, \
             image_embedding, text_embedding, image_dims, text_dims, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16) \
             ON CONFLICT(product_id) DO UPDATE SET \
             title = excluded.title, category = excluded.category, \
             sub_category = excluded.sub_category, brand_name = excluded.brand_name, \
             gender = excluded.gender, lowest_price = excluded.lowest_price, \
             featured_image = excluded.featured_image, pdp_url = excluded.pdp_url, \
             extracted_colors = excluded.extracted_colors, is_active = excluded.is_active, \
             image_embedding = excluded.image_embedding, text_embedding = excluded.text_embedding, \
             image_dims = excluded.image_dims, text_dims = excluded.text_dims, \
             updated_at = excluded.updated_at \
             RETURNING id",
            params![
                product.product_id,
                product.title,
                product.category,
                product.sub_category,
                product.brand_name,
                product.gender,
                product.lowest_price,
                product.featured_image,
                product.pdp_url,
                colors,
                product.is_active,
                image_blob,
                text_blob,
                image_dims,
                text_dims,
                now,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Mark a product active or inactive. Returns false if it does not exist.
    pub fn set_active(&self, product_id: &str, active: bool) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = self.conn.lock().execute(
            "UPDATE products SET is_active = ?, updated_at = ? WHERE product_id = ?",
            params![active, now, product_id],
        )?;
        Ok(changed > 0)
    }

    pub fn count_products(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT count(*) FROM products", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        let conn = self.conn.lock();
        let (total, active, with_image, with_text): (i64, i64, i64, i64) = conn.query_row(
            "SELECT count(*), \
             coalesce(sum(is_active = 1), 0), \
             coalesce(sum(image_embedding IS NOT NULL), 0), \
             coalesce(sum(text_embedding IS NOT NULL), 0) \
             FROM products",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(CatalogStats {
            total: total.max(0) as u64,
            active: active.max(0) as u64,
            with_image_embedding: with_image.max(0) as u64,
            with_text_embedding: with_text.max(0) as u64,
            image_dims: distinct_dims(&conn, "image_dims")?,
            text_dims: distinct_dims(&conn, "text_dims")?,
        })
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA mmap_size = 268435456;
             PRAGMA temp_store = MEMORY;",
        )?;
        Ok(())
    }
}

impl VectorStore for CatalogDb {
    fn fetch_candidates(&self, query: &CandidateQuery, timeout: Duration) -> Result<Vec<CandidateRow>> {
        let Some(conn) = self.conn.try_lock_for(timeout) else {
            return Err(VibeError::Timeout(format!(
                "catalog connection busy for {}ms",
                timeout.as_millis()
            )));
        };

        // The watchdog interrupts the statement if it outlives the budget.
        let interrupt = conn.get_interrupt_handle();
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);
        let watchdog = std::thread::spawn(move || {
            let expired = matches!(done_rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout));
            if expired {
                interrupt.interrupt();
            }
            expired
        });

        let result = run_candidate_query(&conn, query);
        let _ = done_tx.send(());
        let expired = watchdog.join().unwrap_or(false);

        result.map_err(|err| {
            if expired || is_interrupt(&err) {
                VibeError::Timeout(format!(
                    "candidate query exceeded {}ms",
                    timeout.as_millis()
                ))
            } else {
                tracing::debug!(error = %err, predicate = %query.predicate, "candidate query failed");
                VibeError::StoreQueryFailed {
                    detail: err.to_string(),
                    predicate: query.predicate.clone(),
                }
            }
        })
    }
}

fn run_candidate_query(conn: &Connection, query: &CandidateQuery) -> rusqlite::Result<Vec<CandidateRow>> {
    let mut stmt = conn.prepare(&query.sql)?;
    let rows = stmt.query_map(params_from_iter(query.params.iter()), candidate_from_row)?;
    rows.collect()
}

fn candidate_from_row(row: &Row<'_>) -> rusqlite::Result<CandidateRow> {
    Ok(CandidateRow {
        id: row.get(0)?,
        product_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        sub_category: row.get(4)?,
        brand_name: row.get(5)?,
        featured_image: row.get(6)?,
        lowest_price: row.get(7)?,
        pdp_url: row.get(8)?,
        distance: row.get(9)?,
        keyword_boost: row.get(10)?,
    })
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::OperationInterrupted
    )
}

fn distinct_dims(conn: &Connection, column: &str) -> Result<Vec<u32>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {column} FROM products WHERE {column} IS NOT NULL ORDER BY {column}"
    ))?;
    let dims = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(dims
        .into_iter()
        .filter_map(|d| u32::try_from(d).ok())
        .collect())
}

fn register_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(COSINE_DISTANCE_FN, 2, flags, |ctx| {
        let stored = ctx.get::<Option<Vec<u8>>>(0)?;
        let query = ctx.get::<Option<Vec<u8>>>(1)?;
        let (Some(stored), Some(query)) = (stored, query) else {
            return Ok(None);
        };
        blob_cosine_distance(&stored, &query)
            .map(Some)
            .map_err(|msg| rusqlite::Error::UserFunctionError(msg.into()))
    })?;

    conn.create_scalar_function(LOWER_FN, 1, flags, |ctx| {
        let text = ctx.get::<Option<String>>(0)?;
        Ok(text.map(|text| text.to_lowercase()))
    })?;
    Ok(())
}

/// Cosine distance between a stored f16 blob and an f32 query blob.
/// Vectors of different size never compare.
fn blob_cosine_distance(stored: &[u8], query: &[u8]) -> std::result::Result<f64, String> {
    let dims = stored.len() / 2;
    if stored.len() % 2 != 0 || query.len() != dims * 4 {
        return Err(format!(
            "{COSINE_DISTANCE_FN}: dimension mismatch (stored {} bytes of f16, query {} bytes of f32)",
            stored.len(),
            query.len()
        ));
    }
    let stored = decode_embedding_f16(stored, dims).map_err(|err| err.to_string())?;
    let query = decode_embedding_f32(query, dims).map_err(|err| err.to_string())?;
    Ok(cosine_distance(&stored, &query))
}

/// `1 - cos(a, b)`; a zero vector is 1.0 (no information), not an error.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Query vectors are bound at full precision; only stored vectors are f16.
pub fn encode_embedding_f32(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

fn decode_embedding_f32(bytes: &[u8], dims: usize) -> Result<Vec<f32>> {
    if bytes.len() != dims.saturating_mul(4) {
        return Err(VibeError::Serialization(format!(
            "query blob length mismatch: expected {}, got {}",
            dims.saturating_mul(4),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

pub fn encode_embedding_f16(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for value in values {
        let bits = f16::from_f32(*value).to_bits();
        out.extend_from_slice(&bits.to_le_bytes());
    }
    out
}

pub fn decode_embedding_f16(bytes: &[u8], dims: usize) -> Result<Vec<f32>> {
    let expected = dims.saturating_mul(2);
    if bytes.len() != expected {
        return Err(VibeError::Serialization(format!(
            "embedding blob length mismatch: expected {}, got {}",
            expected,
            bytes.len()
        )));
    }

    let mut out = Vec::with_capacity(dims);
    for chunk in bytes.chunks_exact(2) {
        let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(f16::from_bits(bits).to_f32());
    }
    Ok(out)
}
