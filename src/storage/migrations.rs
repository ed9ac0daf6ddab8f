//! Database migrations

use rusqlite::Connection;

use crate::error::{Result, VibeError};

const MIGRATIONS: [&str; 2] = [
    include_str!("../../migrations/001_initial_schema.sql"),
    include_str!("../../migrations/002_add_embedding_dims.sql"),
];

pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Run all pending migrations, tracked through `PRAGMA user_version`.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(|err| VibeError::StoreUnavailable(format!("read schema version: {err}")))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let target_version = (idx + 1) as u32;
        if current_version >= target_version {
            continue;
        }

        conn.execute_batch(sql).map_err(|err| {
            VibeError::StoreUnavailable(format!("migration {target_version} failed: {err}"))
        })?;
        conn.pragma_update(None, "user_version", target_version)
            .map_err(|err| {
                VibeError::StoreUnavailable(format!(
                    "failed to set user_version {target_version}: {err}"
                ))
            })?;
    }

    Ok(SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_user_version(conn: &Connection) -> u32 {
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap()
    }

    fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .map(|name| name.unwrap())
            .collect()
    }

    #[test]
    fn schema_version_matches_migrations_count() {
        assert_eq!(SCHEMA_VERSION, MIGRATIONS.len() as u32);
    }

    #[test]
    fn migrations_are_not_empty() {
        for (idx, sql) in MIGRATIONS.iter().enumerate() {
            assert!(!sql.trim().is_empty(), "Migration {} is empty", idx + 1);
        }
    }

    #[test]
    fn run_migrations_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_user_version(&conn), 0);

        let result = run_migrations(&conn).unwrap();
        assert_eq!(result, SCHEMA_VERSION);
        assert_eq!(get_user_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        for _ in 0..3 {
            assert_eq!(run_migrations(&conn).unwrap(), SCHEMA_VERSION);
        }
        assert_eq!(get_user_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn run_migrations_creates_products_columns() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let columns = column_names(&conn, "products");
        for expected in [
            "product_id",
            "title",
            "category",
            "sub_category",
            "brand_name",
            "gender",
            "lowest_price",
            "extracted_colors",
            "is_active",
            "image_embedding",
            "text_embedding",
            "image_dims",
            "text_dims",
        ] {
            assert!(
                columns.iter().any(|c| c == expected),
                "missing column {expected}"
            );
        }
    }

    #[test]
    fn run_migrations_resumes_from_partial_version() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(MIGRATIONS[0]).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();

        run_migrations(&conn).unwrap();
        assert!(column_names(&conn, "products").iter().any(|c| c == "text_dims"));
    }
}
