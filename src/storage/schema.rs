//! Database schema definitions.

use sqlx::SqlitePool;

use crate::storage::StoreError;

/// SQL statement for creating the samples table.
///
/// `AUTOINCREMENT` keeps `sequence_id` strictly increasing and never reused.
/// `observed_at` is Unix microseconds (UTC).
pub const SAMPLES_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS samples (
    sequence_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    block_height      INTEGER CHECK (block_height IS NULL OR block_height >= 0),
    network_hash_rate REAL    CHECK (network_hash_rate IS NULL OR network_hash_rate >= 0),
    difficulty        REAL    CHECK (difficulty IS NULL OR difficulty >= 0),
    mempool_size      INTEGER CHECK (mempool_size IS NULL OR mempool_size >= 0),
    observed_at       INTEGER NOT NULL
);
"#;

/// Initialize the database schema.
///
/// Idempotent: safe to run against an already-initialized database, existing
/// rows are untouched.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(SAMPLES_TABLE_DDL).execute(pool).await?;

    tracing::info!("Database schema initialized");
    Ok(())
}
