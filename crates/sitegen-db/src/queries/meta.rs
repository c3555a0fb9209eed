//! Database query functions for the `record_meta` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RecordMeta;

/// Set a metadata value on a record, replacing any previous value for the key.
pub async fn upsert_meta(pool: &PgPool, record_id: Uuid, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO record_meta (record_id, meta_key, meta_value) VALUES ($1, $2, $3) \
         ON CONFLICT (record_id, meta_key) DO UPDATE SET meta_value = EXCLUDED.meta_value",
    )
    .bind(record_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await
    .with_context(|| format!("failed to set meta {key:?} on record {record_id}"))?;

    Ok(())
}

/// All metadata for a record, ordered by key.
pub async fn get_meta_for_record(pool: &PgPool, record_id: Uuid) -> Result<Vec<RecordMeta>> {
    let rows = sqlx::query_as::<_, RecordMeta>(
        "SELECT * FROM record_meta WHERE record_id = $1 ORDER BY meta_key",
    )
    .bind(record_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch record meta")?;

    Ok(rows)
}
