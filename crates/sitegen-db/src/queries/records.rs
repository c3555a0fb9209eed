//! Database query functions for the `content_records` table.

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{ContentRecord, ContentStatus};

/// Upper bound on `-N` suffixes tried before giving up on a slug.
const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Parameters for inserting a new content record.
#[derive(Debug, Clone)]
pub struct NewRecordRow<'a> {
    pub content_type: &'a str,
    pub title: &'a str,
    /// Preferred slug. A `-2`, `-3`, ... suffix is appended when another
    /// record of the same content type already uses it.
    pub slug: &'a str,
    pub parent_id: Option<Uuid>,
    pub excerpt: Option<&'a str>,
    pub body: Option<&'a str>,
    pub status: ContentStatus,
}

/// Candidate slug for the given attempt (1-based).
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_owned()
    } else {
        format!("{base}-{attempt}")
    }
}

/// Insert a content record, resolving slug collisions within its content
/// type. Returns the inserted row.
pub async fn insert_record(pool: &PgPool, new: &NewRecordRow<'_>) -> Result<ContentRecord> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = slug_candidate(new.slug, attempt);
        let inserted = sqlx::query_as::<_, ContentRecord>(
            "INSERT INTO content_records \
             (content_type, title, slug, parent_id, excerpt, body, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (content_type, slug) DO NOTHING \
             RETURNING *",
        )
        .bind(new.content_type)
        .bind(new.title)
        .bind(&slug)
        .bind(new.parent_id)
        .bind(new.excerpt)
        .bind(new.body)
        .bind(new.status)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to insert {} record {:?}", new.content_type, new.title))?;

        if let Some(record) = inserted {
            return Ok(record);
        }
    }

    bail!(
        "no free slug for {:?} in content type {} after {MAX_SLUG_ATTEMPTS} attempts",
        new.slug,
        new.content_type
    )
}

/// Fetch a record by its ID.
pub async fn get_record(pool: &PgPool, id: Uuid) -> Result<Option<ContentRecord>> {
    let record = sqlx::query_as::<_, ContentRecord>("SELECT * FROM content_records WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch content record")?;

    Ok(record)
}

/// List records, optionally restricted to one content type, oldest first.
pub async fn list_records(pool: &PgPool, content_type: Option<&str>) -> Result<Vec<ContentRecord>> {
    let records = sqlx::query_as::<_, ContentRecord>(
        "SELECT * FROM content_records \
         WHERE ($1::text IS NULL OR content_type = $1) \
         ORDER BY created_at, title",
    )
    .bind(content_type)
    .fetch_all(pool)
    .await
    .context("failed to list content records")?;

    Ok(records)
}

/// List the direct children of a record, oldest first.
pub async fn list_children(pool: &PgPool, parent_id: Uuid) -> Result<Vec<ContentRecord>> {
    let records = sqlx::query_as::<_, ContentRecord>(
        "SELECT * FROM content_records WHERE parent_id = $1 ORDER BY created_at, title",
    )
    .bind(parent_id)
    .fetch_all(pool)
    .await
    .context("failed to list child records")?;

    Ok(records)
}

/// Delete a record. Returns `false` when no row matched.
pub async fn delete_record(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_records WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete content record")?;

    Ok(result.rows_affected() > 0)
}
