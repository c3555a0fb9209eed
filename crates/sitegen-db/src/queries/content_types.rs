//! Database query functions for the `content_types` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::models::{ContentTypeRow, ContentTypeSummary};

/// Parameters for registering a content type.
#[derive(Debug, Clone)]
pub struct NewContentType<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub singular_label: &'a str,
    pub description: &'a str,
    pub fields: &'a serde_json::Value,
    pub settings: &'a serde_json::Value,
}

/// Register a content type.
///
/// Returns `Ok(None)` when a type with the same name already exists; the
/// existing row is left untouched.
pub async fn insert_content_type(
    pool: &PgPool,
    new: &NewContentType<'_>,
) -> Result<Option<ContentTypeRow>> {
    let row = sqlx::query_as::<_, ContentTypeRow>(
        "INSERT INTO content_types (name, label, singular_label, description, fields, settings) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (name) DO NOTHING \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.label)
    .bind(new.singular_label)
    .bind(new.description)
    .bind(Json(new.fields))
    .bind(Json(new.settings))
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to insert content type {:?}", new.name))?;

    Ok(row)
}

/// Fetch a content type by name.
pub async fn get_content_type(pool: &PgPool, name: &str) -> Result<Option<ContentTypeRow>> {
    let row = sqlx::query_as::<_, ContentTypeRow>("SELECT * FROM content_types WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("failed to fetch content type")?;

    Ok(row)
}

/// Whether a content type with this name is registered.
pub async fn content_type_exists(pool: &PgPool, name: &str) -> Result<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM content_types WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await
            .context("failed to check content type existence")?;

    Ok(exists)
}

/// List all content types, built-ins first, then by name.
pub async fn list_content_types(pool: &PgPool) -> Result<Vec<ContentTypeRow>> {
    let rows = sqlx::query_as::<_, ContentTypeRow>(
        "SELECT * FROM content_types ORDER BY builtin DESC, name",
    )
    .fetch_all(pool)
    .await
    .context("failed to list content types")?;

    Ok(rows)
}

/// Every content type with its draft and published record counts, built-ins
/// first. Types without records report zeros.
pub async fn summarize_content_types(pool: &PgPool) -> Result<Vec<ContentTypeSummary>> {
    let rows = sqlx::query_as::<_, ContentTypeSummary>(
        "SELECT t.name, t.builtin, \
                COALESCE(jsonb_array_length(CASE WHEN jsonb_typeof(t.fields) = 'array' \
                                                 THEN t.fields END), 0)::int4 AS field_count, \
                COUNT(r.id) FILTER (WHERE r.status = 'draft') AS drafts, \
                COUNT(r.id) FILTER (WHERE r.status = 'publish') AS published \
         FROM content_types t \
         LEFT JOIN content_records r ON r.content_type = t.name \
         GROUP BY t.name, t.builtin, t.fields \
         ORDER BY t.builtin DESC, t.name",
    )
    .fetch_all(pool)
    .await
    .context("failed to summarize content types")?;

    Ok(rows)
}
