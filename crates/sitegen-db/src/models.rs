use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Publication status of a content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Publish,
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Publish => "publish",
        };
        f.write_str(s)
    }
}

impl FromStr for ContentStatus {
    type Err = ContentStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "publish" => Ok(Self::Publish),
            other => Err(ContentStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ContentStatus`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid content status: {0:?}")]
pub struct ContentStatusParseError(pub String);

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A registered content type (built-in `page`/`post` or a custom post type).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentTypeRow {
    pub name: String,
    pub label: String,
    pub singular_label: String,
    pub description: String,
    /// Field schema as stored JSON (an array of field definitions).
    pub fields: Json<serde_json::Value>,
    /// Registration flags (public, hierarchical, supports, ...).
    pub settings: Json<serde_json::Value>,
    pub builtin: bool,
    pub created_at: DateTime<Utc>,
}

/// A content record: a page or an entry of a custom post type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentRecord {
    pub id: Uuid,
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
}

/// Record counts for one content type, split by status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ContentTypeSummary {
    pub name: String,
    pub builtin: bool,
    pub field_count: i32,
    pub drafts: i64,
    pub published: i64,
}

impl ContentTypeSummary {
    pub fn total(&self) -> i64 {
        self.drafts + self.published
    }
}

/// A single metadata key/value attached to a record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecordMeta {
    pub record_id: Uuid,
    pub meta_key: String,
    pub meta_value: String,
}
