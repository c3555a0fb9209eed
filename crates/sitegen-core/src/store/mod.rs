//! Content store interface.
//!
//! The materializer only talks to a [`ContentStore`]. Two implementations
//! ship with the crate: [`MemoryStore`] (dry runs, tests) and
//! [`PgContentStore`] (PostgreSQL via `sitegen-db`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

pub use sitegen_db::models::ContentStatus;

use crate::plan::types::FieldSpec;

pub use memory::MemoryStore;
pub use postgres::PgContentStore;

/// Errors returned by a [`ContentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("content type {0:?} is already registered")]
    DuplicateType(String),

    #[error("invalid content type name {0:?}")]
    InvalidTypeName(String),

    #[error("unknown content type {0:?}")]
    UnknownType(String),

    #[error("record {0} not found")]
    NotFound(Uuid),

    #[error("store rejected the write: {0}")]
    Rejected(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// A record to create. The slug is a preference; the store makes it unique
/// within the content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub status: ContentStatus,
}

impl NewRecord {
    /// A draft record with no parent, excerpt, or body.
    pub fn draft(
        content_type: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            title: title.into(),
            slug: slug.into(),
            parent_id: None,
            excerpt: None,
            body: None,
            status: ContentStatus::Draft,
        }
    }
}

/// Editor features enabled on every registered custom post type.
pub const DEFAULT_SUPPORTS: &[&str] = &["title", "editor", "thumbnail", "excerpt", "custom-fields"];

/// Registration of a custom post type.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeSpec {
    pub name: String,
    pub label: String,
    pub singular_label: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
    pub public: bool,
    pub hierarchical: bool,
    pub has_archive: bool,
    pub supports: Vec<String>,
}

impl ContentTypeSpec {
    /// Public, non-hierarchical, archived type with the default editor
    /// features. A blank label falls back to the machine name.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Self {
        let name = name.into();
        let mut label = label.into().trim().to_string();
        if label.is_empty() {
            label = name.clone();
        }
        Self {
            singular_label: singularize(&label),
            name,
            label,
            description: description.into(),
            fields,
            public: true,
            hierarchical: false,
            has_archive: true,
            supports: DEFAULT_SUPPORTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Field schema as stored JSON.
    pub fn fields_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// Registration flags as stored JSON.
    pub fn settings_json(&self) -> Value {
        json!({
            "public": self.public,
            "hierarchical": self.hierarchical,
            "has_archive": self.has_archive,
            "supports": self.supports,
        })
    }
}

/// Best-effort English singular of a plural label ("Services" -> "Service",
/// "Galleries" -> "Gallery"). Labels that don't look plural are unchanged.
fn singularize(label: &str) -> String {
    if let Some(stem) = label.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = label.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if label.ends_with("ss") || label.ends_with("us") {
        return label.to_string();
    }
    match label.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => label.to_string(),
    }
}

/// Persistence interface driven by the materializer.
///
/// Object-safe so the materializer and hooks can take `&dyn ContentStore`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Create a record and return its ID. The stored slug may carry a
    /// numeric suffix when the requested one is taken.
    async fn create_record(&self, record: NewRecord) -> Result<Uuid, StoreError>;

    /// Register a new content type. Fails with
    /// [`StoreError::DuplicateType`] when the name is taken.
    async fn register_content_type(&self, spec: &ContentTypeSpec) -> Result<(), StoreError>;

    async fn content_type_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Set a metadata value on a record, replacing any previous value.
    async fn attach_metadata(&self, record_id: Uuid, key: &str, value: &str)
    -> Result<(), StoreError>;

    async fn delete_record(&self, record_id: Uuid) -> Result<(), StoreError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ContentStore) {}
};
