//! Post-creation hooks run after each materialized page.
//!
//! Hooks are best-effort: the materializer logs a failing hook and moves on.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::settings::{self, ConfigProvider};
use crate::store::ContentStore;

/// Metadata key marking a record for the external image worker.
pub const IMAGE_REQUESTED_META: &str = "_sitegen_image_requested";
/// Metadata key holding the record's JSON-LD document.
pub const SCHEMA_MARKUP_META: &str = "_sitegen_schema_markup";

#[async_trait]
pub trait PostCreateHook: Send + Sync {
    fn name(&self) -> &str;

    async fn after_create(&self, store: &dyn ContentStore, record_id: Uuid, title: &str)
    -> Result<()>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PostCreateHook) {}
};

/// Flags the record so an image worker picks it up. Generation itself
/// happens out of process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRequestHook;

#[async_trait]
impl PostCreateHook for ImageRequestHook {
    fn name(&self) -> &str {
        "image-request"
    }

    async fn after_create(
        &self,
        store: &dyn ContentStore,
        record_id: Uuid,
        _title: &str,
    ) -> Result<()> {
        store
            .attach_metadata(record_id, IMAGE_REQUESTED_META, "1")
            .await
            .with_context(|| format!("failed to request image for record {record_id}"))
    }
}

/// Attaches a minimal schema.org `WebPage` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMarkupHook;

#[async_trait]
impl PostCreateHook for SchemaMarkupHook {
    fn name(&self) -> &str {
        "schema-markup"
    }

    async fn after_create(
        &self,
        store: &dyn ContentStore,
        record_id: Uuid,
        title: &str,
    ) -> Result<()> {
        let markup = json!({
            "@context": "https://schema.org",
            "@type": "WebPage",
            "name": title,
        });
        store
            .attach_metadata(record_id, SCHEMA_MARKUP_META, &markup.to_string())
            .await
            .with_context(|| format!("failed to attach schema markup to record {record_id}"))
    }
}

/// The hooks available to one materialization run.
///
/// `image` only runs when the caller asks for images; `schema` runs for
/// every created page when present.
#[derive(Clone, Default)]
pub struct PostCreateHooks {
    pub image: Option<Arc<dyn PostCreateHook>>,
    pub schema: Option<Arc<dyn PostCreateHook>>,
}

impl PostCreateHooks {
    pub fn none() -> Self {
        Self::default()
    }

    /// Built-in hooks: the image hook always, the schema hook when the
    /// `auto_schema` setting is on.
    pub fn from_settings(settings: &dyn ConfigProvider) -> Self {
        let schema: Option<Arc<dyn PostCreateHook>> = if settings.get_flag(settings::AUTO_SCHEMA, false) {
            Some(Arc::new(SchemaMarkupHook))
        } else {
            None
        };
        Self {
            image: Some(Arc::new(ImageRequestHook)),
            schema,
        }
    }
}

impl std::fmt::Debug for PostCreateHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostCreateHooks")
            .field("image", &self.image.as_ref().map(|h| h.name().to_string()))
            .field("schema", &self.schema.as_ref().map(|h| h.name().to_string()))
            .finish()
    }
}
