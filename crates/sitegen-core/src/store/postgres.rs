//! PostgreSQL-backed [`ContentStore`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use sitegen_db::queries::content_types::{self, NewContentType};
use sitegen_db::queries::meta;
use sitegen_db::queries::records::{self, NewRecordRow};

use super::{ContentStore, ContentTypeSpec, NewRecord, StoreError};

/// [`ContentStore`] over the `sitegen-db` schema.
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create_record(&self, record: NewRecord) -> Result<Uuid, StoreError> {
        if !content_types::content_type_exists(&self.pool, &record.content_type).await? {
            return Err(StoreError::UnknownType(record.content_type));
        }
        if let Some(parent) = record.parent_id {
            if records::get_record(&self.pool, parent).await?.is_none() {
                return Err(StoreError::NotFound(parent));
            }
        }

        let row = NewRecordRow {
            content_type: &record.content_type,
            title: &record.title,
            slug: &record.slug,
            parent_id: record.parent_id,
            excerpt: record.excerpt.as_deref(),
            body: record.body.as_deref(),
            status: record.status,
        };
        let created = records::insert_record(&self.pool, &row).await?;
        debug!(id = %created.id, slug = %created.slug, content_type = %created.content_type, "record inserted");
        Ok(created.id)
    }

    async fn register_content_type(&self, spec: &ContentTypeSpec) -> Result<(), StoreError> {
        let fields = spec.fields_json();
        let settings = spec.settings_json();
        let new = NewContentType {
            name: &spec.name,
            label: &spec.label,
            singular_label: &spec.singular_label,
            description: &spec.description,
            fields: &fields,
            settings: &settings,
        };
        match content_types::insert_content_type(&self.pool, &new).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::DuplicateType(spec.name.clone())),
        }
    }

    async fn content_type_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(content_types::content_type_exists(&self.pool, name).await?)
    }

    async fn attach_metadata(
        &self,
        record_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        if records::get_record(&self.pool, record_id).await?.is_none() {
            return Err(StoreError::NotFound(record_id));
        }
        meta::upsert_meta(&self.pool, record_id, key, value).await?;
        Ok(())
    }

    async fn delete_record(&self, record_id: Uuid) -> Result<(), StoreError> {
        if records::delete_record(&self.pool, record_id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(record_id))
        }
    }
}
