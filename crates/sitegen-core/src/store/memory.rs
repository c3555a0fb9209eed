//! In-memory [`ContentStore`], used for `--dry-run` and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use sitegen_db::models::ContentRecord;
use sitegen_db::queries::records::slug_candidate;

use super::{ContentStore, ContentTypeSpec, NewRecord, StoreError};

/// Built-in content types every store starts with.
pub const BUILTIN_TYPES: &[(&str, &str)] = &[("page", "Pages"), ("post", "Posts")];

#[derive(Debug, Default)]
struct State {
    types: BTreeMap<String, ContentTypeSpec>,
    /// Insertion order is creation order.
    records: Vec<ContentRecord>,
    meta: HashMap<Uuid, BTreeMap<String, String>>,
}

/// A [`ContentStore`] that keeps everything in process memory.
///
/// Mirrors the PostgreSQL store's rules: unknown content types and parents
/// are rejected, and slugs get a `-N` suffix on collision within a type.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut state = State::default();
        for (name, label) in BUILTIN_TYPES {
            let mut spec = ContentTypeSpec::new(*name, *label, "", Vec::new());
            spec.hierarchical = *name == "page";
            state.types.insert((*name).to_string(), spec);
        }
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All records in creation order.
    pub fn records(&self) -> Vec<ContentRecord> {
        self.lock().records.clone()
    }

    pub fn record(&self, id: Uuid) -> Option<ContentRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn records_of_type(&self, content_type: &str) -> Vec<ContentRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.content_type == content_type)
            .cloned()
            .collect()
    }

    pub fn children_of(&self, parent_id: Uuid) -> Vec<ContentRecord> {
        self.lock()
            .records
            .iter()
            .filter(|r| r.parent_id == Some(parent_id))
            .cloned()
            .collect()
    }

    /// Metadata of a record, ordered by key. Empty when none is set.
    pub fn meta(&self, record_id: Uuid) -> BTreeMap<String, String> {
        self.lock()
            .meta
            .get(&record_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Registered content type names, sorted.
    pub fn content_types(&self) -> Vec<String> {
        self.lock().types.keys().cloned().collect()
    }

    pub fn content_type(&self, name: &str) -> Option<ContentTypeSpec> {
        self.lock().types.get(name).cloned()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_record(&self, record: NewRecord) -> Result<Uuid, StoreError> {
        if record.title.trim().is_empty() {
            return Err(StoreError::Rejected("title is empty".into()));
        }

        let mut state = self.lock();
        if !state.types.contains_key(&record.content_type) {
            return Err(StoreError::UnknownType(record.content_type));
        }
        if let Some(parent) = record.parent_id {
            if !state.records.iter().any(|r| r.id == parent) {
                return Err(StoreError::NotFound(parent));
            }
        }

        let taken = |slug: &str| {
            state
                .records
                .iter()
                .any(|r| r.content_type == record.content_type && r.slug == slug)
        };
        let slug = (1..)
            .map(|attempt| slug_candidate(&record.slug, attempt))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| record.slug.clone());

        let id = Uuid::new_v4();
        state.records.push(ContentRecord {
            id,
            content_type: record.content_type,
            title: record.title,
            slug,
            parent_id: record.parent_id,
            excerpt: record.excerpt,
            body: record.body,
            status: record.status,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn register_content_type(&self, spec: &ContentTypeSpec) -> Result<(), StoreError> {
        if spec.name.trim().is_empty() {
            return Err(StoreError::InvalidTypeName(spec.name.clone()));
        }
        let mut state = self.lock();
        if state.types.contains_key(&spec.name) {
            return Err(StoreError::DuplicateType(spec.name.clone()));
        }
        state.types.insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn content_type_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.lock().types.contains_key(name))
    }

    async fn attach_metadata(
        &self,
        record_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.records.iter().any(|r| r.id == record_id) {
            return Err(StoreError::NotFound(record_id));
        }
        state
            .meta
            .entry(record_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_record(&self, record_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        let before = state.records.len();
        state.records.retain(|r| r.id != record_id);
        if state.records.len() == before {
            return Err(StoreError::NotFound(record_id));
        }
        state.meta.remove(&record_id);
        for child in state
            .records
            .iter_mut()
            .filter(|r| r.parent_id == Some(record_id))
        {
            child.parent_id = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_db::models::ContentStatus;

    #[tokio::test]
    async fn starts_with_builtin_types() {
        let store = MemoryStore::new();
        assert_eq!(store.content_types(), vec!["page", "post"]);
        assert!(store.content_type_exists("page").await.unwrap());
        assert!(!store.content_type_exists("service").await.unwrap());
        assert!(store.content_type("page").unwrap().hierarchical);
    }

    #[tokio::test]
    async fn slugs_are_unique_per_type() {
        let store = MemoryStore::new();
        let a = store
            .create_record(NewRecord::draft("page", "About", "about"))
            .await
            .unwrap();
        let b = store
            .create_record(NewRecord::draft("page", "About", "about"))
            .await
            .unwrap();
        let post = store
            .create_record(NewRecord::draft("post", "About", "about"))
            .await
            .unwrap();

        assert_eq!(store.record(a).unwrap().slug, "about");
        assert_eq!(store.record(b).unwrap().slug, "about-2");
        assert_eq!(store.record(post).unwrap().slug, "about");
        assert_eq!(store.record(a).unwrap().status, ContentStatus::Draft);
    }

    #[tokio::test]
    async fn rejects_unknown_type_and_parent() {
        let store = MemoryStore::new();
        let err = store
            .create_record(NewRecord::draft("service", "Bath", "bath"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownType(t) if t == "service"));

        let mut orphan = NewRecord::draft("page", "Orphan", "orphan");
        let missing = Uuid::new_v4();
        orphan.parent_id = Some(missing);
        let err = store.create_record(orphan).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));

        let err = store
            .create_record(NewRecord::draft("page", "  ", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let store = MemoryStore::new();
        let spec = ContentTypeSpec::new("service", "Services", "", vec![]);
        store.register_content_type(&spec).await.unwrap();
        let err = store.register_content_type(&spec).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateType(n) if n == "service"));
        assert_eq!(store.content_types(), vec!["page", "post", "service"]);
    }

    #[tokio::test]
    async fn delete_clears_meta_and_detaches_children() {
        let store = MemoryStore::new();
        let parent = store
            .create_record(NewRecord::draft("page", "Services", "services"))
            .await
            .unwrap();
        let mut child = NewRecord::draft("page", "Bathing", "bathing");
        child.parent_id = Some(parent);
        let child = store.create_record(child).await.unwrap();
        store.attach_metadata(parent, "k", "v").await.unwrap();
        assert_eq!(store.children_of(parent).len(), 1);

        store.delete_record(parent).await.unwrap();
        assert!(store.record(parent).is_none());
        assert!(store.meta(parent).is_empty());
        assert_eq!(store.record(child).unwrap().parent_id, None);
        assert!(matches!(
            store.delete_record(parent).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.attach_metadata(parent, "k", "v").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
