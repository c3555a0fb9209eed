//! Materializer behaviour against stores that misbehave.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use sitegen_core::hooks::PostCreateHooks;
use sitegen_core::plan::{MaterializeOptions, Materializer, PageSuggestion};
use sitegen_core::store::{ContentStore, ContentTypeSpec, MemoryStore, NewRecord, StoreError};

/// Delegates to a [`MemoryStore`] but rejects the Nth `create_record` call
/// (1-based).
struct FlakyStore {
    inner: MemoryStore,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyStore {
    fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentStore for FlakyStore {
    async fn create_record(&self, record: NewRecord) -> Result<Uuid, StoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(StoreError::Rejected(format!("refusing {:?}", record.title)));
        }
        self.inner.create_record(record).await
    }

    async fn register_content_type(&self, spec: &ContentTypeSpec) -> Result<(), StoreError> {
        self.inner.register_content_type(spec).await
    }

    async fn content_type_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.inner.content_type_exists(name).await
    }

    async fn attach_metadata(
        &self,
        record_id: Uuid,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.inner.attach_metadata(record_id, key, value).await
    }

    async fn delete_record(&self, record_id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_record(record_id).await
    }
}

fn page(title: &str, level: usize) -> PageSuggestion {
    PageSuggestion {
        title: title.to_string(),
        hierarchy_level: level,
        ..Default::default()
    }
}

#[tokio::test]
async fn failed_page_is_skipped_and_batch_continues() {
    let store = FlakyStore::failing_on(2);
    let hooks = PostCreateHooks::none();
    let pages = [page("Home", 0), page("About", 0), page("Contact", 0)];

    let report = Materializer::new(&store, &hooks)
        .materialize(&pages, &[], MaterializeOptions::default())
        .await;

    assert_eq!(report.created_pages, 2);
    assert_eq!(report.skipped_pages, 1);
    let titles: Vec<String> = store.inner.records().into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["Home", "Contact"]);
}

#[tokio::test]
async fn failed_parent_does_not_become_a_parent() {
    // The level-1 page fails, so its level-2 child attaches to nothing,
    // and the next level-1 page still finds the level-0 root.
    let store = FlakyStore::failing_on(2);
    let hooks = PostCreateHooks::none();
    let pages = [
        page("Root", 0),
        page("Broken", 1),
        page("Grandchild", 2),
        page("Sibling", 1),
    ];

    let report = Materializer::new(&store, &hooks)
        .materialize(&pages, &[], MaterializeOptions::default())
        .await;
    assert_eq!(report.created_pages, 3);

    let records = store.inner.records();
    let root = records.iter().find(|r| r.title == "Root").unwrap();
    let grandchild = records.iter().find(|r| r.title == "Grandchild").unwrap();
    let sibling = records.iter().find(|r| r.title == "Sibling").unwrap();
    assert_eq!(grandchild.parent_id, None);
    assert_eq!(sibling.parent_id, Some(root.id));
}

#[tokio::test]
async fn failing_hook_does_not_undo_the_page() {
    use sitegen_core::hooks::PostCreateHook;
    use std::sync::Arc;

    struct AlwaysFails;

    #[async_trait]
    impl PostCreateHook for AlwaysFails {
        fn name(&self) -> &str {
            "always-fails"
        }

        async fn after_create(
            &self,
            _store: &dyn ContentStore,
            _record_id: Uuid,
            _title: &str,
        ) -> anyhow::Result<()> {
            anyhow::bail!("hook exploded")
        }
    }

    let store = MemoryStore::new();
    let hooks = PostCreateHooks {
        image: Some(Arc::new(AlwaysFails)),
        schema: Some(Arc::new(AlwaysFails)),
    };
    let report = Materializer::new(&store, &hooks)
        .materialize(
            &[page("Home", 0), page("About", 1)],
            &[],
            MaterializeOptions {
                generate_images: true,
            },
        )
        .await;

    assert_eq!(report.created_pages, 2);
    assert_eq!(report.images_requested, 0);
    let records = store.records();
    assert_eq!(records[1].parent_id, Some(records[0].id));
}
