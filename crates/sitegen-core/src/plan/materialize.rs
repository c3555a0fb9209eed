//! Content plan materialization: selected suggestions to draft records.
//!
//! Pages are created in order; a page at level N is parented to the page
//! most recently created at level N-1. Post types are validated, registered,
//! and seeded with their sample entries. Every item is independent: a
//! failure is logged and skipped, and nothing is rolled back.

use std::collections::{BTreeMap, HashSet};

use chrono::{Local, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::hooks::{PostCreateHook, PostCreateHooks};
use crate::store::{ContentStore, ContentTypeSpec, NewRecord};

use super::samples::{explicit_value, sample_value};
use super::slug::slugify;
use super::types::{FieldSpec, PageSuggestion, PostTypeSuggestion, SampleEntry};

/// Content type every suggested page is created as.
pub const PAGE_TYPE: &str = "page";
pub const MAX_TYPE_NAME_LEN: usize = 20;
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// Names a custom post type may never take.
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "post",
    "page",
    "attachment",
    "revision",
    "nav_menu_item",
    "custom_css",
    "customize_changeset",
    "oembed_cache",
    "user_request",
    "wp_block",
    "wp_template",
    "wp_template_part",
    "wp_global_styles",
    "wp_navigation",
    "action",
    "author",
    "order",
    "theme",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Run the image hook on every created page.
    pub generate_images: bool,
}

/// Aggregate outcome of one materialization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
    pub created_pages: usize,
    pub created_types: usize,
    pub images_requested: usize,
    pub sample_records: usize,
    pub skipped_pages: usize,
    pub skipped_types: usize,
}

/// Why a post-type suggestion was not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostTypeRejection {
    #[error("invalid post type name {0:?}: use a-z, 0-9 and _, at most 20 characters")]
    InvalidName(String),

    #[error("post type name {0:?} is reserved")]
    Reserved(String),

    #[error("post type {0:?} appears more than once in this batch")]
    DuplicateInBatch(String),
}

/// `^[a-z_][a-z0-9_]*$` with a length cap.
pub fn is_valid_machine_name(name: &str, max_len: usize) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= max_len
        && (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Validate a suggestion against the naming rules and the names already
/// accepted in this batch, and build its registration.
///
/// Fields with an invalid or repeated name are dropped; the type itself is
/// still accepted.
pub fn validate_post_type(
    suggestion: &PostTypeSuggestion,
    seen: &HashSet<String>,
) -> Result<ContentTypeSpec, PostTypeRejection> {
    let name = suggestion.name.trim();
    if !is_valid_machine_name(name, MAX_TYPE_NAME_LEN) {
        return Err(PostTypeRejection::InvalidName(name.to_string()));
    }
    if RESERVED_TYPE_NAMES.contains(&name) {
        return Err(PostTypeRejection::Reserved(name.to_string()));
    }
    if seen.contains(name) {
        return Err(PostTypeRejection::DuplicateInBatch(name.to_string()));
    }

    let mut field_names = HashSet::new();
    let fields: Vec<FieldSpec> = suggestion
        .fields
        .iter()
        .filter(|field| {
            let keep = is_valid_machine_name(&field.name, MAX_FIELD_NAME_LEN)
                && field_names.insert(field.name.clone());
            if !keep {
                warn!(post_type = name, field = %field.name, "dropping field with invalid or repeated name");
            }
            keep
        })
        .cloned()
        .collect();

    Ok(ContentTypeSpec::new(
        name,
        suggestion.label.as_str(),
        suggestion.description.as_str(),
        fields,
    ))
}

/// Drives a [`ContentStore`] from selected suggestions.
pub struct Materializer<'a> {
    store: &'a dyn ContentStore,
    hooks: &'a PostCreateHooks,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a dyn ContentStore, hooks: &'a PostCreateHooks) -> Self {
        Self { store, hooks }
    }

    /// Create the pages, then the post types. Never fails; see the report
    /// for what was created.
    pub async fn materialize(
        &self,
        pages: &[PageSuggestion],
        post_types: &[PostTypeSuggestion],
        options: MaterializeOptions,
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();
        self.create_pages(pages, options, &mut report).await;
        self.create_post_types(post_types, &mut report).await;

        info!(
            created_pages = report.created_pages,
            created_types = report.created_types,
            sample_records = report.sample_records,
            images_requested = report.images_requested,
            skipped_pages = report.skipped_pages,
            skipped_types = report.skipped_types,
            "content plan materialized"
        );
        report
    }

    // -----------------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------------

    async fn create_pages(
        &self,
        pages: &[PageSuggestion],
        options: MaterializeOptions,
        report: &mut MaterializeReport,
    ) {
        // Level -> most recently created page at that level. Slots deeper
        // than the current page are cleared after each creation.
        let mut parent_at_level: BTreeMap<usize, Uuid> = BTreeMap::new();

        for (index, page) in pages.iter().enumerate() {
            let title = page.title.trim();
            if title.is_empty() {
                warn!(index, "skipping page with empty title");
                report.skipped_pages += 1;
                continue;
            }
            if page.meta_description_too_long() {
                debug!(title, "meta description exceeds the recommended length");
            }

            let level = page.hierarchy_level;
            let parent_id = level
                .checked_sub(1)
                .and_then(|above| parent_at_level.get(&above).copied());

            let mut record = NewRecord::draft(PAGE_TYPE, title, slugify(title));
            record.parent_id = parent_id;
            record.excerpt = Some(page.meta_description.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string);

            let id = match self.store.create_record(record).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(index, title, error = %e, "failed to create page, skipping");
                    report.skipped_pages += 1;
                    continue;
                }
            };
            report.created_pages += 1;
            debug!(%id, title, level, parent = ?parent_id, "page created");

            if options.generate_images {
                if let Some(hook) = &self.hooks.image {
                    if self.run_hook(hook.as_ref(), id, title).await {
                        report.images_requested += 1;
                    }
                }
            }
            if let Some(hook) = &self.hooks.schema {
                self.run_hook(hook.as_ref(), id, title).await;
            }

            parent_at_level.retain(|slot, _| *slot < level);
            parent_at_level.insert(level, id);
        }
    }

    async fn run_hook(&self, hook: &dyn PostCreateHook, id: Uuid, title: &str) -> bool {
        match hook.after_create(self.store, id, title).await {
            Ok(()) => true,
            Err(e) => {
                warn!(hook = hook.name(), %id, error = %format!("{e:#}"), "post-create hook failed");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Post types
    // -----------------------------------------------------------------------

    async fn create_post_types(
        &self,
        post_types: &[PostTypeSuggestion],
        report: &mut MaterializeReport,
    ) {
        let mut seen = HashSet::new();
        let today = Local::now().date_naive();

        for suggestion in post_types {
            let spec = match validate_post_type(suggestion, &seen) {
                Ok(spec) => spec,
                Err(rejection) => {
                    warn!(reason = %rejection, "skipping post type");
                    report.skipped_types += 1;
                    continue;
                }
            };
            seen.insert(spec.name.clone());

            match self.store.content_type_exists(&spec.name).await {
                Ok(false) => {}
                Ok(true) => {
                    warn!(post_type = %spec.name, "content type already exists, skipping");
                    report.skipped_types += 1;
                    continue;
                }
                Err(e) => {
                    warn!(post_type = %spec.name, error = %e, "could not check content type, skipping");
                    report.skipped_types += 1;
                    continue;
                }
            }

            if let Err(e) = self.store.register_content_type(&spec).await {
                warn!(post_type = %spec.name, error = %e, "failed to register content type, skipping");
                report.skipped_types += 1;
                continue;
            }
            report.created_types += 1;
            info!(post_type = %spec.name, fields = spec.fields.len(), "content type registered");

            for entry in &suggestion.sample_entries {
                if self.create_sample(&spec, entry, today).await {
                    report.sample_records += 1;
                }
            }
        }
    }

    async fn create_sample(&self, spec: &ContentTypeSpec, entry: &SampleEntry, today: NaiveDate) -> bool {
        let title = entry.title.trim();
        if title.is_empty() {
            warn!(post_type = %spec.name, "skipping sample entry with empty title");
            return false;
        }

        let mut record = NewRecord::draft(spec.name.as_str(), title, slugify(title));
        record.body = Some(entry.content.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let id = match self.store.create_record(record).await {
            Ok(id) => id,
            Err(e) => {
                warn!(post_type = %spec.name, title, error = %e, "failed to create sample entry");
                return false;
            }
        };

        for (key, value) in sample_fields(&spec.fields, entry, today) {
            if let Err(e) = self.store.attach_metadata(id, &key, &value).await {
                warn!(%id, field = %key, error = %e, "failed to attach sample field");
            }
        }
        true
    }
}

/// Values for every field of a sample entry: the entry's explicit value when
/// it has one, a synthesized value otherwise.
fn sample_fields(fields: &[FieldSpec], entry: &SampleEntry, today: NaiveDate) -> Vec<(String, String)> {
    let mut rng = rand::rng();
    fields
        .iter()
        .map(|field| {
            let value = entry
                .fields
                .get(&field.name)
                .and_then(explicit_value)
                .unwrap_or_else(|| sample_value(field, today, &mut rng));
            (field.name.clone(), value)
        })
        .collect()
}
