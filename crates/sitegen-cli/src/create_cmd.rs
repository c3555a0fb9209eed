//! `sitegen create`: materialize the selection files produced by
//! `sitegen suggest`.

use std::path::Path;

use anyhow::{Context, Result};

use sitegen_core::plan::MaterializeReport;
use sitegen_core::plan::selection::read_tokens;
use sitegen_core::service::create_advanced_content;
use sitegen_core::settings::ConfigProvider;
use sitegen_core::store::{ContentStore, MemoryStore};

/// Selection tokens from an optional file. A missing flag means no tokens.
pub fn load_tokens(path: Option<&Path>) -> Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read selection file {}", path.display()))?;
    Ok(read_tokens(&content))
}

pub async fn run_create(
    store: &dyn ContentStore,
    settings: &dyn ConfigProvider,
    pages: &[String],
    post_types: &[String],
    generate_images: bool,
) -> MaterializeReport {
    let report = create_advanced_content(store, settings, pages, post_types, generate_images).await;
    print_report(&report);
    report
}

/// Dry run: materialize into memory and list what would be created.
pub async fn run_dry_run(
    settings: &dyn ConfigProvider,
    pages: &[String],
    post_types: &[String],
    generate_images: bool,
) -> MaterializeReport {
    let store = MemoryStore::new();
    println!("Dry run: nothing is written to the database.");
    let report = run_create(&store, settings, pages, post_types, generate_images).await;

    let records = store.records();
    if !records.is_empty() {
        println!();
        println!("Would create:");
    }
    for record in &records {
        let parent = record
            .parent_id
            .and_then(|id| store.record(id))
            .map(|p| format!(" (child of {:?})", p.title))
            .unwrap_or_default();
        println!(
            "  [{}] {} /{}{parent}",
            record.content_type, record.title, record.slug
        );
    }
    report
}

fn print_report(report: &MaterializeReport) {
    println!(
        "Created {} page(s) and {} custom post type(s) with {} sample record(s).",
        report.created_pages, report.created_types, report.sample_records
    );
    if report.images_requested > 0 {
        println!("Requested featured images for {} page(s).", report.images_requested);
    }
    if report.skipped_pages + report.skipped_types > 0 {
        println!(
            "Skipped {} page(s) and {} post type(s); see the log for details.",
            report.skipped_pages, report.skipped_types
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_core::settings::MapConfig;

    #[test]
    fn missing_flag_means_no_tokens() {
        assert!(load_tokens(None).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_tokens(Some(Path::new("/nonexistent/pages.jsonl"))).unwrap_err();
        assert!(err.to_string().contains("failed to read selection file"));
    }

    #[tokio::test]
    async fn dry_run_counts_without_database() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pages.jsonl");
        std::fs::write(
            &path,
            "# Home\n{\"title\":\"Home\"}\n# About\n{\"title\":\"About\",\"hierarchy_level\":1}\n",
        )
        .unwrap();

        let pages = load_tokens(Some(&path)).unwrap();
        let report = run_dry_run(&MapConfig::new(), &pages, &[], false).await;
        assert_eq!(report.created_pages, 2);
    }
}
