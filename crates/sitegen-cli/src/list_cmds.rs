//! `sitegen records` and `sitegen types`: inspect stored content.

use anyhow::Result;
use sqlx::PgPool;

use sitegen_db::queries::{content_types, records};

pub async fn run_records(pool: &PgPool, content_type: Option<&str>) -> Result<()> {
    let rows = records::list_records(pool, content_type).await?;
    if rows.is_empty() {
        println!("No records.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<20}  {:<8}  {:<30}  TITLE",
        "ID", "TYPE", "STATUS", "SLUG"
    );
    for row in &rows {
        println!(
            "{:<36}  {:<20}  {:<8}  {:<30}  {}",
            row.id, row.content_type, row.status, row.slug, row.title
        );
    }
    println!();
    println!("{} record(s).", rows.len());
    Ok(())
}

pub async fn run_types(pool: &PgPool) -> Result<()> {
    let summaries = content_types::summarize_content_types(pool).await?;
    println!(
        "{:<20}  {:<8}  {:>6}  {:>6}  {:>9}",
        "TYPE", "KIND", "FIELDS", "DRAFTS", "PUBLISHED"
    );
    for t in &summaries {
        let kind = if t.builtin { "builtin" } else { "custom" };
        println!(
            "{:<20}  {kind:<8}  {:>6}  {:>6}  {:>9}",
            t.name, t.field_count, t.drafts, t.published
        );
    }
    let total: i64 = summaries.iter().map(|t| t.total()).sum();
    println!();
    println!("{} content type(s), {total} record(s).", summaries.len());
    Ok(())
}
