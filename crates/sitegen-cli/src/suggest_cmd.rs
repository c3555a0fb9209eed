//! `sitegen suggest`: ask the AI provider for a content plan and write one
//! selection token per suggestion for the operator to review.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sitegen_core::plan::selection::{encode_page, encode_post_type};
use sitegen_core::plan::{BusinessInputs, ContentPlan};
use sitegen_core::service::{GenerationContext, generate_advanced_content};

use crate::config::SitegenConfig;

pub const PAGES_FILE: &str = "pages.jsonl";
pub const POST_TYPES_FILE: &str = "post_types.jsonl";

pub async fn run_suggest(
    config: SitegenConfig,
    inputs: &BusinessInputs,
    out_dir: &Path,
) -> Result<()> {
    let ctx = GenerationContext::from_settings(Arc::new(config.settings), config.provider_params)
        .context("failed to set up AI providers")?;

    println!("Asking the AI provider for a content plan...");
    let plan = match generate_advanced_content(&ctx, inputs).await {
        Ok(plan) => plan,
        Err(e) => bail!("{}", e.user_message()),
    };

    if !plan.is_actionable() {
        println!("No suggestions generated. Try adding more business details.");
        return Ok(());
    }

    print!("{}", render_plan(&plan));
    let (pages_path, types_path) = write_selection_files(&plan, out_dir)?;

    println!();
    println!("Selection files written:");
    println!("  {}", pages_path.display());
    println!("  {}", types_path.display());
    println!();
    println!("Delete the lines you don't want, then run:");
    println!(
        "  sitegen create --pages {} --post-types {}",
        pages_path.display(),
        types_path.display()
    );
    Ok(())
}

/// Deepest nesting the page list indents to. Levels come from the provider
/// and may be arbitrarily large.
const MAX_DISPLAY_DEPTH: usize = 8;

/// Human-readable summary of a plan, as printed by `suggest`.
fn render_plan(plan: &ContentPlan) -> String {
    let mut out = String::new();

    if let Some(analysis) = &plan.business_analysis {
        out.push_str("\nBusiness analysis:\n");
        let _ = writeln!(out, "  Model:    {}", analysis.business_model);
        let _ = writeln!(out, "  Needs:    {}", analysis.content_needs);
        let _ = writeln!(out, "  Audience: {}", analysis.audience_insights);
    }

    let _ = writeln!(out, "\nPages ({}):", plan.pages.len());
    for page in &plan.pages {
        let depth = page.hierarchy_level.min(MAX_DISPLAY_DEPTH);
        let indent = "  ".repeat(depth + 1);
        let note = if page.meta_description_too_long() {
            " [meta description > 160 chars]"
        } else {
            ""
        };
        let _ = writeln!(out, "{indent}- {}{note}", page.title);
        if !page.reasoning.is_empty() {
            let _ = writeln!(out, "{indent}    {}", page.reasoning);
        }
    }

    let _ = writeln!(out, "\nCustom post types ({}):", plan.custom_post_types.len());
    for cpt in &plan.custom_post_types {
        let _ = writeln!(
            out,
            "  - {} ({}): {} field(s), {} sample(s)",
            cpt.label,
            cpt.name,
            cpt.fields.len(),
            cpt.sample_entries.len()
        );
        for field in &cpt.fields {
            let required = if field.required { ", required" } else { "" };
            let _ = writeln!(out, "      {} [{}{required}]", field.name, field.field_type);
        }
    }
    out
}

/// Write `pages.jsonl` and `post_types.jsonl` under `out_dir`, one token
/// per line preceded by a `#` comment naming the suggestion.
pub fn write_selection_files(plan: &ContentPlan, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut pages = String::from("# One page per line. Delete lines to skip them.\n");
    for page in &plan.pages {
        pages.push_str(&comment(&page.title));
        pages.push_str(&encode_page(page)?);
        pages.push('\n');
    }

    let mut types = String::from("# One custom post type per line. Delete lines to skip them.\n");
    for cpt in &plan.custom_post_types {
        types.push_str(&comment(&format!("{} ({})", cpt.label, cpt.name)));
        types.push_str(&encode_post_type(cpt)?);
        types.push('\n');
    }

    let pages_path = out_dir.join(PAGES_FILE);
    let types_path = out_dir.join(POST_TYPES_FILE);
    std::fs::write(&pages_path, pages)
        .with_context(|| format!("failed to write {}", pages_path.display()))?;
    std::fs::write(&types_path, types)
        .with_context(|| format!("failed to write {}", types_path.display()))?;
    Ok((pages_path, types_path))
}

/// A single `#` line; embedded newlines would otherwise leak into the
/// token stream.
fn comment(text: &str) -> String {
    let flat: Vec<&str> = text.split_whitespace().collect();
    format!("# {}\n", flat.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitegen_core::plan::selection::{decode_pages, decode_post_types, read_tokens};
    use sitegen_core::plan::{PageSuggestion, PostTypeSuggestion, parse_content_plan};

    #[test]
    fn huge_hierarchy_level_renders_at_capped_depth() {
        let plan = parse_content_plan(
            r#"{"standard_pages":[{"title":"Home","hierarchy_level":1e30},{"title":"About","hierarchy_level":18446744073709551615}]}"#,
        );
        assert_eq!(plan.pages.len(), 2);

        let text = render_plan(&plan);
        let deepest = format!("{}- Home", "  ".repeat(MAX_DISPLAY_DEPTH + 1));
        assert!(text.contains(&deepest), "{text}");
        assert!(text.contains("- About"));
        assert!(text.len() < 1024);
    }

    #[test]
    fn rendered_plan_indents_children() {
        let plan = parse_content_plan(
            r#"{"standard_pages":[{"title":"Home"},{"title":"Services","hierarchy_level":1}],
                "custom_post_types":[{"name":"service","label":"Services","fields":[{"name":"price","type":"number","required":true}]}]}"#,
        );
        let text = render_plan(&plan);
        assert!(text.contains("\n  - Home\n"));
        assert!(text.contains("\n    - Services\n"));
        assert!(text.contains("price [number, required]"));
    }

    #[test]
    fn selection_files_read_back() {
        let tmp = tempfile::TempDir::new().unwrap();
        let plan = ContentPlan {
            pages: vec![
                PageSuggestion {
                    title: "Home".into(),
                    ..Default::default()
                },
                PageSuggestion {
                    title: "Services\nand more".into(),
                    hierarchy_level: 1,
                    ..Default::default()
                },
            ],
            custom_post_types: vec![PostTypeSuggestion {
                name: "service".into(),
                label: "Services".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let (pages_path, types_path) =
            write_selection_files(&plan, &tmp.path().join("out")).unwrap();

        let pages = decode_pages(&read_tokens(&std::fs::read_to_string(pages_path).unwrap()));
        assert_eq!(pages, plan.pages);
        let types =
            decode_post_types(&read_tokens(&std::fs::read_to_string(types_path).unwrap()));
        assert_eq!(types[0].name, "service");
    }
}
