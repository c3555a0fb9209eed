mod config;
mod create_cmd;
mod list_cmds;
mod suggest_cmd;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sitegen_core::plan::BusinessInputs;
use sitegen_core::provider::{ProviderId, validate_api_key};
use sitegen_core::store::PgContentStore;
use sitegen_db::pool;

use config::SitegenConfig;

#[derive(Parser)]
#[command(name = "sitegen", about = "AI-assisted website content planner")]
struct Cli {
    /// Database URL (overrides SITEGEN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sitegen config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/sitegen")]
        db_url: String,
        /// AI provider: openai, gemini or deepseek
        #[arg(long, default_value = "openai")]
        provider: String,
        /// API key for the chosen provider
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the sitegen database
    DbInit,
    /// Ask the AI provider for a content plan and write selection files
    Suggest {
        /// Kind of business, e.g. "Pet Grooming Service"
        #[arg(long)]
        business_type: String,
        /// What the business does and offers
        #[arg(long)]
        details: String,
        /// Target SEO keywords
        #[arg(long, default_value = "")]
        keywords: String,
        /// Who the website is for
        #[arg(long, default_value = "")]
        audience: String,
        /// Directory for pages.jsonl and post_types.jsonl
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Override the configured AI provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Create the selected pages and custom post types as drafts
    Create {
        /// Page selection file written by `suggest`
        #[arg(long)]
        pages: Option<PathBuf>,
        /// Post type selection file written by `suggest`
        #[arg(long)]
        post_types: Option<PathBuf>,
        /// Request featured images for created pages
        #[arg(long)]
        images: bool,
        /// Materialize in memory and print the result, no database needed
        #[arg(long)]
        dry_run: bool,
    },
    /// List content records
    Records {
        /// Only records of this content type
        #[arg(long = "type")]
        content_type: Option<String>,
    },
    /// List registered content types
    Types,
}

/// Execute the `sitegen init` command: write config file.
fn cmd_init(db_url: &str, provider: &str, api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let provider: ProviderId = provider.parse()?;
    let mut cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        ..Default::default()
    };
    cfg.ai.provider = Some(provider.as_str().to_string());
    if let Some(key) = api_key {
        validate_api_key(provider, key)?;
        cfg.ai.set_api_key(provider, key.to_string());
    }

    config::save_config(&cfg)?;
    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  ai.provider = {provider}");
    match api_key {
        Some(_) => println!("  ai.{provider}_api_key = (set)"),
        None => println!(
            "  no API key stored; set {} or rerun with --api-key",
            config::api_key_env_var(provider)
        ),
    }
    println!();
    println!("Next: run `sitegen db-init` to create and migrate the database.");
    Ok(())
}

/// Execute the `sitegen db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = SitegenConfig::resolve(cli_db_url, None)?;

    let db = &resolved.db_config;
    println!("Initializing sitegen database at {}...", db.redacted_url());
    let (db_pool, created) = pool::prepare_database(db).await?;
    if created {
        println!("Created database {}.", db.database_name().unwrap_or_default());
    }

    let result = list_cmds::run_types(&db_pool).await;
    db_pool.close().await;
    result?;
    println!("sitegen db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            provider,
            api_key,
            force,
        } => {
            cmd_init(&db_url, &provider, api_key.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Suggest {
            business_type,
            details,
            keywords,
            audience,
            out_dir,
            provider,
        } => {
            let resolved = SitegenConfig::resolve(cli.database_url.as_deref(), provider.as_deref())?;
            let inputs = BusinessInputs::new(business_type, details)
                .with_keywords(keywords)
                .with_audience(audience);
            suggest_cmd::run_suggest(resolved, &inputs, &out_dir).await?;
        }
        Commands::Create {
            pages,
            post_types,
            images,
            dry_run,
        } => {
            let resolved = SitegenConfig::resolve(cli.database_url.as_deref(), None)?;
            let pages = create_cmd::load_tokens(pages.as_deref())?;
            let post_types = create_cmd::load_tokens(post_types.as_deref())?;
            if pages.is_empty() && post_types.is_empty() {
                anyhow::bail!("nothing selected; pass --pages and/or --post-types");
            }

            if dry_run {
                create_cmd::run_dry_run(&resolved.settings, &pages, &post_types, images).await;
            } else {
                let db_pool = pool::create_pool(&resolved.db_config)
                    .await
                    .context("failed to connect to the database (did you run `sitegen db-init`?)")?;
                let store = PgContentStore::new(db_pool.clone());
                create_cmd::run_create(&store, &resolved.settings, &pages, &post_types, images)
                    .await;
                db_pool.close().await;
            }
        }
        Commands::Records { content_type } => {
            let resolved = SitegenConfig::resolve(cli.database_url.as_deref(), None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = list_cmds::run_records(&db_pool, content_type.as_deref()).await;
            db_pool.close().await;
            result?;
        }
        Commands::Types => {
            let resolved = SitegenConfig::resolve(cli.database_url.as_deref(), None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = list_cmds::run_types(&db_pool).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that mutate process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
