use anyhow::{Context, Result, bail};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;

/// Schema migrations from `crates/sitegen-db/migrations/`, embedded at
/// compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Open a pool sized by `config`. Connection errors name the server with
/// the password redacted.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    connect(config, &config.database_url, config.max_connections).await
}

async fn connect(config: &DbConfig, url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(url)
        .await
        .with_context(|| {
            let shown = DbConfig::new(url).redacted_url();
            format!("failed to connect to database at {shown}")
        })
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(count = MIGRATOR.iter().count(), "migrations up to date");
    Ok(())
}

/// `CREATE DATABASE` takes an identifier, not a bind parameter, so the name
/// is restricted to a safe unquoted subset.
pub fn validate_database_name(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if !starts_ok
        || name.len() > 63
        || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        bail!("database name {name:?} must be lowercase letters, digits and _ (at most 63)");
    }
    Ok(name)
}

/// Create the configured database on its server unless it already exists.
/// Returns `true` when it was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let name = config
        .database_name()
        .context("database URL has no database name")?;
    let name = validate_database_name(name)?;

    let maint = connect(config, &config.maintenance_url(), 1).await?;
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(name)
            .fetch_one(&maint)
            .await
            .context("failed to look up database")?;

    if exists {
        debug!(db = name, "database exists");
    } else {
        maint
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        info!(db = name, "database created");
    }
    maint.close().await;
    Ok(!exists)
}

/// Everything `sitegen db-init` does: create the database if needed,
/// connect, and apply migrations.
pub async fn prepare_database(config: &DbConfig) -> Result<(PgPool, bool)> {
    let created = ensure_database_exists(config).await?;
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok((pool, created))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names() {
        assert!(validate_database_name("sitegen").is_ok());
        assert!(validate_database_name("_site_2").is_ok());
        assert!(validate_database_name("Sitegen").is_err());
        assert!(validate_database_name("2sites").is_err());
        assert!(validate_database_name("site-gen").is_err());
        assert!(validate_database_name("site; DROP TABLE x").is_err());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn migrations_are_embedded() {
        assert!(MIGRATOR.iter().count() >= 1);
    }
}
