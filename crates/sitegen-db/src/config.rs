use std::time::Duration;

/// Connection settings for the content database.
///
/// The URL is resolved by the CLI (flag, `SITEGEN_DATABASE_URL`, config
/// file); pool sizing stays at the defaults unless a caller overrides it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/sitegen";
    pub const ENV_VAR: &str = "SITEGEN_DATABASE_URL";
    /// Database used to issue `CREATE DATABASE`.
    pub const MAINTENANCE_DB: &str = "postgres";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Split into `(server part, database name, query string)`.
    fn parts(&self) -> (&str, &str, Option<&str>) {
        let (head, query) = match self.database_url.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (self.database_url.as_str(), None),
        };
        match head.rsplit_once('/') {
            // `postgresql://host` has no database segment; the `//` is not one.
            Some((server, name)) if !server.ends_with('/') && !server.ends_with(':') => {
                (server, name, query)
            }
            _ => (head, "", query),
        }
    }

    /// The database name, query string excluded. `None` when the URL has no
    /// database segment.
    pub fn database_name(&self) -> Option<&str> {
        let (_, name, _) = self.parts();
        Some(name).filter(|n| !n.is_empty())
    }

    /// The same server and query options, pointed at another database.
    pub fn sibling_url(&self, database: &str) -> String {
        let (server, _, query) = self.parts();
        match query {
            Some(q) => format!("{server}/{database}?{q}"),
            None => format!("{server}/{database}"),
        }
    }

    pub fn maintenance_url(&self) -> String {
        self.sibling_url(Self::MAINTENANCE_DB)
    }

    /// The URL with any password replaced by `***`, for logs and errors.
    pub fn redacted_url(&self) -> String {
        let url = &self.database_url;
        let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
            return url.clone();
        };
        let authority_end = url[scheme_end..]
            .find('/')
            .map_or(url.len(), |i| scheme_end + i);
        let authority = &url[scheme_end..authority_end];
        let Some(at) = authority.rfind('@') else {
            return url.clone();
        };
        let userinfo = &authority[..at];
        let Some(colon) = userinfo.find(':') else {
            return url.clone();
        };
        format!(
            "{}{}:***{}",
            &url[..scheme_end],
            &userinfo[..colon],
            &url[scheme_end + at..]
        )
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = DbConfig::default();
        assert_eq!(cfg.database_url, "postgresql://localhost:5432/sitegen");
        assert_eq!(cfg.database_name(), Some("sitegen"));
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn database_name_ignores_query_string() {
        let cfg = DbConfig::new("postgresql://localhost:5432/content?sslmode=disable");
        assert_eq!(cfg.database_name(), Some("content"));
    }

    #[test]
    fn database_name_missing() {
        assert_eq!(DbConfig::new("postgresql://localhost:5432/").database_name(), None);
        assert_eq!(DbConfig::new("postgresql://localhost:5432").database_name(), None);
    }

    #[test]
    fn maintenance_url_keeps_query_options() {
        let cfg = DbConfig::new("postgresql://localhost:5432/sitegen");
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");

        let cfg = DbConfig::new("postgresql://db.internal/sitegen?sslmode=require");
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://db.internal/postgres?sslmode=require"
        );
        assert_eq!(
            DbConfig::new("postgresql://db.internal:5432").sibling_url("other"),
            "postgresql://db.internal:5432/other"
        );
    }

    #[test]
    fn redacted_url_hides_password_only() {
        let cfg = DbConfig::new("postgresql://editor:s3cret@db:5432/sitegen");
        assert_eq!(cfg.redacted_url(), "postgresql://editor:***@db:5432/sitegen");

        let cfg = DbConfig::new("postgresql://editor@db/sitegen");
        assert_eq!(cfg.redacted_url(), "postgresql://editor@db/sitegen");
        assert_eq!(
            DbConfig::default().redacted_url(),
            "postgresql://localhost:5432/sitegen"
        );
    }

    #[test]
    fn max_connections_is_at_least_one() {
        assert_eq!(DbConfig::default().with_max_connections(0).max_connections, 1);
    }
}
