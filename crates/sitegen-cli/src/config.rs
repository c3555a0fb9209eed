//! Configuration file management for sitegen.
//!
//! Provides a TOML config file at `~/.config/sitegen/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sitegen_core::provider::{ProviderId, ProviderParams};
use sitegen_core::settings::{self, MapConfig};
use sitegen_db::config::DbConfig;

pub const ENV_AI_PROVIDER: &str = "SITEGEN_AI_PROVIDER";
pub const ENV_AUTO_SCHEMA: &str = "SITEGEN_AUTO_SCHEMA";

/// Env var holding the API key for a provider, e.g. `SITEGEN_OPENAI_API_KEY`.
pub fn api_key_env_var(provider: ProviderId) -> String {
    format!("SITEGEN_{}_API_KEY", provider.as_str().to_ascii_uppercase())
}

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub features: FeaturesSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deepseek_api_key: Option<String>,
    /// Provider request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl AiSection {
    pub fn api_key(&self, provider: ProviderId) -> Option<&str> {
        match provider {
            ProviderId::OpenAi => self.openai_api_key.as_deref(),
            ProviderId::Gemini => self.gemini_api_key.as_deref(),
            ProviderId::DeepSeek => self.deepseek_api_key.as_deref(),
        }
    }

    pub fn set_api_key(&mut self, provider: ProviderId, key: String) {
        let slot = match provider {
            ProviderId::OpenAi => &mut self.openai_api_key,
            ProviderId::Gemini => &mut self.gemini_api_key,
            ProviderId::DeepSeek => &mut self.deepseek_api_key,
        };
        *slot = Some(key);
    }
}

/// Sliding-window budget for AI requests, per provider.
///
/// The window lives in memory for the lifetime of one process. Every
/// `sitegen suggest` run is a new process making a single request, so these
/// limits only bite when several requests share a process (an embedding
/// service holding one `GenerationContext`); they are not a quota across
/// separate CLI runs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RateLimitSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_requests: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FeaturesSection {
    #[serde(default)]
    pub auto_schema: bool,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the sitegen config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/sitegen` or `~/.config/sitegen`,
/// also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("sitegen");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sitegen")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. `Ok(None)` when it does not exist; a
/// file that exists but does not parse is an error.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold API keys.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SitegenConfig {
    pub db_config: DbConfig,
    /// Named options consumed by `sitegen-core` (provider, keys, toggles,
    /// rate limits).
    pub settings: MapConfig,
    pub provider_params: ProviderParams,
}

impl SitegenConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `SITEGEN_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Provider: `cli_provider` > `SITEGEN_AI_PROVIDER` > `ai.provider` > unset (openai)
    /// - API keys: `SITEGEN_<PROVIDER>_API_KEY` > `ai.<provider>_api_key`
    /// - Schema markup: `SITEGEN_AUTO_SCHEMA` > `features.auto_schema`
    pub fn resolve(cli_db_url: Option<&str>, cli_provider: Option<&str>) -> Result<Self> {
        let file_config = load_config()?.unwrap_or_default();

        let db_url = match cli_db_url {
            Some(url) => url.to_string(),
            None => env_var(DbConfig::ENV_VAR).unwrap_or_else(|| file_config.database.url.clone()),
        };
        let db_config = DbConfig::new(db_url);

        let mut settings = MapConfig::new();

        let provider = cli_provider
            .map(str::to_string)
            .or_else(|| env_var(ENV_AI_PROVIDER))
            .or_else(|| file_config.ai.provider.clone());
        if let Some(provider) = provider {
            settings.set(settings::AI_PROVIDER, provider);
        }

        for id in ProviderId::ALL {
            let key = env_var(&api_key_env_var(id))
                .or_else(|| file_config.ai.api_key(id).map(str::to_string));
            if let Some(key) = key {
                settings.set(settings::api_key_option(id), key);
            }
        }

        let auto_schema = env_var(ENV_AUTO_SCHEMA)
            .and_then(|v| settings::parse_flag(&v))
            .unwrap_or(file_config.features.auto_schema);
        settings.set(settings::AUTO_SCHEMA, if auto_schema { "1" } else { "0" });

        if let Some(max) = file_config.rate_limit.max_requests {
            settings.set(settings::RATE_LIMIT_MAX_REQUESTS, max.to_string());
        }
        if let Some(secs) = file_config.rate_limit.window_secs {
            settings.set(settings::RATE_LIMIT_WINDOW_SECS, secs.to_string());
        }

        let mut provider_params = ProviderParams::default();
        if let Some(secs) = file_config.ai.timeout_secs.filter(|s| *s > 0) {
            provider_params = provider_params.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            db_config,
            settings,
            provider_params,
        })
    }
}

/// Non-empty env var value.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
