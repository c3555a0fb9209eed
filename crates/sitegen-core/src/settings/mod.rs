//! Settings lookup.
//!
//! Library code reads named options through [`ConfigProvider`] instead of
//! global state. The CLI resolves its config file and environment into a
//! [`MapConfig`].

use std::collections::HashMap;

use crate::provider::ProviderId;

/// Option holding the selected provider (`openai`, `gemini`, `deepseek`).
pub const AI_PROVIDER: &str = "ai_provider";
/// Toggle for the schema-markup post-creation hook.
pub const AUTO_SCHEMA: &str = "auto_schema";
pub const RATE_LIMIT_MAX_REQUESTS: &str = "rate_limit_max_requests";
pub const RATE_LIMIT_WINDOW_SECS: &str = "rate_limit_window_secs";

/// Option name holding the API key for a provider, e.g. `openai_api_key`.
pub fn api_key_option(provider: ProviderId) -> String {
    format!("{}_api_key", provider.as_str())
}

/// Read-only access to named settings.
pub trait ConfigProvider: Send + Sync {
    fn get_option(&self, name: &str) -> Option<String>;

    /// Interpret an option as a boolean flag. Unset or unrecognised values
    /// yield `default`.
    fn get_flag(&self, name: &str, default: bool) -> bool {
        self.get_option(name)
            .and_then(|v| parse_flag(&v))
            .unwrap_or(default)
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// A [`ConfigProvider`] backed by a plain map.
#[derive(Debug, Clone, Default)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MapConfig::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }
}

impl ConfigProvider for MapConfig {
    fn get_option(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
