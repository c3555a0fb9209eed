//! Pipeline service: the two entry points behind the CLI.
//!
//! - [`generate_advanced_content`]: business inputs to a [`ContentPlan`]
//!   via the configured AI provider.
//! - [`create_advanced_content`]: selection tokens to draft records.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::hooks::PostCreateHooks;
use crate::plan::selection::{decode_pages, decode_post_types};
use crate::plan::{
    BusinessInputs, ContentPlan, MaterializeOptions, MaterializeReport, Materializer,
    build_prompt, parse_content_plan,
};
use crate::provider::{ProviderError, ProviderId, ProviderParams, ProviderRegistry, validate_api_key};
use crate::rate::{RateLimitConfig, RateLimiter};
use crate::settings::{self, ConfigProvider};
use crate::store::ContentStore;

/// Provider used when `ai_provider` is unset.
pub const DEFAULT_PROVIDER: ProviderId = ProviderId::OpenAi;

/// Everything plan generation needs, shared across requests.
#[derive(Clone)]
pub struct GenerationContext {
    pub settings: Arc<dyn ConfigProvider>,
    pub providers: Arc<ProviderRegistry>,
    pub limiter: Arc<RateLimiter>,
}

impl GenerationContext {
    pub fn new(
        settings: Arc<dyn ConfigProvider>,
        providers: ProviderRegistry,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            settings,
            providers: Arc::new(providers),
            limiter,
        }
    }

    /// Default provider clients and a limiter tuned from `settings`.
    pub fn from_settings(
        settings: Arc<dyn ConfigProvider>,
        params: ProviderParams,
    ) -> Result<Self, ProviderError> {
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::from_settings(
            settings.as_ref(),
        )));
        let providers = ProviderRegistry::with_defaults(params)?;
        Ok(Self::new(settings, providers, limiter))
    }
}

impl std::fmt::Debug for GenerationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationContext")
            .field("providers", &self.providers)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported AI provider {0:?}")]
    UnsupportedProvider(String),

    #[error("no API key configured for {0}")]
    MissingApiKey(ProviderId),

    #[error("the configured {0} API key is malformed")]
    InvalidApiKey(ProviderId),

    #[error("rate limit reached for {0}")]
    RateLimited(ProviderId),

    #[error("the AI provider returned no suggestions")]
    NoSuggestions,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GenerateError {
    /// Message safe to show to the operator. Internal details stay in the
    /// log.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Please check your input: {msg}."),
            Self::UnsupportedProvider(name) => {
                format!("AI provider {name:?} is not supported. Choose openai, gemini or deepseek.")
            }
            Self::MissingApiKey(provider) => {
                format!("No API key is configured for {provider}. Add one in the settings.")
            }
            Self::InvalidApiKey(provider) => {
                format!("The {provider} API key looks malformed. Check the settings.")
            }
            Self::RateLimited(_) => {
                "Too many AI requests. Please wait a minute and try again.".to_string()
            }
            Self::NoSuggestions => {
                "The AI provider did not return any suggestions. Please try again.".to_string()
            }
            Self::Internal(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Resolve the configured provider, falling back to [`DEFAULT_PROVIDER`].
pub fn configured_provider(settings: &dyn ConfigProvider) -> Result<ProviderId, GenerateError> {
    match settings
        .get_option(settings::AI_PROVIDER)
        .filter(|name| !name.trim().is_empty())
    {
        None => Ok(DEFAULT_PROVIDER),
        Some(name) => name
            .parse()
            .map_err(|_| GenerateError::UnsupportedProvider(name)),
    }
}

/// Ask the configured provider for a content plan.
///
/// Checks run in order and abort before any network call: input limits,
/// provider selection, API key presence and format, rate limit. A provider
/// failure is [`GenerateError::NoSuggestions`]; an unparsable reply is an
/// empty plan.
pub async fn generate_advanced_content(
    ctx: &GenerationContext,
    inputs: &BusinessInputs,
) -> Result<ContentPlan, GenerateError> {
    inputs
        .validate()
        .map_err(|e| GenerateError::InvalidInput(e.to_string()))?;

    let provider = configured_provider(ctx.settings.as_ref())?;
    let Some(client) = ctx.providers.get(provider) else {
        let err = GenerateError::Internal(anyhow::anyhow!(
            "no client registered for provider {provider}"
        ));
        error!(error = %err, "content generation failed");
        return Err(err);
    };

    let api_key = ctx
        .settings
        .get_option(&settings::api_key_option(provider))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .ok_or(GenerateError::MissingApiKey(provider))?;
    validate_api_key(provider, &api_key).map_err(|e| {
        warn!(error = %e, "rejecting API key");
        GenerateError::InvalidApiKey(provider)
    })?;

    if !ctx.limiter.allow(provider) {
        return Err(GenerateError::RateLimited(provider));
    }

    let prompt = build_prompt(inputs);
    info!(%provider, business_type = %inputs.business_type, "requesting content plan");
    let raw = client
        .complete(&prompt, &api_key)
        .await
        .ok_or(GenerateError::NoSuggestions)?;

    let plan = parse_content_plan(&raw);
    if plan.is_actionable() {
        info!(
            %provider,
            pages = plan.pages.len(),
            post_types = plan.custom_post_types.len(),
            "content plan generated"
        );
    } else {
        warn!(%provider, "provider reply contained no usable suggestions");
    }
    Ok(plan)
}

/// Materialize the operator's selection.
///
/// Tokens that fail to decode are skipped. The schema hook runs when the
/// `auto_schema` setting is on. Never fails; per-item failures show up as
/// skips in the report.
pub async fn create_advanced_content(
    store: &dyn ContentStore,
    settings: &dyn ConfigProvider,
    selected_pages: &[String],
    selected_post_types: &[String],
    generate_images: bool,
) -> MaterializeReport {
    let pages = decode_pages(selected_pages);
    let post_types = decode_post_types(selected_post_types);
    let hooks = PostCreateHooks::from_settings(settings);

    Materializer::new(store, &hooks)
        .materialize(&pages, &post_types, MaterializeOptions { generate_images })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderClient;
    use crate::settings::MapConfig;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OPENAI_KEY: &str = "sk-abcdefghijklmnopqrstuvwxyz";

    struct ScriptedClient {
        id: ProviderId,
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProviderClient for ScriptedClient {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn complete(&self, _prompt: &str, _api_key: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.map(str::to_string)
        }
    }

    fn context(settings: MapConfig, reply: Option<&'static str>) -> (GenerationContext, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ProviderRegistry::new();
        registry.register(ScriptedClient {
            id: ProviderId::OpenAi,
            reply,
            calls: calls.clone(),
        });
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        }));
        (
            GenerationContext::new(Arc::new(settings), registry, limiter),
            calls,
        )
    }

    fn inputs() -> BusinessInputs {
        BusinessInputs::new("Bakery", "Sourdough and pastries")
    }

    fn keyed() -> MapConfig {
        MapConfig::new().with("openai_api_key", OPENAI_KEY)
    }

    #[tokio::test]
    async fn returns_parsed_plan() {
        let (ctx, calls) = context(keyed(), Some("Sure! {\"standard_pages\":[{\"title\":\"Menu\"}]}"));
        let plan = generate_advanced_content(&ctx, &inputs()).await.unwrap();
        assert_eq!(plan.pages[0].title, "Menu");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unparsable_reply_is_an_empty_plan() {
        let (ctx, _) = context(keyed(), Some("I cannot help with that."));
        let plan = generate_advanced_content(&ctx, &inputs()).await.unwrap();
        assert!(!plan.is_actionable());
    }

    #[tokio::test]
    async fn provider_failure_is_no_suggestions() {
        let (ctx, _) = context(keyed(), None);
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::NoSuggestions));
    }

    #[tokio::test]
    async fn invalid_input_aborts_before_network() {
        let (ctx, calls) = context(keyed(), Some("{}"));
        let bad = BusinessInputs::new("x".repeat(101), "details");
        let err = generate_advanced_content(&ctx, &bad).await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn key_problems_abort_before_network() {
        let (ctx, calls) = context(MapConfig::new(), Some("{}"));
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingApiKey(ProviderId::OpenAi)));

        let (ctx, _) = context(MapConfig::new().with("openai_api_key", "not-a-key"), Some("{}"));
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::InvalidApiKey(ProviderId::OpenAi)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_or_unregistered_provider() {
        let (ctx, _) = context(keyed().with(settings::AI_PROVIDER, "claude"), Some("{}"));
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedProvider(ref n) if n == "claude"));

        let (ctx, _) = context(keyed().with(settings::AI_PROVIDER, "gemini"), Some("{}"));
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::Internal(_)));
        assert_eq!(err.user_message(), "An unexpected error occurred. Please try again.");
    }

    #[tokio::test]
    async fn rate_limit_aborts_before_network() {
        let (ctx, calls) = context(keyed(), Some("{}"));
        generate_advanced_content(&ctx, &inputs()).await.unwrap();
        generate_advanced_content(&ctx, &inputs()).await.unwrap();
        let err = generate_advanced_content(&ctx, &inputs()).await.unwrap_err();
        assert!(matches!(err, GenerateError::RateLimited(ProviderId::OpenAi)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn configured_provider_defaults_to_openai() {
        assert_eq!(configured_provider(&MapConfig::new()).unwrap(), ProviderId::OpenAi);
        let cfg = MapConfig::new().with(settings::AI_PROVIDER, " ");
        assert_eq!(configured_provider(&cfg).unwrap(), ProviderId::OpenAi);
        let cfg = MapConfig::new().with(settings::AI_PROVIDER, "DeepSeek");
        assert_eq!(configured_provider(&cfg).unwrap(), ProviderId::DeepSeek);
    }

    #[test]
    fn user_messages_do_not_leak_details() {
        let err = GenerateError::Internal(anyhow::anyhow!("db password is hunter2"));
        assert!(!err.user_message().contains("hunter2"));
        assert!(GenerateError::RateLimited(ProviderId::Gemini)
            .user_message()
            .contains("wait"));
    }

    #[tokio::test]
    async fn create_skips_bad_tokens() {
        let store = MemoryStore::new();
        let pages = vec![
            r#"{"title":"Home","hierarchy_level":0}"#.to_string(),
            "garbage".to_string(),
            r#"{"title":"Team","hierarchy_level":1}"#.to_string(),
        ];
        let types = vec![r#"{"name":"staff","label":"Staff"}"#.to_string()];
        let settings = MapConfig::new().with(settings::AUTO_SCHEMA, "yes");

        let report = create_advanced_content(&store, &settings, &pages, &types, false).await;
        assert_eq!(report.created_pages, 2);
        assert_eq!(report.created_types, 1);
        assert_eq!(report.images_requested, 0);

        let home = store.records().into_iter().find(|r| r.title == "Home").unwrap();
        assert!(store.meta(home.id).contains_key(crate::hooks::SCHEMA_MARKUP_META));
        assert_eq!(store.children_of(home.id)[0].title, "Team");
    }
}
