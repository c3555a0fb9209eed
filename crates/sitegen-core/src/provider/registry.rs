//! Provider registry: the set of clients available to the service.

use std::collections::HashMap;

use super::gemini::GeminiClient;
use super::openai::ChatCompletionsClient;
use super::trait_def::ProviderClient;
use super::types::{ProviderError, ProviderId, ProviderParams};

/// Registered [`ProviderClient`]s keyed by [`ProviderId`].
#[derive(Default)]
pub struct ProviderRegistry {
    clients: HashMap<ProviderId, Box<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the OpenAI, Gemini, and DeepSeek clients at their
    /// public endpoints.
    pub fn with_defaults(params: ProviderParams) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        registry.register(ChatCompletionsClient::openai(params)?);
        registry.register(GeminiClient::new(params)?);
        registry.register(ChatCompletionsClient::deepseek(params)?);
        Ok(registry)
    }

    /// Register a client under its [`ProviderClient::id`], returning the one
    /// it replaced.
    pub fn register(
        &mut self,
        client: impl ProviderClient + 'static,
    ) -> Option<Box<dyn ProviderClient>> {
        self.clients.insert(client.id(), Box::new(client))
    }

    pub fn get(&self, id: ProviderId) -> Option<&dyn ProviderClient> {
        self.clients.get(&id).map(|c| c.as_ref())
    }

    /// Registered provider IDs, sorted.
    pub fn list(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("clients", &self.list())
            .finish()
    }
}
