//! The `ProviderClient` trait, implemented once per AI backend.

use async_trait::async_trait;

use super::types::ProviderId;

/// A chat-style completion backend.
///
/// # Object Safety
///
/// Object-safe so clients can be stored as `Box<dyn ProviderClient>` in the
/// [`super::ProviderRegistry`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Send `prompt` and return the model's text.
    ///
    /// Every failure (network, timeout, error status, unexpected body, empty
    /// text) is logged without the key and returned as `None`.
    async fn complete(&self, prompt: &str, api_key: &str) -> Option<String>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ProviderClient) {}
};
