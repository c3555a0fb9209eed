//! Shared HTTP plumbing for provider clients.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{ProviderError, ProviderId, ProviderParams};

/// How the API key travels with the request.
#[derive(Clone, Copy)]
pub(crate) enum Auth<'a> {
    Bearer(&'a str),
    /// `?key=...` query parameter.
    QueryKey(&'a str),
}

#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(params: &ProviderParams) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(params.timeout)
            .use_rustls_tls()
            .build()
            .map_err(ProviderError::Client)?;
        Ok(Self { client })
    }

    /// POST a JSON body and decode a JSON response.
    ///
    /// Every failure (transport, timeout, non-2xx, undecodable body) is
    /// logged and collapsed into `None`. The API key is never logged:
    /// `endpoint` is the URL without credentials.
    pub(crate) async fn post_json<B, R>(
        &self,
        provider: ProviderId,
        endpoint: &str,
        auth: Auth<'_>,
        body: &B,
    ) -> Option<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(endpoint).json(body);
        request = match auth {
            Auth::Bearer(key) => request.bearer_auth(key),
            Auth::QueryKey(key) => request.query(&[("key", key)]),
        };

        debug!(%provider, endpoint, "sending provider request");
        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                let timeout = e.is_timeout();
                let e = e.without_url();
                warn!(%provider, endpoint, timeout, error = %e, "provider request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%provider, endpoint, status = status.as_u16(), "provider returned an error status");
            return None;
        }

        match response.json::<R>().await {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                let e = e.without_url();
                warn!(%provider, endpoint, error = %e, "provider response body could not be decoded");
                None
            }
        }
    }
}
