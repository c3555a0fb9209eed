//! AI provider clients.
//!
//! ```text
//! service --get(ProviderId)--> ProviderRegistry --> &dyn ProviderClient
//!                                                      |
//!                          complete(prompt, key) ------+--> Option<String>
//! ```
//!
//! Clients never return transport errors to the caller: any failure is
//! logged and reported as `None`.

mod http;

pub mod gemini;
pub mod openai;
pub mod registry;
pub mod trait_def;
pub mod types;

pub use gemini::GeminiClient;
pub use openai::ChatCompletionsClient;
pub use registry::ProviderRegistry;
pub use trait_def::ProviderClient;
pub use types::{ProviderError, ProviderId, ProviderParams, validate_api_key};
