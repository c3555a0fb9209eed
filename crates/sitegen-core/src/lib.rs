//! Core of sitegen: turning AI content suggestions into draft pages and
//! custom post types.
//!
//! ```text
//! BusinessInputs --prompt--> ProviderClient --raw text--> parser --> ContentPlan
//!                       (RateLimiter gate)                               |
//!                                                      selection tokens  v
//!                                         ContentStore <-- Materializer
//! ```

pub mod hooks;
pub mod plan;
pub mod provider;
pub mod rate;
pub mod service;
pub mod settings;
pub mod store;
