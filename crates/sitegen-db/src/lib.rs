//! PostgreSQL persistence for sitegen content records and content types.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
