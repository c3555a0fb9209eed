//! Query functions, one module per table.

pub mod content_types;
pub mod meta;
pub mod records;
