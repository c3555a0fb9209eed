//! Sample field values for seed records of a new post type.

use chrono::{Local, NaiveDate};
use rand::Rng;
use serde_json::Value;

use super::types::{FieldSpec, FieldType};

pub const SAMPLE_URL: &str = "https://example.com";
pub const SAMPLE_IMAGE_URL: &str = "https://via.placeholder.com/300x200";

/// Synthesize a value for `field`.
///
/// Numbers are drawn uniformly from 1..=100; dates are `today` as
/// `YYYY-MM-DD`. Everything else is derived from the field's label.
pub fn sample_value<R: Rng + ?Sized>(field: &FieldSpec, today: NaiveDate, rng: &mut R) -> String {
    let label = field.display_label();
    match field.field_type {
        FieldType::Number => rng.random_range(1..=100u32).to_string(),
        FieldType::Date => today.format("%Y-%m-%d").to_string(),
        FieldType::Url => SAMPLE_URL.to_string(),
        FieldType::Image => SAMPLE_IMAGE_URL.to_string(),
        FieldType::Textarea => format!("This is sample content for the {label} field."),
        FieldType::Text | FieldType::Select => format!("Sample {label}"),
    }
}

/// [`sample_value`] using the local date and the thread RNG.
pub fn sample_value_now(field: &FieldSpec) -> String {
    sample_value(field, Local::now().date_naive(), &mut rand::rng())
}

/// Render an explicit sample value supplied by the provider.
///
/// `null` and empty strings mean "not provided".
pub fn explicit_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
