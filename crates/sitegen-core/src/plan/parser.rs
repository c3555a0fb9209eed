//! Response parser: raw provider text to [`ContentPlan`].
//!
//! Providers do not reliably return bare JSON, so the payload is located by
//! slicing from the first `{` to the last `}`. Anything that cannot be
//! decoded degrades to an empty plan; this function never fails.
//!
//! Known limitation: two separate JSON objects, or a stray `}` in trailing
//! prose, make the slice invalid and the result is an empty plan.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{BusinessAnalysis, ContentPlan, PageSuggestion, PostTypeSuggestion};

/// Slice from the first `{` to the last `}` inclusive, if both exist in
/// that order.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse a provider response into a content plan.
///
/// Missing top-level keys default to empty collections. Individual entries
/// that fail to decode are dropped without affecting their siblings.
pub fn parse_content_plan(raw: &str) -> ContentPlan {
    let Some(payload) = extract_json_object(raw) else {
        debug!(len = raw.len(), "no JSON object found in provider response");
        return ContentPlan::default();
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "provider response is not valid JSON");
            return ContentPlan::default();
        }
    };

    let Value::Object(map) = value else {
        warn!("provider response JSON is not an object");
        return ContentPlan::default();
    };

    let business_analysis = map
        .get("business_analysis")
        .filter(|v| v.is_object())
        .and_then(|v| decode_entry::<BusinessAnalysis>(v, "business_analysis", 0));

    ContentPlan {
        business_analysis,
        pages: decode_list::<PageSuggestion>(map.get("standard_pages"), "standard_pages"),
        custom_post_types: decode_list::<PostTypeSuggestion>(
            map.get("custom_post_types"),
            "custom_post_types",
        ),
    }
}

fn decode_list<T: DeserializeOwned>(value: Option<&Value>, key: &str) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| decode_entry(item, key, index))
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!(key, "expected an array in provider response, ignoring");
            Vec::new()
        }
    }
}

fn decode_entry<T: DeserializeOwned>(item: &Value, key: &str, index: usize) -> Option<T> {
    match T::deserialize(item) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(key, index, error = %e, "dropping undecodable entry");
            None
        }
    }
}
