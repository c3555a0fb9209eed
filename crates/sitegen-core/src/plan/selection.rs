//! Selection tokens: one compact JSON object per suggestion the operator
//! chose to keep.
//!
//! Tokens round-trip through an untrusted boundary (a file the operator
//! edits, a form field), so decoding skips bad tokens instead of failing
//! the batch. The materializer re-validates everything it receives.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use super::types::{PageSuggestion, PostTypeSuggestion};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("failed to encode selection token: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn encode_page(page: &PageSuggestion) -> Result<String, SelectionError> {
    Ok(serde_json::to_string(page)?)
}

pub fn encode_post_type(post_type: &PostTypeSuggestion) -> Result<String, SelectionError> {
    Ok(serde_json::to_string(post_type)?)
}

/// Decode page tokens, skipping any that are not a valid page object.
pub fn decode_pages(tokens: &[String]) -> Vec<PageSuggestion> {
    decode_tokens(tokens, "page")
}

/// Decode post-type tokens, skipping any that are not a valid post type.
pub fn decode_post_types(tokens: &[String]) -> Vec<PostTypeSuggestion> {
    decode_tokens(tokens, "post_type")
}

fn decode_tokens<T: DeserializeOwned>(tokens: &[String], kind: &str) -> Vec<T> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(index, token)| match serde_json::from_str::<T>(token) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(kind, index, error = %e, "skipping undecodable selection token");
                None
            }
        })
        .collect()
}

/// Split a selection file into tokens: one per line, ignoring blank lines
/// and `#` comments.
pub fn read_tokens(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::types::{FieldSpec, FieldType};

    #[test]
    fn page_token_is_compact_single_line() {
        let page = PageSuggestion {
            title: "About Us".into(),
            meta_description: "Who we are".into(),
            reasoning: "Trust".into(),
            hierarchy_level: 1,
        };
        let token = encode_page(&page).unwrap();
        assert!(!token.contains('\n'));
        assert_eq!(decode_pages(&[token]), vec![page]);
    }

    #[test]
    fn post_type_token_keeps_fields() {
        let cpt = PostTypeSuggestion {
            name: "service".into(),
            label: "Services".into(),
            fields: vec![FieldSpec {
                name: "price".into(),
                field_type: FieldType::Number,
                ..Default::default()
            }],
            ..Default::default()
        };
        let token = encode_post_type(&cpt).unwrap();
        assert!(token.contains("\"type\":\"number\""));
        let decoded = decode_post_types(&[token]);
        assert_eq!(decoded[0].fields[0].field_type, FieldType::Number);
    }

    #[test]
    fn bad_tokens_are_skipped() {
        let tokens = vec![
            r#"{"title":"Home"}"#.to_string(),
            "not json".to_string(),
            r#"["an","array"]"#.to_string(),
            r#"{"title":"Contact","hierarchy_level":0}"#.to_string(),
        ];
        let pages = decode_pages(&tokens);
        let titles: Vec<&str> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Home", "Contact"]);
    }

    #[test]
    fn read_tokens_skips_blanks_and_comments() {
        let content = "# pages\n{\"title\":\"Home\"}\n\n   \n# {\"title\":\"Dropped\"}\n  {\"title\":\"About\"}  \n";
        let tokens = read_tokens(content);
        assert_eq!(tokens, vec!["{\"title\":\"Home\"}", "{\"title\":\"About\"}"]);
    }
}
