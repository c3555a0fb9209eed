//! Content plan types.
//!
//! These map directly to the JSON contract requested from the AI provider
//! (`business_analysis`, `standard_pages[]`, `custom_post_types[]`) and are
//! also the wire format of selection tokens. Every field has a default so a
//! partially filled suggestion still decodes; validation happens at
//! materialization time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};

/// Recommended upper bound for page meta descriptions, in characters.
pub const META_DESCRIPTION_ADVISORY_LEN: usize = 160;

/// Root artifact parsed from a provider response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_analysis: Option<BusinessAnalysis>,
    #[serde(default, rename = "standard_pages")]
    pub pages: Vec<PageSuggestion>,
    #[serde(default)]
    pub custom_post_types: Vec<PostTypeSuggestion>,
}

impl ContentPlan {
    /// Whether there is anything to materialize.
    pub fn is_actionable(&self) -> bool {
        !self.pages.is_empty() || !self.custom_post_types.is_empty()
    }
}

/// Free-text analysis the provider returns alongside its suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessAnalysis {
    #[serde(default, alias = "businessModel")]
    pub business_model: String,
    #[serde(default, alias = "contentNeeds")]
    pub content_needs: String,
    #[serde(default, alias = "audienceInsights")]
    pub audience_insights: String,
}

/// A suggested standard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSuggestion {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "metaDescription")]
    pub meta_description: String,
    #[serde(default, alias = "seo_rationale")]
    pub reasoning: String,
    /// 0 = top level; N = child of the latest page created at level N-1.
    #[serde(
        default,
        alias = "hierarchyLevel",
        deserialize_with = "deserialize_level"
    )]
    pub hierarchy_level: usize,
}

impl PageSuggestion {
    /// Advisory only: the description exceeds the recommended length.
    pub fn meta_description_too_long(&self) -> bool {
        self.meta_description.chars().count() > META_DESCRIPTION_ADVISORY_LEN
    }
}

/// A suggested custom post type with its field schema and seed entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostTypeSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default, alias = "sampleEntries")]
    pub sample_entries: Vec<SampleEntry>,
}

/// One custom field of a post type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    /// The label, or the machine name when the label is blank.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// An example record used to seed a newly registered post type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Explicit sample values keyed by field name. Fields missing here get a
    /// synthesized value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// Supported custom field types. Unknown type names decode as [`FieldType::Text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    #[default]
    Text,
    Textarea,
    Select,
    Image,
    Url,
    Number,
    Date,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Image => "image",
            Self::Url => "url",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    /// Lenient: case-insensitive, anything unrecognised is `Text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "image" => Self::Image,
            "url" => Self::Url,
            "number" => Self::Number,
            "date" => Self::Date,
            _ => Self::Text,
        })
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => s.parse().unwrap_or_default(),
            _ => FieldType::Text,
        })
    }
}

/// Accepts integers, numeric strings, and floats; negatives and anything
/// else collapse to 0.
fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let level = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.floor() as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(usize::try_from(level).unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_defaults_missing_fields() {
        let page: PageSuggestion = serde_json::from_value(json!({"title": "Home"})).unwrap();
        assert_eq!(page.title, "Home");
        assert_eq!(page.hierarchy_level, 0);
        assert!(page.meta_description.is_empty());
    }

    #[test]
    fn page_accepts_camel_case_aliases() {
        let page: PageSuggestion = serde_json::from_value(json!({
            "title": "Pricing",
            "metaDescription": "Plans and prices",
            "hierarchyLevel": 2
        }))
        .unwrap();
        assert_eq!(page.meta_description, "Plans and prices");
        assert_eq!(page.hierarchy_level, 2);
    }

    #[test]
    fn hierarchy_level_is_lenient() {
        for (raw, expected) in [
            (json!("3"), 3),
            (json!(1.7), 1),
            (json!(-2), 0),
            (json!(null), 0),
            (json!("deep"), 0),
        ] {
            let page: PageSuggestion =
                serde_json::from_value(json!({"title": "x", "hierarchy_level": raw})).unwrap();
            assert_eq!(page.hierarchy_level, expected);
        }
    }

    #[test]
    fn unknown_field_type_is_text() {
        let field: FieldSpec =
            serde_json::from_value(json!({"name": "color", "type": "colour-picker"})).unwrap();
        assert_eq!(field.field_type, FieldType::Text);

        let field: FieldSpec =
            serde_json::from_value(json!({"name": "when", "type": "DATE"})).unwrap();
        assert_eq!(field.field_type, FieldType::Date);
    }

    #[test]
    fn plan_uses_standard_pages_key() {
        let plan = ContentPlan {
            pages: vec![PageSuggestion {
                title: "Home".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["standard_pages"][0]["title"], "Home");
        assert!(value.get("business_analysis").is_none());
        assert!(plan.is_actionable());
        assert!(!ContentPlan::default().is_actionable());
    }

    #[test]
    fn long_meta_description_is_flagged() {
        let page = PageSuggestion {
            meta_description: "x".repeat(161),
            ..Default::default()
        };
        assert!(page.meta_description_too_long());
    }

    #[test]
    fn display_label_falls_back_to_name() {
        let field = FieldSpec {
            name: "price".into(),
            label: "  ".into(),
            ..Default::default()
        };
        assert_eq!(field.display_label(), "price");
    }
}
