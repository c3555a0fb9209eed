//! Prompt construction for content-plan generation.
//!
//! Pure logic: validates business inputs and assembles the instruction
//! string sent to the provider. No I/O.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Maximum length of the business type, in characters.
pub const MAX_BUSINESS_TYPE_LEN: usize = 100;
/// Maximum length of the business details, in characters.
pub const MAX_BUSINESS_DETAILS_LEN: usize = 2000;
/// Maximum length of the SEO keywords and target audience, in characters.
pub const MAX_OPTIONAL_INPUT_LEN: usize = 500;

/// Business description supplied by the administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessInputs {
    pub business_type: String,
    pub business_details: String,
    pub seo_keywords: String,
    pub target_audience: String,
}

/// Rejected business input. Inputs are never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be at most {max} characters (got {len})")]
    TooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
}

impl BusinessInputs {
    pub fn new(business_type: impl Into<String>, business_details: impl Into<String>) -> Self {
        Self {
            business_type: business_type.into(),
            business_details: business_details.into(),
            ..Default::default()
        }
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.seo_keywords = keywords.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = audience.into();
        self
    }

    /// Check required fields and length limits.
    pub fn validate(&self) -> Result<(), InputError> {
        require("business type", &self.business_type)?;
        require("business details", &self.business_details)?;
        limit("business type", &self.business_type, MAX_BUSINESS_TYPE_LEN)?;
        limit(
            "business details",
            &self.business_details,
            MAX_BUSINESS_DETAILS_LEN,
        )?;
        limit("SEO keywords", &self.seo_keywords, MAX_OPTIONAL_INPUT_LEN)?;
        limit("target audience", &self.target_audience, MAX_OPTIONAL_INPUT_LEN)?;
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::Missing { field });
    }
    Ok(())
}

fn limit(field: &'static str, value: &str, max: usize) -> Result<(), InputError> {
    let len = value.chars().count();
    if len > max {
        return Err(InputError::TooLong { field, max, len });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Output contract appended to every prompt.
const OUTPUT_FORMAT: &str = r#"## Output Format

Respond with a single JSON object and nothing else, using exactly this structure:

{
  "business_analysis": {
    "business_model": "short description of how the business operates",
    "content_needs": "what content the website must cover",
    "audience_insights": "who the visitors are and what they look for"
  },
  "standard_pages": [
    {
      "title": "Page title",
      "meta_description": "SEO meta description, at most 160 characters",
      "reasoning": "why this page helps the business",
      "hierarchy_level": 0
    }
  ],
  "custom_post_types": [
    {
      "name": "machine_name",
      "label": "Display Name",
      "description": "what this content type stores",
      "reasoning": "why a dedicated content type is useful",
      "fields": [
        {
          "name": "field_name",
          "label": "Field Label",
          "type": "text",
          "description": "what the field holds",
          "required": false
        }
      ],
      "sample_entries": [
        {"title": "Example entry", "content": "Example body text"}
      ]
    }
  ]
}

### Rules
- `hierarchy_level` is 0 for top-level pages; a page at level N is a child of the closest preceding page at level N-1.
- List pages in the order they should be created, parents before their children.
- Custom post type `name`: lowercase letters, digits and underscores only, starting with a letter, at most 20 characters. Never use reserved names such as post, page, attachment, revision or nav_menu_item.
- Field `type` must be one of: text, textarea, select, image, url, number, date.
- Suggest custom post types only for repeating structured content (services, team members, locations, testimonials).
"#;

/// Build the full instruction string for a validated set of inputs.
///
/// Deterministic: identical inputs produce identical prompts. Values are
/// embedded verbatim; call [`BusinessInputs::validate`] first.
pub fn build_prompt(inputs: &BusinessInputs) -> String {
    let mut prompt = String::with_capacity(2048 + inputs.business_details.len());

    prompt.push_str(
        "You are an SEO and information-architecture expert planning a new website. \
         Analyze the business below and propose the standard pages and custom post \
         types the site needs.\n\n",
    );

    prompt.push_str("## Business\n\n");
    prompt.push_str(&format!("- **Business type:** {}\n", inputs.business_type));
    prompt.push_str(&format!(
        "- **Business details:** {}\n",
        inputs.business_details
    ));
    if !inputs.seo_keywords.trim().is_empty() {
        prompt.push_str(&format!("- **SEO keywords:** {}\n", inputs.seo_keywords));
    }
    if !inputs.target_audience.trim().is_empty() {
        prompt.push_str(&format!(
            "- **Target audience:** {}\n",
            inputs.target_audience
        ));
    }
    prompt.push('\n');

    prompt.push_str(OUTPUT_FORMAT);
    prompt
}
