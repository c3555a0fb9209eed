//! Content plans: prompt, parsing, selection tokens, materialization.

pub mod materialize;
pub mod parser;
pub mod prompt;
pub mod samples;
pub mod selection;
pub mod slug;
pub mod types;

pub use materialize::{MaterializeOptions, MaterializeReport, Materializer};
pub use parser::{extract_json_object, parse_content_plan};
pub use prompt::{BusinessInputs, InputError, build_prompt};
pub use samples::{sample_value, sample_value_now};
pub use selection::SelectionError;
pub use slug::slugify;
pub use types::{
    BusinessAnalysis, ContentPlan, FieldSpec, FieldType, PageSuggestion, PostTypeSuggestion,
    SampleEntry,
};
