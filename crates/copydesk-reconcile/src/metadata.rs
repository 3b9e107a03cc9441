use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::{
    count_field, list_field, lookup, number_field, text_field, HASHTAG_SEPARATOR,
    KEYWORD_SEPARATOR, NOTE_SEPARATOR,
};

/// Structured content metadata flattened to scalar form fields.
///
/// List-like fields hold a single string: hashtags separated by one space,
/// SEO keywords by `", "`. Absent fields are `""` or `0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    pub hashtags: String,
    pub call_to_action: String,
    pub summary: String,
    pub character_count: u64,
    pub platform_tips: String,
    pub confidence_score: f64,
    pub optimization_notes: String,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: String,
}

/// Flatten a metadata payload. Unknown keys are ignored.
pub fn reconcile_metadata(payload: &Map<String, Value>) -> NormalizedMetadata {
    NormalizedMetadata {
        hashtags: list_field(lookup(payload, &["hashtags"]), HASHTAG_SEPARATOR),
        call_to_action: text_field(lookup(payload, &["call_to_action", "callToAction"])),
        summary: text_field(lookup(payload, &["summary"])),
        character_count: count_field(lookup(payload, &["character_count", "characterCount"])),
        platform_tips: list_field(lookup(payload, &["platform_tips", "platformTips"]), NOTE_SEPARATOR),
        confidence_score: number_field(lookup(payload, &["confidence_score", "confidenceScore"])),
        optimization_notes: list_field(
            lookup(payload, &["optimization_notes", "optimizationNotes"]),
            NOTE_SEPARATOR,
        ),
        seo_title: text_field(lookup(payload, &["seo_title", "seoTitle"])),
        seo_description: text_field(lookup(payload, &["seo_description", "seoDescription"])),
        seo_keywords: list_field(lookup(payload, &["seo_keywords", "seoKeywords"]), KEYWORD_SEPARATOR),
    }
}

impl NormalizedMetadata {
    /// Back to a JSON object with the payload key names
    pub fn to_payload(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
