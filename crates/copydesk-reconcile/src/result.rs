use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use copydesk_types::GenerationKind;

use crate::error::{ReconcileError, Result};
use crate::fields::{array_field, lookup, object_field, parse_object, text_field};
use crate::metadata::{reconcile_metadata, NormalizedMetadata};

/// Keys an agent may wrap the actual result object in
const WRAPPER_KEYS: [&str; 3] = ["result", "data", "content"];

/// Bookkeeping keys that may sit beside a wrapper without being part of the result
const ENVELOPE_KEYS: [&str; 6] = ["usage", "model", "agent", "status", "finish_reason", "request_id"];

/// A finished generation in editable form, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum GenerationResult {
    CustomerProfile(Map<String, Value>),
    BrandIdentity(Map<String, Value>),
    Worksheet(String),
    SocialContent(SocialContentForm),
}

/// Master content plus its per-platform variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialContentForm {
    pub core_message: String,
    pub metadata: NormalizedMetadata,
    pub variants: Vec<VariantForm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantForm {
    pub platform: String,
    pub content: String,
    pub metadata: NormalizedMetadata,
}

impl GenerationResult {
    /// Build the editable result from a `done` payload and the text
    /// accumulated from `chunk` events.
    ///
    /// Object fields are used directly and strings holding a JSON object are
    /// parsed. An empty payload falls back to the accumulated text.
    pub fn from_payload(
        kind: GenerationKind,
        payload: &Map<String, Value>,
        accumulated_text: &str,
    ) -> Result<Self> {
        let result = match kind {
            GenerationKind::CustomerProfile => {
                Self::CustomerProfile(result_object(kind, payload, accumulated_text)?)
            }
            GenerationKind::BrandIdentity => {
                Self::BrandIdentity(result_object(kind, payload, accumulated_text)?)
            }
            GenerationKind::Worksheet => Self::Worksheet(worksheet_text(kind, payload, accumulated_text)?),
            GenerationKind::SocialContent => {
                let source = result_object(kind, payload, accumulated_text)?;
                Self::SocialContent(SocialContentForm::from_object(&source))
            }
        };

        tracing::debug!(kind = %kind, "Reconciled generation result");
        Ok(result)
    }

    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::CustomerProfile(_) => GenerationKind::CustomerProfile,
            Self::BrandIdentity(_) => GenerationKind::BrandIdentity,
            Self::Worksheet(_) => GenerationKind::Worksheet,
            Self::SocialContent(_) => GenerationKind::SocialContent,
        }
    }
}

impl SocialContentForm {
    pub fn from_object(source: &Map<String, Value>) -> Self {
        let core_message = match lookup(source, &["core_message", "coreMessage", "master_content"]) {
            Some(Value::Object(inner)) => {
                text_field(lookup(inner, &["core_message", "coreMessage", "content"]))
            }
            other => text_field(other),
        };

        let metadata = metadata_of(source);

        let variants = array_field(lookup(source, &["variants", "platform_variants"]))
            .iter()
            .filter_map(Value::as_object)
            .map(VariantForm::from_object)
            .collect();

        Self {
            core_message,
            metadata,
            variants,
        }
    }
}

impl VariantForm {
    pub fn from_object(source: &Map<String, Value>) -> Self {
        let content = match source.get("content") {
            Some(Value::Object(inner)) => text_field(inner.get("content")),
            other => text_field(other),
        };
        Self {
            platform: text_field(source.get("platform")),
            content,
            metadata: metadata_of(source),
        }
    }
}

/// Metadata from a nested `metadata` object, else from the object's own fields
fn metadata_of(source: &Map<String, Value>) -> NormalizedMetadata {
    match object_field(source.get("metadata")) {
        Some(nested) => reconcile_metadata(&nested),
        None => reconcile_metadata(source),
    }
}

fn result_object(
    kind: GenerationKind,
    payload: &Map<String, Value>,
    accumulated_text: &str,
) -> Result<Map<String, Value>> {
    if payload.is_empty() {
        return parse_object(accumulated_text).ok_or(ReconcileError::NoResult { kind });
    }

    // a wrapper around the result, possibly next to envelope keys like `usage`
    let wrappers: Vec<&str> = WRAPPER_KEYS
        .into_iter()
        .filter(|key| payload.contains_key(*key))
        .collect();
    let only_envelope = payload
        .keys()
        .all(|key| WRAPPER_KEYS.contains(&key.as_str()) || ENVELOPE_KEYS.contains(&key.as_str()));
    if let [key] = wrappers.as_slice() {
        if only_envelope {
            if let Some(inner) = object_field(payload.get(*key)) {
                return Ok(inner);
            }
        }
    }

    Ok(payload.clone())
}

fn worksheet_text(
    kind: GenerationKind,
    payload: &Map<String, Value>,
    accumulated_text: &str,
) -> Result<String> {
    let from_payload = text_field(lookup(payload, &["content", "worksheet", "text"]));
    if !from_payload.trim().is_empty() {
        return Ok(from_payload);
    }
    if !accumulated_text.trim().is_empty() {
        return Ok(accumulated_text.to_string());
    }
    Err(ReconcileError::NoResult { kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_profile_from_payload_object() {
        let result = GenerationResult::from_payload(
            GenerationKind::CustomerProfile,
            &object(json!({"personaName": "Test", "age": 34})),
            "",
        )
        .unwrap();
        match result {
            GenerationResult::CustomerProfile(map) => {
                assert_eq!(map["personaName"], json!("Test"));
                assert_eq!(map["age"], json!(34));
            }
            other => panic!("Expected CustomerProfile, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_string_result_is_parsed() {
        let result = GenerationResult::from_payload(
            GenerationKind::BrandIdentity,
            &object(json!({"result": "{\"brandName\":\"Acme\"}"})),
            "",
        )
        .unwrap();
        assert_eq!(
            result,
            GenerationResult::BrandIdentity(object(json!({"brandName": "Acme"})))
        );
    }

    #[test]
    fn test_wrapper_next_to_usage_is_unwrapped() {
        let result = GenerationResult::from_payload(
            GenerationKind::CustomerProfile,
            &object(json!({"result": {"personaName": "Ana"}, "usage": {"tokens": 812}})),
            "",
        )
        .unwrap();
        assert_eq!(
            result,
            GenerationResult::CustomerProfile(object(json!({"personaName": "Ana"})))
        );
    }

    #[test]
    fn test_wrapper_next_to_result_fields_is_kept() {
        let payload = object(json!({"content": {"x": 1}, "personaName": "Ana"}));
        let result =
            GenerationResult::from_payload(GenerationKind::CustomerProfile, &payload, "").unwrap();
        assert_eq!(result, GenerationResult::CustomerProfile(payload));
    }

    #[test]
    fn test_empty_payload_falls_back_to_text() {
        let result = GenerationResult::from_payload(
            GenerationKind::CustomerProfile,
            &Map::new(),
            r#"{"personaName":"Test"}"#,
        )
        .unwrap();
        assert_eq!(
            result,
            GenerationResult::CustomerProfile(object(json!({"personaName": "Test"})))
        );
    }

    #[test]
    fn test_nothing_usable_is_an_error() {
        let err = GenerationResult::from_payload(GenerationKind::CustomerProfile, &Map::new(), "")
            .unwrap_err();
        assert_eq!(
            err,
            ReconcileError::NoResult {
                kind: GenerationKind::CustomerProfile
            }
        );
    }

    #[test]
    fn test_worksheet_prefers_payload_content() {
        let result = GenerationResult::from_payload(
            GenerationKind::Worksheet,
            &object(json!({"content": "# Worksheet"})),
            "streamed",
        )
        .unwrap();
        assert_eq!(result, GenerationResult::Worksheet("# Worksheet".into()));

        let fallback =
            GenerationResult::from_payload(GenerationKind::Worksheet, &Map::new(), "streamed")
                .unwrap();
        assert_eq!(fallback, GenerationResult::Worksheet("streamed".into()));
    }

    #[test]
    fn test_social_content_core_message_shapes() {
        let as_string = SocialContentForm::from_object(&object(json!({
            "core_message": "Fresh roast"
        })));
        assert_eq!(as_string.core_message, "Fresh roast");

        let as_object = SocialContentForm::from_object(&object(json!({
            "core_message": {"content": "Fresh roast"}
        })));
        assert_eq!(as_object.core_message, "Fresh roast");

        let nested = SocialContentForm::from_object(&object(json!({
            "core_message": {"core_message": "Fresh roast"}
        })));
        assert_eq!(nested.core_message, "Fresh roast");
    }

    #[test]
    fn test_social_content_variants() {
        let result = GenerationResult::from_payload(
            GenerationKind::SocialContent,
            &object(json!({
                "core_message": "Spring is here",
                "metadata": {"hashtags": ["#spring"], "seo_keywords": ["a", "b"]},
                "variants": [
                    {"platform": "instagram", "content": "Hello IG", "metadata": {"hashtags": ["#ig", "#coffee"]}},
                    {"platform": "linkedin", "content": {"content": "Hello LI"}},
                    "not a variant"
                ]
            })),
            "",
        )
        .unwrap();

        let form = match result {
            GenerationResult::SocialContent(form) => form,
            other => panic!("Expected SocialContent, got {:?}", other),
        };
        assert_eq!(form.core_message, "Spring is here");
        assert_eq!(form.metadata.hashtags, "#spring");
        assert_eq!(form.metadata.seo_keywords, "a, b");
        assert_eq!(form.variants.len(), 2);
        assert_eq!(form.variants[0].metadata.hashtags, "#ig #coffee");
        assert_eq!(form.variants[1].content, "Hello LI");
        assert_eq!(form.variants[1].metadata, NormalizedMetadata::default());
    }

    #[test]
    fn test_result_serialization_is_tagged() {
        let value = serde_json::to_value(GenerationResult::Worksheet("text".into())).unwrap();
        assert_eq!(value, json!({"kind": "worksheet", "result": "text"}));
    }
}
