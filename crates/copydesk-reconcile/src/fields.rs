//! Per-category field normalizers.
//!
//! Every normalizer is total: whatever shape the value arrives in, it
//! produces a defined default instead of failing. They never mutate their
//! input and applying one to its own output gives the same output back.

use serde_json::{Map, Value};

pub const HASHTAG_SEPARATOR: &str = " ";
pub const KEYWORD_SEPARATOR: &str = ", ";
pub const NOTE_SEPARATOR: &str = "\n";

/// Scalar text: the string itself, `""` for anything else
pub fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Numeric value, `0` when absent or not a JSON number.
///
/// Numbers sent as strings (`"4.5"`) are treated as absent.
pub fn number_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            tracing::debug!(value = %s, "Ignoring numeric field sent as a string");
            0.0
        }
        _ => 0.0,
    }
}

/// Non-negative integer count, `0` when absent or not a JSON number
pub fn count_field(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| match n.as_f64() {
            Some(f) if f > 0.0 && f < u64::MAX as f64 => f as u64,
            Some(f) if f > 0.0 => {
                tracing::debug!(value = f, "Clamping oversized count");
                u64::MAX
            }
            _ => 0,
        }),
        Some(Value::String(s)) => {
            tracing::debug!(value = %s, "Ignoring count field sent as a string");
            0
        }
        _ => 0,
    }
}

/// List-like text.
///
/// Arrays are joined with `separator` (non-string elements skipped), a
/// string passes through unchanged, anything else becomes `""`.
pub fn list_field(value: Option<&Value>, separator: &str) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(separator),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// First present value among `names`, so payloads may use either
/// `snake_case` or `camelCase` keys
pub fn lookup<'a>(object: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| object.get(*name))
}

/// Object-valued field that may also arrive as a string holding JSON
pub fn object_field(value: Option<&Value>) -> Option<Map<String, Value>> {
    match value? {
        Value::Object(map) => Some(map.clone()),
        Value::String(s) => parse_object(s),
        _ => None,
    }
}

/// Array-valued field that may also arrive as a string holding JSON
pub fn array_field(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(extract_json(s)) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Parse text that should contain a JSON object. Tolerates a surrounding
/// markdown code fence or prose around the braces.
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(extract_json(text)) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "Text does not hold a JSON object");
            None
        }
    }
}

fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if unfenced.starts_with('{') || unfenced.starts_with('[') {
        return unfenced;
    }
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}
