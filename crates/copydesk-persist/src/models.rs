use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PER_PAGE: u32 = 30;

/// A stored record: system fields plus whatever the collection holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        if field == "id" {
            return Some(&self.id);
        }
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Conjunction of equality conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == "id" {
                return expected.as_str() == Some(record.id.as_str());
            }
            record.fields.get(field) == Some(expected)
        })
    }

    /// Filter expression in the `field='value' && other=3` syntax
    pub fn render(&self) -> Option<String> {
        if self.conditions.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|(field, value)| format!("{}={}", field, render_value(value)))
            .collect();
        Some(parts.join(" && "))
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Filter, sort and pagination for `list`
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    /// Field name, `-` prefixed for descending
    pub sort: Option<String>,
    /// 1-based
    pub page: u32,
    pub per_page: u32,
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            filter: Filter::new(),
            sort: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = self.filter.eq(field, value);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of a list result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_render() {
        let filter = Filter::new().eq("worksheet", "ws_1").eq("version", 2);
        assert_eq!(filter.render().unwrap(), "worksheet='ws_1' && version=2");
        assert!(Filter::new().render().is_none());
    }

    #[test]
    fn test_filter_render_escapes_quotes() {
        let filter = Filter::new().eq("name", "Joe's");
        assert_eq!(filter.render().unwrap(), r"name='Joe\'s'");
    }

    #[test]
    fn test_record_flattens_fields() {
        let record: Record = serde_json::from_value(json!({
            "id": "rec1",
            "collectionName": "worksheets",
            "created": "2024-05-01 10:00:00.000Z",
            "content": "hello"
        }))
        .unwrap();
        assert_eq!(record.collection_name, "worksheets");
        assert_eq!(record.get_str("content"), Some("hello"));
        assert_eq!(record.get_str("id"), Some("rec1"));
        assert!(!record.fields.contains_key("created"));
    }

    #[test]
    fn test_filter_matches() {
        let mut fields = Map::new();
        fields.insert("platform".into(), json!("instagram"));
        let record = Record {
            id: "r1".into(),
            collection_name: "platform_variants".into(),
            created: None,
            updated: None,
            fields,
        };
        assert!(Filter::new().eq("platform", "instagram").matches(&record));
        assert!(Filter::new().eq("id", "r1").matches(&record));
        assert!(!Filter::new().eq("platform", "x").matches(&record));
    }

    #[test]
    fn test_list_query_clamps_paging() {
        let query = ListQuery::new().page(0).per_page(0);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 1);
    }
}
