use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{ListQuery, Page, Record};
use crate::store::RecordStore;

/// Record store kept in process memory.
///
/// Records of a collection keep their insertion order, which is also the
/// list order when no sort is given.
#[derive(Default)]
pub struct InMemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Page<Record>> {
        let collections = self.collections.read().await;
        let mut matching: Vec<Record> = collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| query.filter.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            let (field, descending) = match sort.strip_prefix('-') {
                Some(field) => (field, true),
                None => (sort.trim_start_matches('+'), false),
            };
            matching.sort_by(|a, b| {
                let ordering = compare_field(a, b, field);
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let per_page = query.per_page.max(1);
        let page = query.page.max(1);
        let total_items = matching.len() as u64;
        let total_pages = matching.len().div_ceil(per_page as usize) as u32;
        let offset = (page as usize - 1).saturating_mul(per_page as usize);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();

        Ok(Page {
            page,
            per_page,
            total_items,
            total_pages,
            items,
        })
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<Record> {
        let now = Utc::now().to_rfc3339();
        let id = match fields.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => return Err(PersistError::InvalidRecord("id must be a non-empty string".into())),
            None => uuid::Uuid::new_v4().simple().to_string(),
        };

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.iter().any(|r| r.id == id) {
            return Err(PersistError::InvalidRecord(format!("duplicate id {}", id)));
        }

        let mut fields = fields;
        fields.remove("id");
        let record = Record {
            id,
            collection_name: collection.to_string(),
            created: Some(now.clone()),
            updated: Some(now),
            fields,
        };
        records.push(record.clone());

        tracing::debug!(collection = %collection, id = %record.id, "Created record");
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Record> {
        let mut collections = self.collections.write().await;
        let record = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| PersistError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            if key != "id" {
                record.fields.insert(key, value);
            }
        }
        record.updated = Some(Utc::now().to_rfc3339());
        Ok(record.clone())
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let records = collections.get_mut(collection);
        let position = records
            .as_ref()
            .and_then(|records| records.iter().position(|r| r.id == id));

        match (records, position) {
            (Some(records), Some(index)) => {
                records.remove(index);
                tracing::debug!(collection = %collection, id = %id, "Removed record");
                Ok(())
            }
            _ => Err(PersistError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

fn compare_field(a: &Record, b: &Record, field: &str) -> Ordering {
    match field {
        "id" => a.id.cmp(&b.id),
        "created" => a.created.cmp(&b.created),
        "updated" => a.updated.cmp(&b.updated),
        _ => compare_values(a.fields.get(field), b.fields.get(field)),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
