use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{ListQuery, Page, Record};

/// Generic record store over named collections
///
/// Implementations provide backend-specific CRUD operations
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List records of a collection matching the query
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Page<Record>>;

    /// Get a record by ID
    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Record>>;

    /// Create a record and return it with its assigned ID
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<Record>;

    /// Merge `fields` into an existing record
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Record>;

    /// Delete a record
    async fn remove(&self, collection: &str, id: &str) -> Result<()>;
}
