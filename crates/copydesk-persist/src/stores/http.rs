use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};

use copydesk_types::{CredentialProvider, StaticCredentials};

use crate::error::{PersistError, Result};
use crate::models::{ListQuery, Page, Record};
use crate::store::RecordStore;

/// Record store backed by a PocketBase-style REST API
/// (`/api/collections/{collection}/records[/{id}]`)
pub struct HttpRecordStore {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpRecordStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> HttpRecordStoreBuilder {
        HttpRecordStoreBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, collection: &str, id: Option<&str>) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(PersistError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(collection = %collection, status = status.as_u16(), "Record store request failed");
        Err(PersistError::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Page<Record>> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("perPage", query.per_page.to_string()),
        ];
        if let Some(filter) = query.filter.render() {
            params.push(("filter", filter));
        }
        if let Some(sort) = &query.sort {
            params.push(("sort", sort.clone()));
        }

        let request = self.http_client.get(self.records_url(collection)).query(&params);
        let response = self.send(request, collection, None).await?;
        let page: Page<Record> = response.json().await?;
        tracing::debug!(collection = %collection, items = page.items.len(), total = page.total_items, "Listed records");
        Ok(page)
    }

    async fn get_one(&self, collection: &str, id: &str) -> Result<Option<Record>> {
        let request = self.http_client.get(self.record_url(collection, id));
        match self.send(request, collection, Some(id)).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(PersistError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<Record> {
        let request = self
            .http_client
            .post(self.records_url(collection))
            .json(&fields);
        let response = self.send(request, collection, None).await?;
        let record: Record = response.json().await?;
        tracing::debug!(collection = %collection, id = %record.id, "Created record");
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Record> {
        let request = self
            .http_client
            .patch(self.record_url(collection, id))
            .json(&fields);
        let response = self.send(request, collection, Some(id)).await?;
        Ok(response.json().await?)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<()> {
        let request = self.http_client.delete(self.record_url(collection, id));
        self.send(request, collection, Some(id)).await?;
        tracing::debug!(collection = %collection, id = %id, "Removed record");
        Ok(())
    }
}

pub struct HttpRecordStoreBuilder {
    base_url: Option<String>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    http_client: Option<reqwest::Client>,
}

impl HttpRecordStoreBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            http_client: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<HttpRecordStore> {
        let base_url = self
            .base_url
            .ok_or_else(|| PersistError::InvalidEndpoint("base_url is required".to_string()))?;
        reqwest::Url::parse(&base_url)
            .map_err(|e| PersistError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;

        Ok(HttpRecordStore {
            http_client: self.http_client.unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(StaticCredentials::anonymous())),
        })
    }
}

impl Default for HttpRecordStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
