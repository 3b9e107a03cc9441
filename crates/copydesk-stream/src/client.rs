// HTTP client for the generation endpoints (reqwest, no SDK)

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use copydesk_types::{CredentialProvider, GenerationEvent, GenerationRequest, StaticCredentials};

use crate::buffer_utils::decode_event_stream;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};

/// Callback receiving each decoded event, in arrival order
pub type EventSink<'a> = &'a mut (dyn FnMut(GenerationEvent) + Send);

/// Executes one generation request and pushes its events to a sink.
///
/// Object-safe so sessions can be driven by a real HTTP client or by a
/// scripted transport in tests.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    async fn run_generation(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        on_event: EventSink<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()>;
}

/// Generation stream client
pub struct GenerationClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GenerationClient {
    /// Client without credentials
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    pub fn builder() -> GenerationClientBuilder {
        GenerationClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Run the generation described by a typed request
    pub async fn generate<R, F>(
        &self,
        request: &R,
        mut on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<()>
    where
        R: GenerationRequest,
        F: FnMut(GenerationEvent) + Send,
    {
        let body = serde_json::to_value(request)?;
        self.stream_events(request.kind().endpoint(), body, &mut on_event, cancel)
            .await
    }

    /// POST `body` to `endpoint` and deliver each decoded event to `on_event`.
    ///
    /// Resolves when the stream closes or a terminal event has been
    /// delivered. Fails with [`StreamError::Cancelled`] as soon as `cancel`
    /// fires; no event is delivered after that point.
    pub async fn run_generation<B, F>(
        &self,
        endpoint: &str,
        body: &B,
        mut on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        F: FnMut(GenerationEvent) + Send,
    {
        let body = serde_json::to_value(body)?;
        self.stream_events(endpoint, body, &mut on_event, cancel)
            .await
    }

    async fn stream_events(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        on_event: EventSink<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let detached = CancellationToken::new();
        let cancel = cancel.unwrap_or(&detached);

        if cancel.is_cancelled() {
            return Err(StreamError::Cancelled);
        }

        let url = self.url(endpoint);
        let payload = serde_json::to_vec(&body)?;

        let mut request = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .body(payload);

        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }

        tracing::info!(endpoint = %endpoint, "Starting generation request");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            result = request.send() => result?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                text = response.text() => text.ok().filter(|t| !t.trim().is_empty()),
            };
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "Generation request failed");
            return Err(StreamError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let mut events = decode_event_stream(response.bytes_stream());
        let mut delivered = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(endpoint = %endpoint, delivered, "Generation cancelled mid-stream");
                    return Err(StreamError::Cancelled);
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    if cancel.is_cancelled() {
                        return Err(StreamError::Cancelled);
                    }
                    tracing::trace!(event = event.type_name(), "Delivering event");
                    on_event(event);
                    delivered += 1;
                }
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }

        tracing::info!(endpoint = %endpoint, delivered, "Generation stream closed");
        Ok(())
    }
}

#[async_trait]
impl GenerationTransport for GenerationClient {
    async fn run_generation(
        &self,
        endpoint: &str,
        body: serde_json::Value,
        on_event: EventSink<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        self.stream_events(endpoint, body, on_event, cancel).await
    }
}

/// Builder for [`GenerationClient`]
pub struct GenerationClientBuilder {
    config: Option<StreamConfig>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl GenerationClientBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            credentials: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.config = Some(match self.config.take() {
            Some(mut config) => {
                config.base_url = base_url;
                config
            }
            None => StreamConfig::new(base_url),
        });
        self
    }

    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn build(self) -> Result<GenerationClient> {
        let config = self
            .config
            .ok_or_else(|| StreamError::InvalidEndpoint("base_url is required".to_string()))?;

        let parsed = reqwest::Url::parse(&config.base_url)
            .map_err(|e| StreamError::InvalidEndpoint(format!("{}: {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StreamError::InvalidEndpoint(format!(
                "{}: unsupported scheme",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(agent) = &config.user_agent {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(agent)
                    .map_err(|e| StreamError::InvalidEndpoint(format!("user agent: {}", e)))?,
            );
        }

        let mut http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            http = http.timeout(timeout);
        }
        let http_client = http.build()?;

        Ok(GenerationClient {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(StaticCredentials::anonymous())),
        })
    }
}

impl Default for GenerationClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
