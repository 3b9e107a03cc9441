//! High-level builder API for running generations

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::Map;

use crate::persist::{HttpRecordStore, RecordStore, ResultWriter, SavedResult};
use crate::reconcile::GenerationResult;
use crate::session::{GenerationRunner, GenerationSession, Phase, SessionHandle};
use crate::stream::{GenerationClient, GenerationTransport, StreamConfig};
use crate::types::{CredentialProvider, GenerationRequest, StaticCredentials};

/// How a generation ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// `done` arrived; the result is reconciled and ready to edit or save
    Completed {
        result: GenerationResult,
        /// Text accumulated from the streamed chunks
        text: String,
    },
    /// The agent or the transport failed
    Failed(String),
    /// Cancelled by the user; nothing to keep
    Cancelled,
}

impl GenerationOutcome {
    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            Self::Completed { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// High-level builder for a [`Studio`]
///
/// # Example
///
/// ```rust,no_run
/// use copydesk::prelude::*;
///
/// # fn main() -> Result<()> {
/// let studio = StudioBuilder::new()
///     .base_url("http://localhost:8000")
///     .token("session-token")
///     .store_url("http://localhost:8090")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct StudioBuilder {
    stream_config: Option<StreamConfig>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    transport: Option<Arc<dyn GenerationTransport>>,
    store: Option<Arc<dyn RecordStore>>,
    store_url: Option<String>,
}

impl Default for StudioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioBuilder {
    pub fn new() -> Self {
        Self {
            stream_config: None,
            credentials: None,
            transport: None,
            store: None,
            store_url: None,
        }
    }

    /// Agent service base URL (required unless a transport is set)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.stream_config = Some(match self.stream_config.take() {
            Some(mut config) => {
                config.base_url = base_url;
                config
            }
            None => StreamConfig::new(base_url),
        });
        self
    }

    pub fn stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = Some(config);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Shorthand for fixed bearer-token credentials
    pub fn token(self, token: impl Into<String>) -> Self {
        self.credentials(Arc::new(StaticCredentials::new(token)))
    }

    /// Use a custom transport instead of the HTTP stream client
    pub fn transport(mut self, transport: Arc<dyn GenerationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist into a REST record store at this URL, sharing the credentials
    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.store_url = Some(url.into());
        self
    }

    /// Build the studio
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL or transport is set, or if a URL is
    /// not a valid http(s) endpoint.
    pub fn build(self) -> Result<Studio> {
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(StaticCredentials::anonymous()));

        let transport: Arc<dyn GenerationTransport> = match (self.transport, self.stream_config) {
            (Some(transport), _) => transport,
            (None, Some(config)) => Arc::new(
                GenerationClient::builder()
                    .config(config)
                    .credentials(Arc::clone(&credentials))
                    .build()
                    .context("Failed to create generation client")?,
            ),
            (None, None) => bail!("Agent service URL is required. Call .base_url(url)"),
        };

        let store: Option<Arc<dyn RecordStore>> = match (self.store, self.store_url) {
            (Some(store), _) => Some(store),
            (None, Some(url)) => Some(Arc::new(
                HttpRecordStore::builder()
                    .base_url(&url)
                    .credentials(Arc::clone(&credentials))
                    .build()
                    .with_context(|| format!("Failed to create record store for {}", url))?,
            )),
            (None, None) => None,
        };

        Ok(Studio {
            runner: GenerationRunner::new(transport),
            writer: store.map(ResultWriter::new),
            credentials,
        })
    }
}

/// Runs generations and saves their results
pub struct Studio {
    runner: GenerationRunner,
    writer: Option<ResultWriter>,
    credentials: Arc<dyn CredentialProvider>,
}

impl Studio {
    pub fn builder() -> StudioBuilder {
        StudioBuilder::new()
    }

    /// Run one generation to completion.
    ///
    /// `observer` sees the session after each applied event, which is where
    /// progress (status message, accumulated text) is rendered.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use copydesk::prelude::*;
    /// # async fn example(studio: Studio) -> Result<()> {
    /// let request = CustomerProfileRequest::new("bi_123");
    /// let outcome = studio
    ///     .generate(&request, |session| {
    ///         if let Some(status) = session.status_message() {
    ///             eprintln!("{}", status);
    ///         }
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn generate<R, F>(&self, request: &R, observer: F) -> Result<GenerationOutcome>
    where
        R: GenerationRequest,
        F: FnMut(&GenerationSession) + Send,
    {
        let mut session = GenerationSession::new(request.kind());
        self.runner
            .run(&mut session, request, observer)
            .await
            .context("Failed to start generation")?;
        Self::outcome(&session)
    }

    /// Start a generation on a background task; use the handle to follow
    /// events or cancel, then [`Studio::finish`] it
    pub fn start<R: GenerationRequest>(&self, request: &R) -> Result<SessionHandle> {
        self.runner
            .spawn_run(GenerationSession::new(request.kind()), request)
            .context("Failed to start generation")
    }

    /// Wait for a started generation and reconcile its outcome
    pub async fn finish(&self, handle: SessionHandle) -> Result<GenerationOutcome> {
        let session = handle.join().await?;
        Self::outcome(&session)
    }

    /// Outcome of a settled session
    pub fn outcome(session: &GenerationSession) -> Result<GenerationOutcome> {
        match session.phase() {
            Phase::Done => {
                let empty = Map::new();
                let payload = session.result().unwrap_or(&empty);
                let result = GenerationResult::from_payload(session.kind(), payload, session.text())
                    .with_context(|| format!("Failed to reconcile {} result", session.kind()))?;
                Ok(GenerationOutcome::Completed {
                    result,
                    text: session.text().to_string(),
                })
            }
            Phase::Error => Ok(GenerationOutcome::Failed(
                session.error().unwrap_or("Generation failed").to_string(),
            )),
            Phase::Config => Ok(GenerationOutcome::Cancelled),
            Phase::Streaming => bail!("Session {} is still streaming", session.id()),
        }
    }

    /// Persist a reconciled result, linked to the record it was generated from
    pub async fn save(&self, result: &GenerationResult, source_id: &str) -> Result<SavedResult> {
        let writer = self
            .writer
            .as_ref()
            .context("No record store configured. Call .store(..) or .store_url(..)")?;
        let saved = writer
            .save(result, source_id)
            .await
            .with_context(|| format!("Failed to save {} result", result.kind()))?;
        tracing::info!(id = %saved.record.id, variants = saved.variants.len(), "Result saved");
        Ok(saved)
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub fn runner(&self) -> &GenerationRunner {
        &self.runner
    }
}
