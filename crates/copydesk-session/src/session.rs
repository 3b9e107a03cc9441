use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use copydesk_stream::{CancellationToken, StreamError};
use copydesk_types::{GenerationEvent, GenerationKind, GenerationRequest};

use crate::error::{Result, SessionError};

pub const STREAM_ENDED_EARLY: &str = "Stream ended before a result was received";

/// Where a generation session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Collecting parameters (initial, and after a cancel)
    Config,
    Streaming,
    Done,
    Error,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Error)
    }
}

/// One user-initiated request/stream/result cycle.
///
/// Only two things mutate a session: events coming from the stream and the
/// owner's cancel action. Sessions share nothing, so any number can stream
/// at once.
#[derive(Debug)]
pub struct GenerationSession {
    id: String,
    kind: GenerationKind,
    phase: Phase,
    text: String,
    status_message: Option<String>,
    agent: Option<String>,
    result: Option<Map<String, Value>>,
    error: Option<String>,
    cancel: Option<CancellationToken>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl GenerationSession {
    pub fn new(kind: GenerationKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            phase: Phase::Config,
            text: String::new(),
            status_message: None,
            agent: None,
            result: None,
            error: None,
            cancel: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Text accumulated from `chunk` events of the current generation
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Agent label of the last status update
    pub fn agent(&self) -> Option<&str> {
        self.agent.as_deref()
    }

    /// Final payload, only set once the session is `Done`
    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.result.as_ref()
    }

    /// Failure message, only set once the session is `Error`
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Live cancellation handle; `None` outside `Streaming`
    pub fn cancel_handle(&self) -> Option<CancellationToken> {
        self.cancel.clone()
    }

    /// `Config -> Streaming`.
    ///
    /// Guarded by the request's own validation: on failure the session is
    /// untouched and no request must be issued. Clears everything left over
    /// from a previous generation and hands back the fresh cancellation
    /// token for the stream.
    pub fn begin<R: GenerationRequest>(&mut self, request: &R) -> Result<CancellationToken> {
        if self.phase == Phase::Streaming {
            return Err(SessionError::AlreadyStreaming);
        }
        if request.kind() != self.kind {
            return Err(SessionError::KindMismatch {
                expected: self.kind,
                actual: request.kind(),
            });
        }
        request.validate()?;

        let token = CancellationToken::new();
        self.phase = Phase::Streaming;
        self.text.clear();
        self.status_message = None;
        self.agent = None;
        self.result = None;
        self.error = None;
        self.cancel = Some(token.clone());
        self.started_at = Some(Utc::now());
        self.finished_at = None;

        tracing::debug!(session_id = %self.id, kind = %self.kind, source = request.source_id(), "Session streaming");
        Ok(token)
    }

    /// Apply one stream event. Events outside `Streaming` are ignored;
    /// returns whether the event changed the session.
    pub fn apply(&mut self, event: GenerationEvent) -> bool {
        if self.phase != Phase::Streaming {
            tracing::debug!(session_id = %self.id, event = event.type_name(), phase = ?self.phase, "Ignoring event outside streaming");
            return false;
        }

        match event {
            GenerationEvent::Status { status, agent } => {
                self.status_message = Some(status.message().to_string());
                self.agent = agent;
            }
            GenerationEvent::Chunk { content } => {
                self.text.push_str(&content);
            }
            GenerationEvent::Done { payload } => {
                self.result = Some(payload);
                self.finish(Phase::Done);
            }
            GenerationEvent::Error { error } => {
                self.error = Some(error);
                self.finish(Phase::Error);
            }
        }
        true
    }

    /// React to the stream client failing.
    ///
    /// A cancel is not a failure: the session goes back to `Config` with
    /// nothing kept. Every other error moves a streaming session to `Error`.
    pub fn fail(&mut self, error: StreamError) {
        if error.is_cancelled() {
            self.abort();
            return;
        }
        if self.phase != Phase::Streaming {
            return;
        }

        tracing::warn!(session_id = %self.id, kind = %self.kind, error = %error, "Generation failed");
        self.error = Some(error.to_string());
        self.finish(Phase::Error);
    }

    /// Settle the session once the stream client call has returned
    pub fn settle(&mut self, outcome: std::result::Result<(), StreamError>) {
        match outcome {
            Ok(()) if self.phase == Phase::Streaming => {
                tracing::warn!(session_id = %self.id, "Stream closed without a terminal event");
                self.error = Some(STREAM_ENDED_EARLY.to_string());
                self.finish(Phase::Error);
            }
            Ok(()) => {}
            Err(e) => self.fail(e),
        }
    }

    /// Ask the live stream to stop. Safe to call in any phase.
    pub fn cancel(&self) {
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }

    /// Discard the in-flight generation and return to `Config`
    pub fn abort(&mut self) {
        if self.phase != Phase::Streaming {
            return;
        }
        tracing::debug!(session_id = %self.id, "Session aborted");
        self.cancel();
        self.cancel = None;
        self.phase = Phase::Config;
        self.text.clear();
        self.status_message = None;
        self.agent = None;
        self.started_at = None;
    }

    /// Take the final payload out of a `Done` session
    pub fn take_result(&mut self) -> Option<Map<String, Value>> {
        self.result.take()
    }

    fn finish(&mut self, phase: Phase) {
        self.phase = phase;
        self.cancel = None;
        self.finished_at = Some(Utc::now());
        tracing::debug!(session_id = %self.id, phase = ?phase, chars = self.text.len(), "Session finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copydesk_types::{AgentStatus, CustomerProfileRequest, WorksheetRequest};
    use serde_json::json;

    fn streaming_session() -> GenerationSession {
        let mut session = GenerationSession::new(GenerationKind::CustomerProfile);
        session.begin(&CustomerProfileRequest::new("bi_1")).unwrap();
        session
    }

    #[test]
    fn test_guard_failure_keeps_config() {
        let mut session = GenerationSession::new(GenerationKind::CustomerProfile);
        let result = session.begin(&CustomerProfileRequest::new(""));
        assert!(matches!(result, Err(SessionError::MissingParameter(_))));
        assert_eq!(session.phase(), Phase::Config);
        assert!(session.cancel_handle().is_none());
    }

    #[test]
    fn test_kind_mismatch() {
        let mut session = GenerationSession::new(GenerationKind::CustomerProfile);
        let result = session.begin(&WorksheetRequest::new("bi_1"));
        assert!(matches!(result, Err(SessionError::KindMismatch { .. })));
    }

    #[test]
    fn test_cannot_begin_twice() {
        let mut session = streaming_session();
        let result = session.begin(&CustomerProfileRequest::new("bi_1"));
        assert!(matches!(result, Err(SessionError::AlreadyStreaming)));
    }

    #[test]
    fn test_status_uses_lookup_table() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::status(AgentStatus::FetchingBrand));
        assert_eq!(session.status_message(), Some("Fetching brand identity..."));

        session.apply(GenerationEvent::Status {
            status: AgentStatus::from("drafting"),
            agent: Some("writer".into()),
        });
        assert_eq!(session.status_message(), Some("drafting"));
        assert_eq!(session.agent(), Some("writer"));
    }

    #[test]
    fn test_chunks_append_without_dedup() {
        let mut session = streaming_session();
        for part in ["ab", "ab", "", "c"] {
            session.apply(GenerationEvent::chunk(part));
        }
        assert_eq!(session.text(), "ababc");
    }

    #[test]
    fn test_done_stores_payload_and_clears_handle() {
        let mut session = streaming_session();
        let mut payload = Map::new();
        payload.insert("personaName".into(), json!("Test"));

        session.apply(GenerationEvent::done(payload.clone()));
        assert_eq!(session.phase(), Phase::Done);
        assert_eq!(session.result(), Some(&payload));
        assert!(session.cancel_handle().is_none());
        assert!(session.error().is_none());

        // nothing applies after a terminal event
        assert!(!session.apply(GenerationEvent::chunk("late")));
        assert_eq!(session.text(), "");
    }

    #[test]
    fn test_error_event() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::error("Brand not found"));
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.error(), Some("Brand not found"));
        assert!(session.result().is_none());
    }

    #[test]
    fn test_cancel_failure_returns_to_config() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::chunk("partial"));
        session.fail(StreamError::Cancelled);

        assert_eq!(session.phase(), Phase::Config);
        assert!(session.error().is_none());
        assert_eq!(session.text(), "");
        assert!(session.cancel_handle().is_none());
    }

    #[test]
    fn test_request_failure_moves_to_error() {
        let mut session = streaming_session();
        session.fail(StreamError::RequestFailed {
            status: 500,
            body: None,
        });
        assert_eq!(session.phase(), Phase::Error);
        assert!(session.error().unwrap().contains("500"));
    }

    #[test]
    fn test_settle_without_terminal_event() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::chunk("half"));
        session.settle(Ok(()));
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.error(), Some(STREAM_ENDED_EARLY));
    }

    #[test]
    fn test_cancel_after_terminal_is_noop() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::done(Map::new()));
        session.cancel();
        session.abort();
        assert_eq!(session.phase(), Phase::Done);
    }

    #[test]
    fn test_retry_resets_previous_state() {
        let mut session = streaming_session();
        session.apply(GenerationEvent::chunk("first"));
        session.apply(GenerationEvent::error("boom"));

        session.begin(&CustomerProfileRequest::new("bi_1")).unwrap();
        assert_eq!(session.phase(), Phase::Streaming);
        assert_eq!(session.text(), "");
        assert!(session.error().is_none());
    }
}
