use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use copydesk_stream::{CancellationToken, GenerationTransport};
use copydesk_types::{GenerationEvent, GenerationRequest};

use crate::error::{Result, SessionError};
use crate::session::{GenerationSession, Phase};

/// Drives sessions against a generation transport
#[derive(Clone)]
pub struct GenerationRunner {
    transport: Arc<dyn GenerationTransport>,
}

impl GenerationRunner {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self { transport }
    }

    /// Run one generation to completion on `session`.
    ///
    /// `observer` sees the session after every applied event. Guard failures
    /// come back as errors before any request goes out; everything that
    /// happens after that is recorded on the session and reflected in the
    /// returned phase (`Config` when the user cancelled).
    pub async fn run<R, F>(
        &self,
        session: &mut GenerationSession,
        request: &R,
        mut observer: F,
    ) -> Result<Phase>
    where
        R: GenerationRequest,
        F: FnMut(&GenerationSession) + Send,
    {
        let body = serde_json::to_value(request)?;
        let token = session.begin(request)?;
        let endpoint = request.kind().endpoint();

        let outcome = {
            let mut on_event = |event: GenerationEvent| {
                if session.apply(event) {
                    observer(&*session);
                }
            };
            self.transport
                .run_generation(endpoint, body, &mut on_event, Some(&token))
                .await
        };

        session.settle(outcome);
        tracing::info!(
            session_id = %session.id(),
            kind = %session.kind(),
            phase = ?session.phase(),
            "Generation settled"
        );
        Ok(session.phase())
    }

    /// Run a generation on a background task.
    ///
    /// The session moves into the task and comes back through
    /// [`SessionHandle::join`]. Each event is also forwarded on the handle's
    /// channel as it is applied.
    pub fn spawn_run<R>(&self, mut session: GenerationSession, request: &R) -> Result<SessionHandle>
    where
        R: GenerationRequest,
    {
        let body = serde_json::to_value(request)?;
        let token = session.begin(request)?;
        let endpoint = request.kind().endpoint();

        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::clone(&self.transport);
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let outcome = {
                let mut on_event = |event: GenerationEvent| {
                    let forwarded = event.clone();
                    if session.apply(event) {
                        let _ = tx.send(forwarded);
                    }
                };
                transport
                    .run_generation(endpoint, body, &mut on_event, Some(&task_token))
                    .await
            };
            session.settle(outcome);
            tracing::info!(session_id = %session.id(), phase = ?session.phase(), "Background generation settled");
            session
        });

        Ok(SessionHandle {
            cancel: token,
            events: rx,
            task,
        })
    }
}

/// Handle to a generation running on a background task
pub struct SessionHandle {
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<GenerationEvent>,
    task: JoinHandle<GenerationSession>,
}

impl SessionHandle {
    /// Stop the stream; the session settles back in `Config`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Next applied event, `None` once the stream has settled
    pub async fn next_event(&mut self) -> Option<GenerationEvent> {
        self.events.recv().await
    }

    /// Wait for the task and take the session back
    pub async fn join(self) -> Result<GenerationSession> {
        self.task
            .await
            .map_err(|e| SessionError::Join(e.to_string()))
    }
}
