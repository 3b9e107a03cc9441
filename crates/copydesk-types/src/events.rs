use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::status::AgentStatus;

/// One decoded frame of a generation stream.
///
/// The wire shape is a JSON object tagged on `"type"`:
///
/// ```json
/// {"type":"status","status":"analyzing","agent":"brand"}
/// {"type":"chunk","content":"Hello"}
/// {"type":"done","personaName":"Test"}
/// {"type":"error","error":"quota exceeded"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// Progress update from the agent service
    Status {
        status: AgentStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
    },

    /// Fragment of generated text (streamed token-by-token)
    Chunk {
        content: String,
    },

    /// Final structured result. Every field besides `type` belongs to the
    /// kind-specific payload.
    Done {
        #[serde(flatten)]
        payload: Map<String, Value>,
    },

    /// Generation failed on the server side
    Error {
        error: String,
    },
}

impl GenerationEvent {
    pub fn status(status: impl Into<AgentStatus>) -> Self {
        Self::Status {
            status: status.into(),
            agent: None,
        }
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        Self::Chunk {
            content: content.into(),
        }
    }

    pub fn done(payload: Map<String, Value>) -> Self {
        Self::Done { payload }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
        }
    }

    /// `done` and `error` end a stream; nothing is delivered after them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    /// Short name used in log fields
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Chunk { .. } => "chunk",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
