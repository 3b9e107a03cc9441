use copydesk_types::{GenerationKind, MissingParameter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The guard for `Config -> Streaming` failed; no request was issued
    #[error(transparent)]
    MissingParameter(#[from] MissingParameter),

    #[error("A generation is already streaming in this session")]
    AlreadyStreaming,

    #[error("Session generates {expected}, request is for {actual}")]
    KindMismatch {
        expected: GenerationKind,
        actual: GenerationKind,
    },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Generation task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
