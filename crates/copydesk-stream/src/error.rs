use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    /// The endpoint answered with a non-2xx status
    #[error("Request failed with status {status}{}", detail_suffix(.body))]
    RequestFailed { status: u16, body: Option<String> },

    /// The caller's cancellation token fired. Never user-visible.
    #[error("Generation cancelled")]
    Cancelled,

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// Any other network or runtime failure
    #[error("{0}")]
    Unknown(String),
}

fn detail_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(": {}", body),
        None => String::new(),
    }
}

impl StreamError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status for `RequestFailed`
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unknown(format!("Request timed out: {}", e))
        } else {
            Self::Unknown(format!("HTTP error: {}", e))
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
