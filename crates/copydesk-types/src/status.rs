use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress code reported by the agent service in `status` frames.
///
/// Unknown codes are kept verbatim so they can still be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentStatus {
    FetchingBrand,
    FetchingWorksheet,
    Analyzing,
    Thinking,
    Other(String),
}

impl AgentStatus {
    /// Wire code for this status
    pub fn code(&self) -> &str {
        match self {
            Self::FetchingBrand => "fetching_brand",
            Self::FetchingWorksheet => "fetching_worksheet",
            Self::Analyzing => "analyzing",
            Self::Thinking => "thinking",
            Self::Other(code) => code,
        }
    }

    /// Human-readable phrase for progress displays.
    /// Unrecognized codes fall through as their raw code.
    pub fn message(&self) -> &str {
        match self {
            Self::FetchingBrand => "Fetching brand identity...",
            Self::FetchingWorksheet => "Fetching worksheet...",
            Self::Analyzing => "Analyzing...",
            Self::Thinking => "Thinking...",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for AgentStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "fetching_brand" => Self::FetchingBrand,
            "fetching_worksheet" => Self::FetchingWorksheet,
            "analyzing" => Self::Analyzing,
            "thinking" => Self::Thinking,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for AgentStatus {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<AgentStatus> for String {
    fn from(status: AgentStatus) -> Self {
        match status {
            AgentStatus::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
