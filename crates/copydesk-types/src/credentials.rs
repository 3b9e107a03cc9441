//! Read-only access to the session credential.
//!
//! The auth collaborator owns the token; clients only ever call
//! [`CredentialProvider::token`] when they build a request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if a session exists
    fn token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Fixed credential (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredentials {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Credential handle that the auth collaborator updates on login/logout.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SharedCredentials {
    slot: Arc<RwLock<Option<String>>>,
}

impl SharedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl CredentialProvider for SharedCredentials {
    fn token(&self) -> Option<String> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    token: Option<String>,
}

/// Token persisted to a JSON file so a session survives restarts.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
    current: SharedCredentials,
}

impl FileCredentials {
    /// Load the stored session. A missing file means "not logged in".
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let path = path.as_ref().to_path_buf();
        let current = SharedCredentials::new();

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let stored: StoredSession = serde_json::from_str(&raw)?;
                if let Some(token) = stored.token {
                    current.set_token(token);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No stored session");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { path, current })
    }

    /// Store a new token and write it through to disk
    pub fn login(&self, token: impl Into<String>) -> Result<(), CredentialError> {
        self.current.set_token(token);
        self.persist()
    }

    pub fn logout(&self) -> Result<(), CredentialError> {
        self.current.clear();
        self.persist()
    }

    fn persist(&self) -> Result<(), CredentialError> {
        let stored = StoredSession {
            token: self.current.token(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }
}

impl CredentialProvider for FileCredentials {
    fn token(&self) -> Option<String> {
        self.current.token()
    }
}
