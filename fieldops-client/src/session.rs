//! Local session persistence
//!
//! One JSON file, `{session_dir}/session.json`, holding the active token
//! and user, plus the stashed pair while an admin is acting as another
//! user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active session")]
    NotLoggedIn,

    #[error("Already acting as another user")]
    AlreadyImpersonating,

    #[error("No original session to return to")]
    NotImpersonating,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Token plus the user object the backend returned at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_user: Option<Value>,
}

impl SessionFile {
    fn current(&self) -> Option<Session> {
        Some(Session {
            token: self.auth_token.clone()?,
            user: self.user.clone().unwrap_or(Value::Null),
        })
    }

    fn original(&self) -> Option<Session> {
        Some(Session {
            token: self.original_token.clone()?,
            user: self.original_user.clone().unwrap_or(Value::Null),
        })
    }
}

pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    pub fn new(session_dir: &Path) -> Self {
        Self {
            file_path: session_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Active session, if any
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.read()?.current())
    }

    /// Replace the active session; a stashed original is kept.
    pub fn save(&self, token: impl Into<String>, user: Value) -> Result<(), SessionError> {
        let mut file = self.read()?;
        file.auth_token = Some(token.into());
        file.user = Some(user);
        self.write(&file)
    }

    /// Forget everything, stashed original included
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_impersonating(&self) -> Result<bool, SessionError> {
        Ok(self.read()?.original_token.is_some())
    }

    /// Stash the current session and switch to `token`/`user`.
    pub fn begin_impersonation(
        &self,
        token: impl Into<String>,
        user: Value,
    ) -> Result<(), SessionError> {
        let mut file = self.read()?;
        if file.original_token.is_some() {
            return Err(SessionError::AlreadyImpersonating);
        }
        let current = file.current().ok_or(SessionError::NotLoggedIn)?;

        file.original_token = Some(current.token);
        file.original_user = Some(current.user);
        file.auth_token = Some(token.into());
        file.user = Some(user);
        self.write(&file)?;
        tracing::info!(path = %self.file_path.display(), "Impersonation started");
        Ok(())
    }

    /// Restore the stashed session and return it.
    pub fn return_to_original(&self) -> Result<Session, SessionError> {
        let mut file = self.read()?;
        let original = file.original().ok_or(SessionError::NotImpersonating)?;

        file.auth_token = Some(original.token.clone());
        file.user = Some(original.user.clone());
        file.original_token = None;
        file.original_user = None;
        self.write(&file)?;
        tracing::info!(path = %self.file_path.display(), "Returned to original session");
        Ok(original)
    }

    fn read(&self) -> Result<SessionFile, SessionError> {
        if !self.file_path.exists() {
            return Ok(SessionFile::default());
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        if content.trim().is_empty() {
            return Ok(SessionFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, file: &SessionFile) -> Result<(), SessionError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.file_path, content)?;
        Ok(())
    }
}
