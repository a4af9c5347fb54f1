//! Mock local credential check: no hashing, no server, just a validated
//! user document in the data directory. Nothing security-relevant lives
//! here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("password must be at least 6 characters")]
    ShortPassword,

    #[error("name must be at least 2 characters")]
    ShortName,

    #[error("failed to access the session document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode the session document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Stores the logged-in user as `user.json` next to the activity document.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub const FILE_NAME: &'static str = "user.json";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    /// Validates the credentials and stores the session. The display name
    /// falls back to the local part of the email when not given.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, SessionError> {
        if !email.contains('@') {
            return Err(SessionError::InvalidEmail);
        }
        if password.chars().count() < 6 {
            return Err(SessionError::ShortPassword);
        }
        if matches!(name, Some(name) if name.chars().count() < 2) {
            return Err(SessionError::ShortName);
        }

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name,
        };

        let buffer = serde_json::to_vec_pretty(&user)?;
        tokio::fs::write(&self.path, buffer).await?;
        Ok(user)
    }

    /// Ends the session. Logging out while logged out is a no-op.
    pub async fn logout(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Currently logged-in user, if any. A malformed session document reads
    /// as logged out.
    pub async fn current(&self) -> Option<User> {
        let contents = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str(&contents) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Session document {:?} is malformed: {e}", self.path);
                None
            }
        }
    }
}
