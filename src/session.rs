//! The logged-in user, persisted between CLI invocations.
//!
//! Stored as JSON (`{"user_id": ..., "username": ...}`) in the configured
//! session path. Absence of the file means logged out.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::auth::Account;

/// Errors from reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("Corrupt session file {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_json::Error),
}

/// Identity of the logged-in user. `user_id` is the list owner identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub username: String,
}

impl From<Account> for Session {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id,
            username: account.username,
        }
    }
}

impl Session {
    /// Loads the session, or `None` when no one is logged in.
    pub fn load(path: &Path) -> Result<Option<Self>, SessionError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            fs::read_to_string(path).map_err(|e| SessionError::IoError(path.to_path_buf(), e))?;
        let session = serde_json::from_str(&contents)
            .map_err(|e| SessionError::ParseError(path.to_path_buf(), e))?;
        Ok(Some(session))
    }

    /// Saves the session, replacing any previous one.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SessionError::IoError(parent.to_path_buf(), e))?;
        }

        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| SessionError::ParseError(path.to_path_buf(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");
        let mut file =
            File::create(&temp_path).map_err(|e| SessionError::IoError(temp_path.clone(), e))?;
        file.write_all(&json)
            .map_err(|e| SessionError::IoError(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| SessionError::IoError(temp_path.clone(), e))?;

        fs::rename(&temp_path, path).map_err(|e| SessionError::IoError(path.to_path_buf(), e))
    }

    /// Removes the session file. Returns false if no one was logged in.
    pub fn logout(path: &Path) -> Result<bool, SessionError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::IoError(path.to_path_buf(), e)),
        }
    }
}
