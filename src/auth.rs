//! Auth provider contract.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A registered user as returned by register/login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque owner identity used for list ownership.
    pub user_id: String,
    pub username: String,
}

/// Errors that can occur during registration or login.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(String),
}

/// Registers and authenticates users.
pub trait AuthProvider: Send + Sync {
    fn register<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>>;

    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>>;
}

/// Rejects blank usernames and passwords before they reach a provider.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::Invalid("username cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AuthError::Invalid("password cannot be empty".to_string()));
    }
    Ok(())
}
