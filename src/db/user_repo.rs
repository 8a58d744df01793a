use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use chrono::Utc;
use futures::future::BoxFuture;
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::{validate_credentials, Account, AuthError, AuthProvider};

/// Registered users with salted password digests.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_salt: String,
    password_hash: String,
}

fn db_error(e: sqlx::Error) -> AuthError {
    AuthError::Database(e.to_string())
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        validate_credentials(username, password)?;
        let username = username.trim();

        if self.get_by_username(username).await?.is_some() {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let salt = generate_salt();
        let hash = hash_password(&salt, password);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_salt, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(&salt)
        .bind(&hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration of the same name.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AuthError::AlreadyExists(username.to_string())
            }
            other => db_error(other),
        })?;

        tracing::info!(username, "Registered user");
        Ok(Account {
            user_id: id,
            username: username.to_string(),
        })
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        let row = self
            .get_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if hash_password(&row.password_salt, password) != row.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Account {
            user_id: row.id,
            username: row.username,
        })
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRow>, AuthError> {
        sqlx::query_as(
            "SELECT id, username, password_salt, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }
}

/// 16 random bytes, base64 encoded.
fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    STANDARD_NO_PAD.encode(bytes)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    STANDARD_NO_PAD.encode(hasher.finalize())
}

impl AuthProvider for UserRepository {
    fn register<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>> {
        Box::pin(self.create(username, password))
    }

    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>> {
        Box::pin(self.verify(username, password))
    }
}
