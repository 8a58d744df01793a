//! HTTP client for the scanlist server.
//!
//! Speaks the JSON API under `/api` and implements both the remote list
//! store and the auth provider contracts.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::store::RemoteListStore;
use crate::auth::{Account, AuthError, AuthProvider};
use crate::models::{List, ListRecord, ListUpdate};

/// Timeout for a single HTTP round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateListRequest<'a> {
    name: &'a str,
    user_id: &'a str,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// Client for the scanlist HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    server_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            server_url: server_url.into(),
            http,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns true if the server answers its health check.
    pub async fn health(&self) -> bool {
        let url = self.build_url("/health");
        match self.http.get(&url).timeout(Duration::from_secs(3)).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<HealthResponse>()
                .await
                .map(|h| h.status == "ok")
                .unwrap_or(false),
            _ => false,
        }
    }

    async fn create(&self, name: &str, owner_id: &str) -> Result<List, StoreError> {
        let url = self.build_url("/api/lists");
        let response = self
            .http
            .post(&url)
            .json(&CreateListRequest {
                name,
                user_id: owner_id,
            })
            .send()
            .await
            .map_err(network)?;
        let record: ListRecord = read_json(response, name).await?;
        Ok(record.into())
    }

    async fn for_owner(&self, owner_id: &str) -> Result<Vec<List>, StoreError> {
        let url = self.build_url("/api/lists");
        let response = self
            .http
            .get(&url)
            .query(&[("user_id", owner_id)])
            .send()
            .await
            .map_err(network)?;
        let records: Vec<ListRecord> = read_json(response, owner_id).await?;
        Ok(records.into_iter().map(List::from).collect())
    }

    async fn update(&self, list_id: &str, update: &ListUpdate) -> Result<List, StoreError> {
        let url = self.list_url(list_id);
        let response = self
            .http
            .put(&url)
            .json(update)
            .send()
            .await
            .map_err(network)?;
        let record: ListRecord = read_json(response, list_id).await?;
        Ok(record.into())
    }

    async fn delete(&self, list_id: &str) -> Result<(), StoreError> {
        let url = self.list_url(list_id);
        let response = self.http.delete(&url).send().await.map_err(network)?;
        check_status(response, list_id).await.map(|_| ())
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        let url = self.build_url(endpoint);
        let response = self
            .http
            .post(&url)
            .json(&Credentials { username, password })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AuthError::Network(e.to_string()));
        }

        let body = error_body(response).await;
        Err(match body.error.as_str() {
            "already_exists" => AuthError::AlreadyExists(username.to_string()),
            "invalid_credentials" => AuthError::InvalidCredentials,
            "invalid_request" => AuthError::Invalid(body.message),
            _ => AuthError::Server {
                status: status.as_u16(),
                message: body.message,
            },
        })
    }

    fn list_url(&self, list_id: &str) -> String {
        self.build_url(&format!("/api/lists/{}", urlencoding::encode(list_id)))
    }

    /// Builds a full URL, defaulting bare hosts to `http://`.
    fn build_url(&self, path: &str) -> String {
        let base_url = if self.server_url.starts_with("http://")
            || self.server_url.starts_with("https://")
        {
            self.server_url.clone()
        } else {
            format!("http://{}", self.server_url)
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }
}

fn network(e: reqwest::Error) -> StoreError {
    StoreError::Network(e.to_string())
}

async fn error_body(response: Response) -> ErrorBody {
    let status = response.status();
    response.json().await.unwrap_or_else(|_| ErrorBody {
        error: String::new(),
        message: status.to_string(),
    })
}

/// Maps non-success statuses onto [`StoreError`].
async fn check_status(response: Response, subject: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = error_body(response).await;
    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(subject.to_string()),
        StatusCode::BAD_REQUEST => StoreError::Invalid(body.message),
        _ => StoreError::Server {
            status: status.as_u16(),
            message: body.message,
        },
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    subject: &str,
) -> Result<T, StoreError> {
    check_status(response, subject)
        .await?
        .json()
        .await
        .map_err(network)
}

impl RemoteListStore for ApiClient {
    fn create_list<'a>(
        &'a self,
        name: &'a str,
        owner_id: &'a str,
    ) -> BoxFuture<'a, Result<List, StoreError>> {
        Box::pin(self.create(name, owner_id))
    }

    fn lists_for_owner<'a>(
        &'a self,
        owner_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<List>, StoreError>> {
        Box::pin(self.for_owner(owner_id))
    }

    fn update_list<'a>(
        &'a self,
        list_id: &'a str,
        update: ListUpdate,
    ) -> BoxFuture<'a, Result<List, StoreError>> {
        Box::pin(async move { self.update(list_id, &update).await })
    }

    fn delete_list<'a>(&'a self, list_id: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(self.delete(list_id))
    }
}

impl AuthProvider for ApiClient {
    fn register<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>> {
        Box::pin(self.authenticate("/api/register", username, password))
    }

    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Account, AuthError>> {
        Box::pin(self.authenticate("/api/login", username, password))
    }
}
