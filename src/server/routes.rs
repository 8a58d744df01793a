//! HTTP handlers for the list server.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `POST /api/register`, `POST /api/login`: Account management
//! - `GET|POST /api/lists`: Lists of an owner / create a list
//! - `PUT|DELETE /api/lists/{id}`: Full-replace update / delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{Account, AuthError, AuthProvider};
use crate::models::{ListRecord, ListUpdate};
use crate::sync::{RemoteListStore, StoreError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub lists: Arc<dyn RemoteListStore>,
    pub users: Arc<dyn AuthProvider>,
}

/// Error response body: `{error, message}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// A failed request, rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = self.error, message = %self.message, "Request failed");
        }
        (
            self.status,
            Json(ErrorBody {
                error: self.error,
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        let message = e.to_string();
        match e {
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not_found", message),
            StoreError::Invalid(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
            }
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let message = e.to_string();
        match e {
            AuthError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, "already_exists", message),
            AuthError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "invalid_credentials", message)
            }
            AuthError::Invalid(_) => Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/lists", get(lists_for_owner).post(create_list))
        .route("/api/lists/{id}", put(update_list).delete(delete_list))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Account>, ApiError> {
    let account = state.users.register(&body.username, &body.password).await?;
    Ok(Json(account))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Json<Account>, ApiError> {
    let account = state.users.login(&body.username, &body.password).await?;
    Ok(Json(account))
}

#[derive(Deserialize)]
struct OwnerQuery {
    user_id: Option<String>,
}

async fn lists_for_owner(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<ListRecord>>, ApiError> {
    let Some(owner_id) = query.user_id.filter(|id| !id.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let lists = state.lists.lists_for_owner(&owner_id).await?;
    Ok(Json(lists.iter().map(ListRecord::from).collect()))
}

#[derive(Deserialize)]
struct CreateListRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    user_id: String,
}

async fn create_list(
    State(state): State<AppState>,
    Json(body): Json<CreateListRequest>,
) -> Result<Json<ListRecord>, ApiError> {
    let list = state.lists.create_list(&body.name, &body.user_id).await?;
    Ok(Json(ListRecord::from(&list)))
}

async fn update_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ListUpdate>,
) -> Result<Json<ListRecord>, ApiError> {
    let list = state.lists.update_list(&id, update).await?;
    Ok(Json(ListRecord::from(&list)))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn delete_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.lists.delete_list(&id).await?;
    Ok(Json(MessageResponse { message: "Deleted" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let not_found = ApiError::from(StoreError::NotFound("x".to_string()));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.error, "not_found");

        let invalid = ApiError::from(StoreError::Invalid("empty".to_string()));
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

        let db = ApiError::from(StoreError::Database("locked".to_string()));
        assert_eq!(db.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        let exists = ApiError::from(AuthError::AlreadyExists("alice".to_string()));
        assert_eq!(exists.status, StatusCode::CONFLICT);
        assert_eq!(exists.error, "already_exists");

        let creds = ApiError::from(AuthError::InvalidCredentials);
        assert_eq!(creds.status, StatusCode::UNAUTHORIZED);
        assert_eq!(creds.error, "invalid_credentials");

        let invalid = ApiError::from(AuthError::Invalid("blank".to_string()));
        assert_eq!(invalid.error, "invalid_request");
    }
}
