//! HTTP handlers for the authentication endpoints.
//!
//! Handlers stay thin: deserialize, delegate to [`AuthService`], record
//! the outcome, map the result. All policy and security decisions live in
//! the service layer; all wire-shape decisions live in `errors.rs` and
//! the response models.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use common::types::Identity;
use tracing::{instrument, Span};

use crate::errors::IdError;
use crate::middleware::auth::extract_bearer_token;
use crate::models::{
    ChangePasswordRequest, CodeRequest, LoginRequest, LoginResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, RegisterResponse,
};
use crate::observability::metrics::{record_auth_op, record_error};
use crate::observability::ErrorCategory;
use crate::routes::AppState;

/// Stamp the span, the operation histogram and (on failure) the error
/// counter for a finished operation.
fn record_outcome(operation: &'static str, start: Instant, error: Option<&IdError>) {
    match error {
        None => {
            Span::current().record("status", "success");
            record_auth_op(operation, "success", start.elapsed());
        }
        Some(e) => {
            Span::current().record("status", "error");
            record_auth_op(operation, "error", start.elapsed());
            record_error(
                operation,
                ErrorCategory::from(e).as_str(),
                e.status().as_u16(),
            );
        }
    }
}

/// Handle `POST /api/v1/auth/register`.
#[instrument(skip_all, name = "id.auth.register", fields(status))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), IdError> {
    let start = Instant::now();
    match state.auth.register(payload).await {
        Ok(record) => {
            record_outcome("register", start, None);
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    subject_id: record.subject_id,
                    username: record.username,
                }),
            ))
        }
        Err(e) => {
            record_outcome("register", start, Some(&e));
            Err(e)
        }
    }
}

/// Handle `POST /api/v1/auth/login`.
#[instrument(skip_all, name = "id.auth.login", fields(status))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, IdError> {
    let start = Instant::now();
    match state.auth.login(&payload.username, &payload.password).await {
        Ok(response) => {
            record_outcome("login", start, None);
            Ok(Json(response))
        }
        Err(e) => {
            record_outcome("login", start, Some(&e));
            Err(e)
        }
    }
}

/// Handle `POST /api/v1/auth/refresh`.
#[instrument(skip_all, name = "id.auth.refresh", fields(status))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, IdError> {
    let start = Instant::now();
    match state.auth.refresh(&payload.refresh_token).await {
        Ok(response) => {
            record_outcome("refresh", start, None);
            Ok(Json(response))
        }
        Err(e) => {
            record_outcome("refresh", start, Some(&e));
            Err(e)
        }
    }
}

/// Handle `POST /api/v1/auth/logout`.
///
/// Reads the token straight from the `Authorization` header instead of
/// going through the validating middleware: a logout presenting an
/// expired or already-revoked token must still acknowledge, and the
/// middleware would reject both.
#[instrument(skip_all, name = "id.auth.logout", fields(status))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, IdError> {
    let start = Instant::now();
    let token = match extract_bearer_token(&headers) {
        Ok(token) => token,
        Err(e) => {
            record_outcome("logout", start, Some(&e));
            return Err(e);
        }
    };
    match state.auth.logout(token).await {
        Ok(()) => {
            record_outcome("logout", start, None);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            record_outcome("logout", start, Some(&e));
            Err(e)
        }
    }
}

/// Handle `POST /api/v1/auth/password`.
///
/// Sits behind the authentication middleware; the [`Identity`] extension
/// is inserted there.
#[instrument(skip_all, name = "id.auth.change_password", fields(status))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, IdError> {
    let start = Instant::now();
    match state
        .auth
        .change_password(
            identity.subject_id,
            &payload.old_password,
            &payload.new_password,
        )
        .await
    {
        Ok(()) => {
            record_outcome("change_password", start, None);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            record_outcome("change_password", start, Some(&e));
            Err(e)
        }
    }
}

/// Handle `POST /api/v1/auth/code`.
#[instrument(skip_all, name = "id.auth.request_code", fields(status))]
pub async fn request_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CodeRequest>,
) -> Result<StatusCode, IdError> {
    let start = Instant::now();
    match state.auth.request_code(&payload.target).await {
        Ok(()) => {
            record_outcome("request_code", start, None);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            record_outcome("request_code", start, Some(&e));
            Err(e)
        }
    }
}
