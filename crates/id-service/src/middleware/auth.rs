//! Bearer token authentication for the service's own protected routes.
//!
//! Only the password change route needs this; login, register, refresh
//! and logout authenticate through the credentials or tokens in their own
//! payloads. The middleware validates the access token (structure,
//! signature, expiry, kind, revocation) and stashes the resulting
//! [`Identity`] in the request extensions for the handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use common::claims::TokenKind;
use common::headers::{AUTHORIZATION, BEARER_PREFIX};
use common::validator::TokenValidator;
use tracing::instrument;

use crate::errors::IdError;

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Validator sharing the service's signing authority and denylist.
    pub validator: TokenValidator,
}

/// Pull the bearer token out of the `Authorization` header.
///
/// # Errors
///
/// Returns [`IdError::InvalidToken`] when the header is absent, is not a
/// `Bearer` scheme, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, IdError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(IdError::InvalidToken)?;
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(IdError::InvalidToken)
}

/// Reject the request unless it carries a live access token.
///
/// # Errors
///
/// Any validation failure maps through [`IdError::from`] to the uniform
/// token rejection; a denylist outage rejects as well.
#[instrument(skip_all, name = "id.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, IdError> {
    let token = extract_bearer_token(request.headers())?;

    let identity = state
        .validator
        .validate(token, TokenKind::Access)
        .await
        .map_err(|e| {
            tracing::debug!(target: "id.middleware.auth", error = ?e, "Rejecting request");
            IdError::from(e)
        })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
