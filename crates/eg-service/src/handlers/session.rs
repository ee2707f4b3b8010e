//! Session introspection handler.
//!
//! Reads the identity back out of the propagation headers exactly the way
//! a service behind the gateway would, rather than from the request
//! extension the filter also sets. A caller that can see its own identity
//! here has proven the whole chain: token validation, header stamping and
//! trusted-header consumption.

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::envelope::ErrorBody;
use common::headers::{X_USER_ID, X_USERNAME};
use serde::Serialize;

/// Identity echoed back to an authenticated caller.
#[derive(Debug, Serialize)]
pub struct SessionIdentity {
    /// Stable numeric account identifier.
    pub user_id: u64,
    /// Display name at token issuance time.
    pub username: String,
}

/// Echo the authenticated subject from the propagation headers.
///
/// The filter guarantees both headers on every request that reaches this
/// handler; their absence is a pipeline bug, answered with the internal
/// envelope rather than a guess.
#[tracing::instrument(skip_all, name = "eg.session.identity")]
pub async fn session_identity(headers: HeaderMap) -> Response {
    let user_id = headers
        .get(X_USER_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    let username = headers
        .get(X_USERNAME)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);

    match (user_id, username) {
        (Some(user_id), Some(username)) => {
            Json(SessionIdentity { user_id, username }).into_response()
        }
        _ => {
            tracing::error!(
                target: "eg.session",
                "Propagation headers missing on a filtered request"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::internal("/api/v1/session/identity")),
            )
                .into_response()
        }
    }
}
