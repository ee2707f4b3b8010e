//! Perimeter token filter.
//!
//! Applied as a global layer: every request, including ones that will
//! 404, passes through before routing. Allow-listed path prefixes go
//! straight through. Everything else must carry a live access token; the
//! validated identity is stamped into the propagation headers so anything
//! behind the gateway can trust `x-user-id` and `x-username` without
//! parsing tokens itself. Rejections share one envelope body whatever the
//! cause, so a probing caller cannot distinguish a bad signature from a
//! revoked token.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::claims::TokenKind;
use common::envelope::ErrorBody;
use common::headers::{AUTHORIZATION, BEARER_PREFIX, X_USER_ID, X_USERNAME};
use common::types::Identity;
use common::validator::TokenValidator;
use tracing::instrument;

use crate::config::AllowList;
use crate::observability::metrics::record_auth_decision;

/// Shared state for the perimeter filter.
#[derive(Clone)]
pub struct FilterState {
    /// Validator sharing the platform signing secret and denylist.
    pub validator: TokenValidator,
    /// Path prefixes exempt from validation.
    pub allow_list: AllowList,
}

/// Pull the bearer token out of the `Authorization` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authenticate a request at the perimeter.
///
/// Allow-listed paths pass untouched. Everything else needs a live access
/// token: structure, signature, expiry, kind and revocation are checked
/// in order, and any failure yields the uniform 401 envelope. On success
/// the inbound identity headers are replaced with the validated subject
/// before the request continues.
#[instrument(skip_all, name = "eg.middleware.auth", fields(outcome))]
pub async fn authenticate(
    State(state): State<Arc<FilterState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if state.allow_list.matches(&path) {
        record_outcome("bypassed");
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(request.headers()) else {
        record_outcome("rejected");
        return reject(&path);
    };

    let validated = state.validator.validate(token, TokenKind::Access).await;
    let identity = match validated {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(target: "eg.middleware.auth", error = ?e, "Rejecting request");
            record_outcome("rejected");
            return reject(&path);
        }
    };

    if let Err(response) = stamp_identity(&mut request, &identity, &path) {
        record_outcome("errored");
        return response;
    }

    record_outcome("allowed");
    next.run(request).await
}

fn record_outcome(outcome: &'static str) {
    tracing::Span::current().record("outcome", outcome);
    record_auth_decision(outcome);
}

fn reject(path: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::unauthorized(path)),
    )
        .into_response()
}

/// Stamp the validated subject into the propagation headers and request
/// extensions.
///
/// `insert` drops every inbound copy of a header, so spoofed values
/// cannot survive alongside the stamped ones. A subject name that cannot
/// form a header value fails the request rather than letting it proceed
/// half-stamped.
fn stamp_identity(
    request: &mut Request,
    identity: &Identity,
    path: &str,
) -> Result<(), Response> {
    let Ok(username) = HeaderValue::from_str(&identity.subject_name) else {
        tracing::error!(
            target: "eg.middleware.auth",
            subject_id = %identity.subject_id,
            "Validated subject name cannot be propagated as a header"
        );
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::internal(path)),
        )
            .into_response());
    };

    let headers = request.headers_mut();
    headers.insert(
        HeaderName::from_static(X_USER_ID),
        HeaderValue::from(identity.subject_id.0),
    );
    headers.insert(HeaderName::from_static(X_USERNAME), username);
    request.extensions_mut().insert(identity.clone());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use common::types::SubjectId;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn request_with_spoofed_headers() -> Request {
        axum::http::Request::builder()
            .uri("/api/v1/session/identity")
            .header(X_USER_ID, "999")
            .header(X_USER_ID, "1000")
            .header(X_USERNAME, "mallory")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extracts_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");

        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_yields_nothing() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme_yields_nothing() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");

        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_empty_token_yields_nothing() {
        let headers = headers_with_auth("Bearer ");

        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        let headers = headers_with_auth("bearer abc.def.ghi");

        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_stamp_replaces_spoofed_headers() {
        let mut request = request_with_spoofed_headers();
        let identity = Identity::new(SubjectId(42), "ada");

        assert!(stamp_identity(&mut request, &identity, "/x").is_ok());

        let ids: Vec<_> = request.headers().get_all(X_USER_ID).iter().collect();
        assert_eq!(ids.len(), 1, "spoofed duplicates must not survive");
        assert_eq!(request.headers().get(X_USER_ID).unwrap(), "42");
        assert_eq!(request.headers().get(X_USERNAME).unwrap(), "ada");
        assert_eq!(
            request.extensions().get::<Identity>(),
            Some(&identity),
            "handlers read the identity from the extensions"
        );
    }

    #[test]
    fn test_unpropagatable_name_is_refused() {
        let mut request = request_with_spoofed_headers();
        let identity = Identity::new(SubjectId(7), "bad\nname");

        assert!(stamp_identity(&mut request, &identity, "/x").is_err());
    }
}
