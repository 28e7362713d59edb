//! Bearer-token middleware
//!
//! Guards the tool manifest, `POST /mcp` and (optionally) the REST endpoints
//! with a static token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::ApiError;

/// Token every gated request must present
#[derive(Clone)]
pub struct ApiToken(Arc<str>);

impl ApiToken {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract the token from an `Authorization: Bearer ...` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ").map(str::trim)
}

/// Reject requests whose bearer token does not match with 403
pub async fn require_bearer(
    State(expected): State<ApiToken>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    if validate_api_key(provided, Some(expected.as_str())) {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "Rejected request without a valid token");
        ApiError::forbidden("Forbidden: invalid or missing API token").into_response()
    }
}

/// Simple API key validation
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(p), Some(e)) => p == e,
        (_, None) => true, // No key configured, allow
        (None, Some(_)) => false,
    }
}
