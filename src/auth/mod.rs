//! Pre-shared key authentication for the admin API.
//!
//! Keys are compared in constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject API requests that do not carry the configured key.
///
/// With no key configured every request passes.
pub async fn require_api_key(expected: Option<String>, request: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    match presented_key(request.headers()) {
        Some(key) if keys_match(key, &expected) => next.run(request).await,
        Some(_) => reject("Invalid API key"),
        None => reject("Missing API key"),
    }
}

/// Key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn keys_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn reject(message: &str) -> Response {
    tracing::warn!("Rejected admin API request: {}", message);
    AppError::Unauthorized(message.to_string()).into_response()
}
