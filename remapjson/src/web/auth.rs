//! HTTP Basic Auth for the management routes.
//!
//! Enabled only when a password is configured (blank values are dropped
//! while loading [`Config`](crate::Config)). The user name is fixed.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use super::AppState;

pub const AUTH_USER: &str = "remapjson";

const CHALLENGE: &str = "Basic realm=\"remapjson\", charset=\"UTF-8\"";

/// Reject requests without valid credentials when a password is configured.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(password) = state.config.password.as_deref() else {
        return next.run(request).await;
    };

    if verify_basic_auth(request.headers(), AUTH_USER, password) {
        return next.run(request).await;
    }

    warn!(
        path = %request.uri().path(),
        has_credentials = request.headers().contains_key(header::AUTHORIZATION),
        "basic_auth_rejected"
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE))],
        "Unauthorized",
    )
        .into_response()
}

/// Check an `Authorization: Basic ...` header against the expected credentials.
pub fn verify_basic_auth(headers: &HeaderMap, user: &str, password: &str) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
    else {
        return false;
    };

    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((given_user, given_password)) = decoded.split_once(':') else {
        return false;
    };

    // Evaluate both so timing does not reveal which half matched.
    let user_ok = constant_time_compare(given_user, user);
    let password_ok = constant_time_compare(given_password, password);
    user_ok & password_ok
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
