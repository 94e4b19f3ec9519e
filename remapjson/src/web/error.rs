//! API errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::seal::SealError;
use crate::template::TemplateError;

/// Every way a JSON endpoint can fail.
///
/// Delivery and internal failures expose a generic message; the cause is
/// only logged.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid form data: {0}")]
    InvalidForm(String),

    #[error("missing URL or template")]
    MissingConfig,

    #[error("invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(#[source] TemplateError),

    #[error("invalid token")]
    InvalidToken(#[source] SealError),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to execute template")]
    Render(#[source] TemplateError),

    #[error("failed to send request")]
    Send(#[source] reqwest::Error),

    #[error("failed to seal configuration")]
    Seal(#[source] SealError),
}

/// Error body: `{"error": "..."}`
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidForm(_)
            | Self::MissingConfig
            | Self::InvalidTargetUrl(_)
            | Self::InvalidTemplate(_)
            | Self::InvalidToken(_)
            | Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) | Self::Send(_) | Self::Seal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            // Unseal failures must not reveal whether the key or the data was wrong.
            Self::InvalidToken(_) => warn!(status = status.as_u16(), "invalid_token"),
            Self::Render(cause) => warn!(status = status.as_u16(), error = %cause, "render_failed"),
            Self::Send(cause) => warn!(status = status.as_u16(), error = %cause, "relay_send_failed"),
            Self::Seal(cause) => warn!(status = status.as_u16(), error = %cause, "seal_failed"),
            other => warn!(status = status.as_u16(), error = %other, "request_rejected"),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_token_hides_cause() {
        let (status, body) = body_of(ApiError::InvalidToken(SealError::Decrypt)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"error":"invalid token"}"#);
    }

    #[tokio::test]
    async fn test_client_errors_carry_detail() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let (status, body) = body_of(ApiError::InvalidJson(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with(r#"{"error":"invalid JSON: "#), "{body}");
    }

    #[tokio::test]
    async fn test_delivery_errors_are_generic() {
        let (status, body) = body_of(ApiError::Render(TemplateError::exec("boom"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"failed to execute template"}"#);

        let (status, body) = body_of(ApiError::Seal(SealError::Encrypt)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"failed to seal configuration"}"#);
    }
}
