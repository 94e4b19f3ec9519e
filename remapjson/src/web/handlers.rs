//! Webhook relay and configuration endpoints.
//!
//! The relay handler is the hot path: unseal the token, render the inbound
//! JSON through the sealed template and forward the result, proxying the
//! target's answer back to the caller.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::FormRejection, Form, Path, State},
    http::{header, HeaderMap, Method},
    response::{Html, IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use super::error::ApiError;
use super::fragments;
use super::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Liveness probe.
pub async fn ping() -> &'static str {
    "pong"
}

// =============================================================================
// Configure
// =============================================================================

/// Form posted to `/configure`.
#[derive(Debug, Deserialize)]
pub struct ConfigureForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub webhook_url: String,
}

/// Validate a target URL and template, then mint a webhook URL for them.
///
/// Compiling goes through the shared cache, so the first relay call for the
/// new webhook is already warm. HTMX requests get an HTML fragment back.
pub async fn configure(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<ConfigureForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::InvalidForm(e.body_text()))?;

    if form.url.is_empty() || form.template.is_empty() {
        return Err(ApiError::MissingConfig);
    }
    validate_target_url(&form.url)?;

    state
        .templates
        .get_or_compile(&form.url, &form.template)
        .map_err(ApiError::InvalidTemplate)?;

    let token = state
        .sealer
        .seal(&form.url, &form.template)
        .map_err(ApiError::Seal)?;
    let webhook_url = state.config.webhook_url(&token);

    info!(
        target_url = %form.url,
        template_length = form.template.len(),
        cached_templates = state.templates.len(),
        "webhook_configured"
    );

    let is_htmx = headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true");

    if is_htmx {
        return Ok(Html(fragments::webhook_url(&webhook_url)).into_response());
    }
    Ok(Json(ConfigureResponse { webhook_url }).into_response())
}

/// Targets must be absolute `http` or `https` URLs.
fn validate_target_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidTargetUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::InvalidTargetUrl(format!(
            "unsupported scheme {other:?}"
        ))),
    }
}

// =============================================================================
// Relay
// =============================================================================

/// `ANY /wh/:token`
///
/// The request is forwarded with the inbound method and the rendered template
/// as its body. The target's status, `Content-Type` and body are returned
/// unchanged; other upstream headers are dropped.
pub async fn relay_webhook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    method: Method,
    body: Bytes,
) -> Result<Response, ApiError> {
    let sealed = state.sealer.unseal(&token).map_err(ApiError::InvalidToken)?;

    info!(
        remote_url = %sealed.target_url,
        template = %sealed.template,
        method = %method,
        body_length = body.len(),
        "webhook_received"
    );

    let data = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(ApiError::InvalidJson)?
    };

    let template = state
        .templates
        .get_or_compile(&sealed.target_url, &sealed.template)
        .map_err(ApiError::InvalidTemplate)?;

    let rendered = template.render(&data).map_err(ApiError::Render)?;

    let upstream = state
        .client
        .request(method, &sealed.target_url)
        .body(rendered)
        .send()
        .await
        .map_err(ApiError::Send)?;

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();

    info!(
        remote_url = %sealed.target_url,
        status = status.as_u16(),
        "webhook_relayed"
    );

    // The status is committed at this point; a broken upstream body can
    // only be logged.
    let stream = upstream.bytes_stream().inspect_err(|e| {
        warn!(error = %e, "relay_response_copy_failed");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}
