//! Operator preview endpoints.
//!
//! Both answer with HTML fragments, errors included, so the UI can swap the
//! result in directly.

use axum::{
    extract::{rejection::FormRejection, Form, State},
    response::Html,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::fragments;
use super::AppState;
use crate::template::Template;

const WEBHOOK_PATH: &str = "/wh/";

#[derive(Debug, Deserialize)]
pub struct UnsealForm {
    #[serde(default)]
    pub token: String,
}

/// Show the target URL and template sealed in a token or a full webhook URL.
pub async fn unseal(
    State(state): State<AppState>,
    form: Result<Form<UnsealForm>, FormRejection>,
) -> Html<String> {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => return Html(fragments::error(&format!("invalid form: {}", e.body_text()))),
    };

    let raw = form.token.trim();
    if raw.is_empty() {
        return Html(String::new());
    }

    match state.sealer.unseal(token_from_input(raw)) {
        Ok(sealed) => Html(fragments::unsealed(&sealed.target_url, &sealed.template)),
        Err(_) => {
            warn!("unseal_preview_invalid_token");
            Html(fragments::error("invalid token"))
        }
    }
}

/// Accept either a bare token or anything ending in `/wh/<token>`.
fn token_from_input(raw: &str) -> &str {
    match raw.rfind(WEBHOOK_PATH) {
        Some(idx) => &raw[idx + WEBHOOK_PATH.len()..],
        None => raw,
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderForm {
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub data: String,
}

/// Dry-run a template against example data.
///
/// Compiles a fresh template every time and leaves the relay cache alone.
pub async fn render(form: Result<Form<RenderForm>, FormRejection>) -> Html<String> {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => return Html(fragments::error(&format!("invalid form: {}", e.body_text()))),
    };

    if form.template.is_empty() {
        return Html(String::new());
    }

    let data = if form.data.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&form.data) {
            Ok(data) => data,
            Err(e) => return Html(fragments::error(&format!("example data: {e}"))),
        }
    };

    let template = match Template::compile(&form.template) {
        Ok(template) => template,
        Err(e) => return Html(fragments::error(&format!("template: {e}"))),
    };

    match template.render(&data) {
        Ok(output) => {
            debug!(output_length = output.len(), "render_preview");
            Html(fragments::preformatted(&String::from_utf8_lossy(&output)))
        }
        Err(e) => Html(fragments::error(&format!("render: {e}"))),
    }
}
