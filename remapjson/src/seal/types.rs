//! Types carried inside a sealed webhook token.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Routing configuration recovered from a webhook token.
///
/// Field names on the wire are kept short since every byte of the plaintext
/// ends up base64-encoded in the webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedConfig {
    /// Where the rendered payload is delivered
    #[serde(rename = "url")]
    pub target_url: String,
    /// Template applied to the inbound JSON payload
    #[serde(rename = "tmpl")]
    pub template: String,
}

impl SealedConfig {
    pub fn new(target_url: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            template: template.into(),
        }
    }
}

/// Errors raised while sealing or unsealing a token.
///
/// Every authentication failure maps to `Decrypt`, so a wrong secret and a
/// tampered token look the same.
#[derive(Error, Debug)]
pub enum SealError {
    #[error("encode config: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("generate nonce: {0}")]
    Entropy(#[source] rand::Error),

    #[error("encrypt config")]
    Encrypt,

    #[error("decode token: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("token too short")]
    TooShort,

    #[error("decryption failed")]
    Decrypt,

    #[error("decode config: {0}")]
    Malformed(#[source] serde_json::Error),
}
