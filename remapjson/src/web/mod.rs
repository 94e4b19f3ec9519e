//! HTTP surface: the webhook relay plus the operator endpoints.
//!
//! ```text
//! POST /configure      url + template → {"webhook_url": ".../wh/<token>"}
//! ANY  /wh/:token      inbound JSON → template → target URL → response
//! POST /unseal         token → HTML preview of the sealed configuration
//! POST /render         template + example data → HTML preview
//! GET  /health, /ping
//! ```

pub mod auth;
pub mod client_ip;
pub mod error;
pub mod fragments;
pub mod handlers;
pub mod preview;
pub mod ratelimit;
pub mod routes;
pub mod state;


pub use error::ApiError;
pub use handlers::{configure, health, ping, relay_webhook, ConfigureResponse, HealthResponse};
pub use routes::router;
pub use state::AppState;
