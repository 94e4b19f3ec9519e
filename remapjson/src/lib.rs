//! remapjson - Stateless webhook adapter.
//!
//! Incoming JSON is reshaped through a template and forwarded to a target
//! URL. The target URL and template travel inside the webhook URL itself as
//! an AES-256-GCM sealed token, so the server keeps no configuration store.
//!
//! ## Architecture
//!
//! ```text
//! POST /configure → Sealer::seal → /wh/<token>
//! caller → /wh/<token> → Sealer::unseal → TemplateCache → render → target → response
//! ```

pub mod config;
pub mod seal;
pub mod template;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use seal::{SealError, SealedConfig, Sealer};
pub use template::{Template, TemplateCache, TemplateError};
pub use web::{router, AppState};
