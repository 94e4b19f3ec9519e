//! Sealed webhook configurations.
//!
//! Routing configuration lives inside the webhook URL itself:
//!
//! ```text
//! (target_url, template) → JSON → AES-256-GCM → base64url → /wh/<token>
//! ```

pub mod sealer;
pub mod types;

pub use sealer::{Sealer, NONCE_LEN};
pub use types::{SealError, SealedConfig};
