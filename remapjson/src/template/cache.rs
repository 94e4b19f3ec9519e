//! Compiled template cache keyed by configuration fingerprint.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{Template, TemplateError};

/// SHA-256 over a sealed configuration.
///
/// The target URL is length-prefixed so that `("ab", "c")` and `("a", "bc")`
/// hash differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn new(target_url: &str, template: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((target_url.len() as u64).to_be_bytes());
        hasher.update(target_url.as_bytes());
        hasher.update(template.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Process-wide map from fingerprint to compiled template.
///
/// Entries are never evicted. Concurrent misses for the same fingerprint may
/// both compile; the last insert wins and both results are equivalent.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<Fingerprint, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled template for this configuration, compiling it on a miss.
    ///
    /// Compile failures are returned and nothing is cached.
    pub fn get_or_compile(
        &self,
        target_url: &str,
        template: &str,
    ) -> Result<Arc<Template>, TemplateError> {
        let key = Fingerprint::new(target_url, template);

        if let Some(hit) = self.read().get(&key) {
            debug!(fingerprint = %key, "template_cache_hit");
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(Template::compile(template)?);
        self.write().insert(key, Arc::clone(&compiled));
        debug!(fingerprint = %key, "template_cache_miss");

        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Inserts are single operations, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Fingerprint, Arc<Template>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Fingerprint, Arc<Template>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
