//! Shared application state.

use std::sync::Arc;

use super::ratelimit::RateLimiter;
use crate::seal::Sealer;
use crate::template::TemplateCache;
use crate::Config;

/// Idle outbound connections kept per target host.
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// State handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sealer: Arc<Sealer>,
    pub templates: Arc<TemplateCache>,
    pub client: reqwest::Client,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Build the sealer, an empty template cache, the rate limiter and the
    /// outbound client.
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .connection_verbose(config.debug)
            .build()?;

        Ok(Self {
            sealer: Arc::new(Sealer::new(&config.secret)),
            templates: Arc::new(TemplateCache::new()),
            rate_limiter: RateLimiter::new(config.rate_limit_rps),
            config: Arc::new(config),
            client,
        })
    }
}
