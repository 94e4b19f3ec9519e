//! Per-client token bucket rate limiting.
//!
//! Each client address gets a bucket holding up to one second of requests.
//! Requests with no resolvable address share one bucket.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::client_ip::ClientIp;
use super::error::ErrorResponse;
use super::AppState;

/// Above this many tracked clients, idle buckets are dropped.
const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, now: Instant, rate: f64, burst: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(burst);
        self.last_refill = now;
    }
}

/// Shared limiter; clones see the same buckets.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    buckets: Arc<Mutex<HashMap<Option<IpAddr>, TokenBucket>>>,
}

impl RateLimiter {
    /// `requests_per_second == 0` disables limiting.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            rate: f64::from(requests_per_second),
            burst: f64::from(requests_per_second.max(1)),
            buckets: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.rate > 0.0
    }

    /// Take one token for `client`, or return how long until one is available.
    pub fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        if buckets.len() >= MAX_TRACKED_CLIENTS {
            let (rate, burst) = (self.rate, self.burst);
            buckets.retain(|_, bucket| {
                bucket.refill(now, rate, burst);
                bucket.tokens < burst
            });
        }

        let bucket = buckets.entry(client).or_insert(TokenBucket {
            tokens: self.burst,
            last_refill: now,
        });
        bucket.refill(now, self.rate, self.burst);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - bucket.tokens) / self.rate))
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Answer 429 with `Retry-After` once a client exceeds its rate.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = request.extensions().get::<ClientIp>().and_then(|ip| ip.0);
    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            let retry_after = wait.as_secs().max(1);
            warn!(
                client_ip = ?client,
                path = %request.uri().path(),
                retry_after_secs = retry_after,
                "rate_limit_exceeded"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(ErrorResponse {
                    error: "rate limit exceeded".to_string(),
                }),
            )
                .into_response()
        }
    }
}
