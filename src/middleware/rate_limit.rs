//! Per-client throttling for the login route
//!
//! Sliding window of attempt timestamps per client IP. The client IP is the
//! first `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;

use super::client::client_ip;
use crate::config::CONFIG;
use crate::error::AppError;
use crate::state::AppState;

/// Entries are pruned once the map grows past this many clients
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Clone)]
pub struct LoginRateLimiter {
    max_attempts: usize,
    window: Duration,
    entries: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            window,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            CONFIG.auth.login_max_attempts,
            Duration::from_secs(CONFIG.auth.login_window_secs),
        )
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an attempt; false once `ip` has used up its window
    pub fn record_attempt(&self, ip: IpAddr) -> bool {
        self.record_attempt_at(ip, Instant::now())
    }

    pub fn record_attempt_at(&self, ip: IpAddr, now: Instant) -> bool {
        let window = self.window;
        let mut entries = self.entries.lock();
        if entries.len() > PRUNE_THRESHOLD {
            entries.retain(|_, attempts| {
                attempts.iter().any(|t| now.saturating_duration_since(*t) < window)
            });
        }

        let attempts = entries.entry(ip).or_default();
        attempts.retain(|t| now.saturating_duration_since(*t) < window);
        if attempts.len() >= self.max_attempts {
            return false;
        }
        attempts.push(now);
        true
    }

    pub fn remaining_attempts(&self, ip: IpAddr) -> usize {
        let now = Instant::now();
        let used = self.entries.lock().get(&ip).map_or(0, |attempts| {
            attempts
                .iter()
                .filter(|t| now.saturating_duration_since(**t) < self.window)
                .count()
        });
        self.max_attempts.saturating_sub(used)
    }
}

/// Reject login attempts beyond the per-client budget with 429
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(request.headers(), request.extensions()) else {
        tracing::warn!("Cannot determine client IP for login throttling, allowing request");
        return next.run(request).await;
    };

    if state.login_limiter.record_attempt(ip) {
        return next.run(request).await;
    }

    tracing::warn!(client_ip = %ip, "Login rate limit exceeded");
    let mut response =
        AppError::TooManyRequests("Too many login attempts. Please try again later.".to_string())
            .into_response();
    if let Ok(value) = HeaderValue::from_str(&state.login_limiter.window().as_secs().to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
