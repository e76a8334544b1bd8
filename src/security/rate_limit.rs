//! Per-client rate limiting middleware.
//!
//! # Responsibilities
//! - Track accepted submissions per client address in a rolling window
//! - Reject over-ceiling requests with 429 and a Retry-After duration
//! - Keep the counter map from growing without bound
//!
//! # Design Decisions
//! - Rolling timestamp log per client: the ceiling holds over *any* window of
//!   the configured duration, not just aligned buckets
//! - State is injected and process-local; multi-instance deployments each
//!   count independently (accepted scaling limitation)
//! - Only admitted requests consume a slot, so a rejected client is not
//!   pushed further into the future by its own retries

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::observability::metrics;

/// Entry count above which a check also sweeps idle clients from the map.
const SWEEP_THRESHOLD: usize = 1024;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted,
    Rejected { retry_after: Duration },
}

/// Sliding-window counter keyed by client address.
pub struct RateLimiter {
    /// Flow label for logs and metrics (`contact`, `careers`).
    name: &'static str,
    max_requests: u32,
    window: Duration,
    trust_proxy: bool,
    hits: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration, trust_proxy: bool) -> Self {
        Self {
            name,
            max_requests,
            window,
            trust_proxy,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Check and record one request from `client`.
    pub fn check(&self, client: IpAddr) -> RateDecision {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter mutex poisoned");

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, stamps| {
                stamps
                    .back()
                    .is_some_and(|last| now.duration_since(*last) < window)
            });
        }

        let stamps = hits.entry(client).or_default();
        while let Some(oldest) = stamps.front() {
            if now.duration_since(*oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if (stamps.len() as u32) < self.max_requests {
            stamps.push_back(now);
            RateDecision::Admitted
        } else {
            // Ceiling reached: the slot frees when the oldest stamp ages out.
            let retry_after = match stamps.front() {
                Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                None => self.window,
            };
            RateDecision::Rejected { retry_after }
        }
    }

    /// Resolve the client key: first `X-Forwarded-For` hop when proxy headers
    /// are trusted, otherwise the socket peer address.
    pub fn client_ip(&self, headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
        if self.trust_proxy {
            if let Some(forwarded) = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
            {
                return forwarded;
            }
        }
        peer.ip()
    }
}

/// Middleware gating a submission route behind its flow's limiter.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = limiter.client_ip(request.headers(), peer);

    match limiter.check(client) {
        RateDecision::Admitted => next.run(request).await,
        RateDecision::Rejected { retry_after } => {
            tracing::warn!(
                flow = limiter.name,
                client = %client,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(limiter.name);
            AppError::RateLimited { retry_after }.into_response()
        }
    }
}
