//! Per-client-IP token bucket rate limiting.
//!
//! Each IP gets a bucket holding `burst` tokens that refills linearly over
//! `window`, so a client may spend the full burst at once and then regains
//! capacity at `burst / window`. Requests with no known peer address share
//! the bucket of `0.0.0.0`.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::http::header::RETRY_AFTER;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::AppError;

/// Bucket count above which full (idle) buckets are dropped.
const PRUNE_THRESHOLD: usize = 4096;

/// Token bucket with millitoken precision.
#[derive(Debug)]
struct TokenBucket {
    tokens_millis: u64,
    last_refill: Instant,
}

impl TokenBucket {
    fn full(capacity_millis: u64, now: Instant) -> Self {
        Self {
            tokens_millis: capacity_millis,
            last_refill: now,
        }
    }

    fn refill(&mut self, capacity_millis: u64, refill_per_sec: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refill = (elapsed.as_secs_f64() * refill_per_sec * 1000.0) as u64;
        if refill > 0 {
            self.tokens_millis = self.tokens_millis.saturating_add(refill).min(capacity_millis);
            self.last_refill = now;
        }
    }
}

/// Rate limiter keyed by client IP.
#[derive(Debug)]
pub struct IpRateLimiter {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    capacity_millis: u64,
    refill_per_sec: f64,
}

impl IpRateLimiter {
    /// Allows `burst` requests per IP, refilled evenly over `window`.
    #[must_use]
    pub fn new(burst: u64, window: Duration) -> Self {
        let burst = burst.max(1);
        let window_secs = window.as_secs_f64().max(f64::EPSILON);
        let refill_per_sec = burst as f64 / window_secs;
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity_millis: burst.saturating_mul(1000),
            refill_per_sec,
        }
    }

    /// Takes one token for `ip`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RateLimited`] with an estimated retry delay when
    /// the bucket is empty.
    pub fn check(&self, ip: IpAddr) -> Result<(), AppError> {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), AppError> {
        let mut buckets = self.buckets.lock();
        if buckets.len() >= PRUNE_THRESHOLD {
            self.prune(&mut buckets, now);
        }

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::full(self.capacity_millis, now));
        bucket.refill(self.capacity_millis, self.refill_per_sec, now);

        if bucket.tokens_millis >= 1000 {
            bucket.tokens_millis -= 1000;
            return Ok(());
        }

        let deficit = 1000_u64.saturating_sub(bucket.tokens_millis);
        let retry_after_ms = ((deficit as f64 / self.refill_per_sec).ceil() as u64).max(1);
        Err(AppError::RateLimited { retry_after_ms })
    }

    /// Drops buckets that have refilled completely; they are
    /// indistinguishable from a fresh bucket.
    fn prune(&self, buckets: &mut HashMap<IpAddr, TokenBucket>, now: Instant) {
        buckets.retain(|_, bucket| {
            bucket.refill(self.capacity_millis, self.refill_per_sec, now);
            bucket.tokens_millis < self.capacity_millis
        });
    }
}

/// Middleware rejecting requests whose client IP has exhausted its bucket.
pub async fn enforce(
    State(limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| addr.ip());

    match limiter.check(ip) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(%ip, path = %request.uri().path(), "rate limit exceeded");
            let retry_secs = match &err {
                AppError::RateLimited { retry_after_ms } => retry_after_ms.div_ceil(1000),
                _ => 1,
            };
            let mut response = err.into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_secs));
            response
        }
    }
}
