//! Per-client rate limiting for the contact endpoint.
//!
//! # Algorithm
//!
//! Uses the Governor crate's Generic Cell Rate Algorithm (GCRA). A quota of
//! `max` requests per `window` becomes one cell every `window / max` with a
//! burst of `max`, so a fresh client may send `max` requests at once and then
//! regains one request per `window / max`.
//!
//! # Scope
//!
//! The layer is applied router-wide but only counts requests whose path is
//! the configured prefix or lies below it (`/api/contact`, `/api/contact/...`).
//! Everything else passes straight through.
//!
//! # Response
//!
//! On limit exceeded (429), a JSON body plus:
//! - `Retry-After`: Seconds until the next request will be accepted
//! - `X-RateLimit-Limit`: Configured requests per window
//! - `X-RateLimit-Remaining`: Always `0`

use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use serde_json::json;
use thiserror::Error;
use tower::{Layer, Service};
use tracing::warn;

use super::ip::{TrustedProxyConfig, extract_client_ip};
use crate::metrics;

/// Message returned to throttled clients.
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many contact requests from this IP, please try again later.";

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("maximum requests per window must be greater than 0")]
    ZeroMax,

    #[error("rate limit window is too short for the configured maximum")]
    WindowTooShort,
}

/// Per-IP limiter keyed by the resolved client address.
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting layer for the Tower middleware stack.
///
/// ```rust,ignore
/// let layer = RateLimitLayer::new(5, Duration::from_secs(900), trusted)?
///     .with_path_prefix("/api/contact");
/// let app = Router::new().route("/api/contact", post(handler)).layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<KeyedLimiter>,
    /// Configured requests per window (for headers)
    limit: u32,
    path_prefix: Option<Arc<str>>,
    trusted_proxies: Arc<TrustedProxyConfig>,
}

impl RateLimitLayer {
    /// Allow `max` requests per `window` for each client.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::ZeroMax` if `max` is 0 and
    /// `RateLimitError::WindowTooShort` if `window / max` rounds to zero.
    pub fn new(
        max: u32,
        window: Duration,
        trusted_proxies: Arc<TrustedProxyConfig>,
    ) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(max).ok_or(RateLimitError::ZeroMax)?;
        let quota = Quota::with_period(window / max)
            .ok_or(RateLimitError::WindowTooShort)?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            limit: max,
            path_prefix: None,
            trusted_proxies,
        })
    }

    /// Only count requests at or below `prefix`.
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = Some(Arc::from(prefix.trim_end_matches('/')));
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            limit: self.limit,
            path_prefix: self.path_prefix.clone(),
            trusted_proxies: self.trusted_proxies.clone(),
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<KeyedLimiter>,
    limit: u32,
    path_prefix: Option<Arc<str>>,
    trusted_proxies: Arc<TrustedProxyConfig>,
}

impl<S> RateLimitService<S> {
    fn in_scope(&self, path: &str) -> bool {
        self.path_prefix
            .as_deref()
            .is_none_or(|prefix| path_has_prefix(path, prefix))
    }
}

/// Express-style mount matching: `/api/contact` covers `/api/contact` and
/// `/api/contact/x` but not `/api/contacts`.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if !self.in_scope(req.uri().path()) {
            return Box::pin(inner.call(req));
        }

        let client_ip = extract_client_ip(&req, &self.trusted_proxies).into_owned();

        let not_until = match self.limiter.check_key(&client_ip) {
            Ok(()) => return Box::pin(inner.call(req)),
            Err(not_until) => not_until,
        };

        let path = req.uri().path().to_string();
        let retry_after = not_until
            .wait_time_from(DefaultClock::default().now())
            .as_secs()
            .max(1);

        warn!(
            client_ip = %client_ip,
            path = %path,
            retry_after_secs = retry_after,
            "Rate limit exceeded for IP"
        );
        metrics::record_rate_limited(&path);

        let response = (
            StatusCode::TOO_MANY_REQUESTS,
            [
                ("Retry-After", retry_after.to_string()),
                ("X-RateLimit-Limit", self.limit.to_string()),
                ("X-RateLimit-Remaining", "0".to_string()),
            ],
            Json(json!({
                "error": "rate_limited",
                "message": RATE_LIMIT_MESSAGE,
            })),
        )
            .into_response();

        Box::pin(async move { Ok(response) })
    }
}
