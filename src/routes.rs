//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! ├──────────────────┤
//! │     Tracing      │ ← HTTP request/response logging
//! ├──────────────────┤
//! │   Catch Panic    │ ← 500 "Something went wrong!"
//! ├──────────────────┤
//! │ Security Headers │ ← CSP, HSTS, X-Frame-Options, ...
//! ├──────────────────┤
//! │    Sanitize      │ ← Strip `$`/`.` keys, HTML-escape strings (413 if too large)
//! ├──────────────────┤
//! │      CORS        │ ← Cross-origin headers, preflight
//! ├──────────────────┤
//! │  Rate Limiting   │ ← 429 on /api/contact when exceeded
//! ├──────────────────┤
//! │   Body Limit     │ ← MAX_REQUEST_BODY_SIZE for extractors
//! ├──────────────────┤
//! │      CSRF        │ ← 403 on unsafe methods without a valid token
//! └────────┬─────────┘
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `GET /api/csrf-token` - Issue a CSRF token
//! - `POST /api/contact` - Submit the contact form
//! - `GET /api/projects`, `POST /api/projects` - Portfolio projects
//! - `GET /health`, `GET /ready` - Health & readiness

use std::any::Any;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Request};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info, info_span, warn};

use crate::error::AppError;
use crate::handlers;
use crate::middleware::request_id::request_id;
use crate::middleware::{
    RateLimitError, RateLimitLayer, RequestIdLayer, sanitize_json_body, security_headers,
    verify_csrf,
};
use crate::state::AppState;

/// Path prefix covered by the contact rate limiter.
pub const CONTACT_PATH: &str = "/api/contact";

/// Build the application router with all routes and middleware configured.
///
/// Contact rate limiting is enabled when `CONTACT_RATE_LIMIT_MAX > 0`.
///
/// # Errors
///
/// Returns `RateLimitError` if the rate limit configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/api/csrf-token", get(handlers::csrf_token))
        .route(CONTACT_PATH, post(handlers::submit_contact))
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .fallback(not_found);

    // =========================================================================
    // Apply Middleware Stack (innermost first)
    // =========================================================================

    router = router.layer(from_fn_with_state(state.clone(), verify_csrf));

    info!(
        max_bytes = config.max_request_body_size,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    if config.rate_limiting_enabled() {
        info!(
            max = config.contact_rate_limit_max,
            window_secs = config.contact_rate_limit_window.as_secs(),
            trusted_proxies = config.trusted_proxies.len(),
            "Contact rate limiting enabled"
        );
        router = router.layer(
            RateLimitLayer::new(
                config.contact_rate_limit_max,
                config.contact_rate_limit_window,
                state.trusted_proxies.clone(),
            )?
            .with_path_prefix(CONTACT_PATH),
        );
    } else {
        info!("Contact rate limiting disabled (CONTACT_RATE_LIMIT_MAX=0)");
    }

    router = router
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(from_fn_with_state(state.clone(), sanitize_json_body))
        .layer(from_fn(security_headers))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(RequestIdLayer::new());

    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// `*` allows any origin without credentials. Explicit origins may send
/// credentials so the CSRF cookie reaches the API from the site's frontend.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods(cors::Any)
            .allow_headers(cors::Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Invalid origin in CORS_ALLOWED_ORIGINS, skipping");
                None
            }
        })
        .collect();

    // Wildcards are not allowed together with credentials
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Request span carrying the id assigned by `RequestIdLayer`.
fn request_span(req: &Request<Body>) -> Span {
    info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = request_id(req).unwrap_or("-"),
    )
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    error!(panic = %detail, "Handler panicked");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
