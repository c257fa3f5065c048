//! HTTP middleware for security, rate limiting, and observability.
//!
//! - **Request ID**: Generation and propagation of `X-Request-Id`
//! - **Security Headers**: Hardening headers on every response
//! - **Sanitization**: Operator-key stripping and HTML escaping of JSON bodies
//! - **Rate Limiting**: Per-client GCRA limiter on the contact endpoint
//! - **CSRF**: Cookie secret plus salted token on unsafe methods
//!
//! # Architecture
//!
//! ```text
//! Request → Request ID → Trace → Catch Panic → Security Headers → Sanitize
//!         → CORS → Rate Limit → Body Limit → CSRF → Handler
//!                      ↓                       ↓
//!               429 Too Many            403 invalid_csrf_token
//! ```
//!
//! See `routes::build_router` for how the stack is assembled.

pub mod csrf;
pub mod ip;
pub mod rate_limit;
pub mod request_id;
pub mod sanitize;
pub mod security_headers;

pub use csrf::{CsrfProtection, verify_csrf};
pub use ip::{TrustedProxyConfig, UNKNOWN_IP, extract_client_ip};
pub use rate_limit::{RateLimitError, RateLimitLayer};
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer};
pub use sanitize::sanitize_json_body;
pub use security_headers::security_headers;
