//! CSRF protection using a cookie-held secret and salted tokens.
//!
//! # Scheme
//!
//! ```text
//! secret = hex(18 random bytes)                   (HttpOnly cookie)
//! token  = salt "-" hex(sha256(salt "-" secret))  (8-char alphanumeric salt)
//! ```
//!
//! `GET /api/csrf-token` sets the secret cookie on first use and hands out a
//! fresh token. Any number of tokens verify against the same secret, so a
//! client can fetch one per form. A page on another origin cannot read the
//! response (CORS) or the cookie (HttpOnly), so it cannot forge a token.
//!
//! # Verification
//!
//! `GET`, `HEAD` and `OPTIONS` are never checked. Every other request must
//! carry the secret cookie and a token, taken from the first of:
//!
//! 1. Headers `csrf-token`, `xsrf-token`, `x-csrf-token`, `x-xsrf-token`
//! 2. The `_csrf` query parameter
//! 3. A top-level `_csrf` string field in a JSON body
//!
//! Tokens are compared in constant time.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::Rng;
use rand::distr::{Alphanumeric, SampleString};
use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::state::AppState;

/// Random bytes in a secret (hex-encoded to 36 characters).
const SECRET_BYTES: usize = 18;

/// Salt length in a token.
const SALT_LEN: usize = 8;

/// Headers checked for a token, in order.
pub const TOKEN_HEADERS: [&str; 4] = ["csrf-token", "xsrf-token", "x-csrf-token", "x-xsrf-token"];

/// Query parameter and JSON field carrying a token.
pub const TOKEN_FIELD: &str = "_csrf";

/// Token issuing and verification bound to one cookie configuration.
#[derive(Debug, Clone)]
pub struct CsrfProtection {
    cookie_name: String,
    cookie_secure: bool,
}

impl CsrfProtection {
    pub fn new(cookie_name: impl Into<String>, cookie_secure: bool) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            cookie_secure,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.csrf_cookie_name.clone(), config.csrf_cookie_secure)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// A fresh random secret.
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill(&mut bytes);
        hex::encode(bytes)
    }

    /// A fresh token for `secret`.
    pub fn create_token(secret: &str) -> String {
        let salt = Alphanumeric.sample_string(&mut rand::rng(), SALT_LEN);
        token_with_salt(&salt, secret)
    }

    /// Whether `token` was derived from `secret`.
    pub fn verify(secret: &str, token: &str) -> bool {
        let Some((salt, _)) = token.split_once('-') else {
            return false;
        };
        let expected = token_with_salt(salt, secret);
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }

    /// The secret carried by the request's cookie, if any.
    pub fn secret_from<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.cookie_name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
    }

    /// Cookie carrying `secret` back to the client.
    pub fn secret_cookie(&self, secret: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), secret))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.cookie_secure)
            .build()
    }

    /// Reuse the client's secret or mint one. Returns the (possibly updated)
    /// jar and a new token.
    pub fn issue_token(&self, jar: CookieJar) -> (CookieJar, String) {
        if let Some(secret) = self.secret_from(&jar) {
            let token = Self::create_token(secret);
            return (jar, token);
        }

        let secret = Self::generate_secret();
        let token = Self::create_token(&secret);
        debug!("Issued new CSRF secret");
        (jar.add(self.secret_cookie(secret)), token)
    }
}

fn token_with_salt(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"-");
    hasher.update(secret.as_bytes());
    format!("{salt}-{}", hex::encode(hasher.finalize()))
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    TOKEN_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

fn token_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TOKEN_FIELD)
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

fn token_from_json(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body).ok()?.get(TOKEN_FIELD)? {
        Value::String(token) if !token.is_empty() => Some(token.clone()),
        _ => None,
    }
}

fn reject(reason: &'static str) -> AppError {
    metrics::record_csrf_rejection(reason);
    warn!(reason, "CSRF verification failed");
    AppError::CsrfRejected(reason.to_string())
}

/// Middleware enforcing CSRF tokens on unsafe methods.
///
/// # Errors
///
/// Returns `AppError::CsrfRejected` when the secret cookie or token is
/// missing or the token does not match, and `AppError::PayloadTooLarge`
/// when the body has to be read for a token and exceeds the limit.
pub async fn verify_csrf(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    if is_safe_method(req.method()) {
        return Ok(next.run(req).await);
    }

    let Some(secret) = state.csrf.secret_from(&jar) else {
        return Err(reject("missing_secret"));
    };

    let token = token_from_headers(req.headers()).or_else(|| token_from_query(req.uri().query()));

    let (token, req) = match token {
        Some(token) => (Some(token), req),
        None => {
            // Last resort: the body. Buffer it and hand it on unchanged.
            let limit = state.config.max_request_body_size;
            let (parts, body) = req.into_parts();
            let bytes = axum::body::to_bytes(body, limit)
                .await
                .map_err(|_| AppError::PayloadTooLarge(limit))?;
            let token = token_from_json(&bytes);
            (token, Request::from_parts(parts, Body::from(bytes)))
        }
    };

    let Some(token) = token else {
        return Err(reject("missing_token"));
    };

    if !CsrfProtection::verify(secret, &token) {
        return Err(reject("invalid_token"));
    }

    Ok(next.run(req).await)
}
