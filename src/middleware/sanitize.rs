//! Request body sanitization for JSON payloads.
//!
//! Two passes over the parsed body, at every depth:
//!
//! 1. Object keys that start with `$` or contain `.` are dropped, so a client
//!    cannot smuggle MongoDB operators (`{"email": {"$gt": ""}}`) or dotted
//!    paths into a document.
//! 2. String values are HTML-escaped (`&`, `<`, `>`).
//!
//! Bodies that are not `application/json`, or that fail to parse, are passed
//! through untouched; the JSON extractor reports them later.

use std::borrow::Cow;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Middleware rewriting JSON bodies through [`sanitize_value`].
///
/// # Errors
///
/// Returns `AppError::PayloadTooLarge` when a JSON body exceeds
/// `MAX_REQUEST_BODY_SIZE`.
pub async fn sanitize_json_body(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    if !is_json(req.headers()) {
        return Ok(next.run(req).await);
    }

    let limit = state.config.max_request_body_size;
    let (mut parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| AppError::PayloadTooLarge(limit))?;

    let bytes = sanitize_bytes(bytes);
    parts
        .headers
        .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Sanitize a raw JSON body; anything unparsable comes back as-is.
pub fn sanitize_bytes(bytes: Bytes) -> Bytes {
    let Ok(mut value) = serde_json::from_slice::<Value>(&bytes) else {
        return bytes;
    };

    let removed = sanitize_value(&mut value);
    if removed > 0 {
        debug!(removed, "Stripped operator keys from request body");
    }

    match serde_json::to_vec(&value) {
        Ok(rewritten) => Bytes::from(rewritten),
        Err(_) => bytes,
    }
}

/// Strip operator keys and escape strings in place. Returns the number of
/// keys removed.
pub fn sanitize_value(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !is_operator_key(key));
            let mut removed = before - map.len();
            for child in map.values_mut() {
                removed += sanitize_value(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(sanitize_value).sum(),
        Value::String(s) => {
            let escaped = match html_escape::encode_text(s.as_str()) {
                Cow::Borrowed(_) => None,
                Cow::Owned(escaped) => Some(escaped),
            };
            if let Some(escaped) = escaped {
                *s = escaped;
            }
            0
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// `application/json` and `+json` media types, parameters ignored.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_keys_removed_at_depth() {
        let mut value = json!({
            "email": {"$gt": ""},
            "$where": "sleep(1000)",
            "profile": {"a.b": 1, "ok": [{"$ne": null, "keep": true}]},
        });

        let removed = sanitize_value(&mut value);

        assert_eq!(removed, 4);
        assert_eq!(
            value,
            json!({"email": {}, "profile": {"ok": [{"keep": true}]}})
        );
    }

    #[test]
    fn test_strings_escaped() {
        let mut value = json!({
            "message": "<script>alert('x')</script> & more",
            "tags": ["<b>", "plain"],
            "count": 3,
        });

        sanitize_value(&mut value);

        assert_eq!(
            value["message"],
            "&lt;script&gt;alert('x')&lt;/script&gt; &amp; more"
        );
        assert_eq!(value["tags"], json!(["&lt;b&gt;", "plain"]));
        assert_eq!(value["count"], 3);
    }

    #[test]
    fn test_unparsable_body_passes_through() {
        let raw = Bytes::from_static(b"{not json");
        assert_eq!(sanitize_bytes(raw.clone()), raw);
    }

    #[test]
    fn test_is_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/merge-patch+json"));
        assert!(is_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
    }
}
