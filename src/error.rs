use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as it appears in the request body
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-wide error types with appropriate HTTP status codes.
///
/// Server-side faults (`ConnectionFailed`, `Database`, `Internal`, ...) are
/// logged with full detail but rendered to clients with a generic message.
/// Client faults carry a message that is safe to echo back.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to connect to the document store: {0}")]
    ConnectionFailed(String),

    #[error("Document store operation failed: {0}")]
    Database(String),

    #[error("Validation failed: {}", summarize_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("CSRF validation failed: {0}")]
    CsrfRejected(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Operation timed out: {0}")]
    OperationTimeout(String),
}

fn summarize_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl AppError {
    /// Whether this error is the server's fault (as opposed to the client's).
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AppError::ConnectionFailed(_)
                | AppError::Database(_)
                | AppError::Internal(_)
                | AppError::ConfigError(_)
                | AppError::OperationTimeout(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        let (status, error_type, message, details) = match self {
            AppError::ConnectionFailed(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "connection_failed",
                "The database is temporarily unavailable. Please try again later.".to_string(),
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Unable to complete the request. Please try again later.".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Something went wrong!".to_string(),
                None,
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                "Service configuration error.".to_string(),
                None,
            ),
            AppError::OperationTimeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "Operation timed out. Please try again.".to_string(),
                None,
            ),
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Validation failed".to_string(),
                Some(fields),
            ),
            AppError::InvalidJson(rejection) => (
                rejection.status(),
                "invalid_json",
                sanitize_rejection_message(&rejection),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::CsrfRejected(_) => (
                StatusCode::FORBIDDEN,
                "invalid_csrf_token",
                "Invalid or missing CSRF token".to_string(),
                None,
            ),
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                format!("Request body must not exceed {limit} bytes"),
                None,
            ),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Turn a JSON extractor rejection into a client-safe message.
///
/// Serde errors name internal struct fields and types; only the parts useful
/// to a client debugging their payload are kept.
fn sanitize_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            return "Expected request with `Content-Type: application/json`".to_string();
        }
        JsonRejection::BytesRejection(_) => {
            return "Request body could not be read or is too large".to_string();
        }
        _ => {}
    }

    let msg = rejection.body_text();

    if msg.contains("missing field")
        && let Some(field) = backticked(&msg)
    {
        return format!("Missing required field: {field}");
    }

    if msg.contains("invalid type") {
        return "Invalid data type in request body".to_string();
    }

    if msg.contains("EOF while parsing") || msg.contains("expected") {
        return "Malformed JSON in request body".to_string();
    }

    "Invalid request format".to_string()
}

/// First identifier between backticks in a serde message.
fn backticked(msg: &str) -> Option<&str> {
    let start = msg.find('`')?;
    let rest = msg.get(start + 1..)?;
    let end = rest.find('`')?;
    rest.get(..end)
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let (status, body) =
            body_json(AppError::Database("connection refused at 10.0.0.3".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database_error");
        assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let (status, body) = body_json(AppError::Validation(vec![
            FieldError::new("email", "Email is required"),
            FieldError::new("name", "Name is required"),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "email");
        assert_eq!(body["details"][1]["message"], "Name is required");
    }

    #[tokio::test]
    async fn test_csrf_rejection_is_forbidden() {
        let (status, body) = body_json(AppError::CsrfRejected("token mismatch".into())).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "invalid_csrf_token");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_payload_too_large() {
        let (status, body) = body_json(AppError::PayloadTooLarge(10240)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["message"].as_str().unwrap().contains("10240"));
    }

    #[test]
    fn test_validation_display_joins_fields() {
        let err = AppError::Validation(vec![
            FieldError::new("title", "Title is required"),
            FieldError::new("description", "Description is required"),
        ]);

        assert_eq!(
            err.to_string(),
            "Validation failed: title: Title is required; description: Description is required"
        );
    }

    #[test]
    fn test_backticked() {
        assert_eq!(backticked("missing field `email` at line 1"), Some("email"));
        assert_eq!(backticked("no ticks here"), None);
        assert_eq!(backticked("dangling `tick"), None);
    }

    #[test]
    fn test_server_error_classification() {
        assert!(AppError::Database(String::new()).is_server_error());
        assert!(AppError::OperationTimeout(String::new()).is_server_error());
        assert!(!AppError::CsrfRejected(String::new()).is_server_error());
        assert!(!AppError::NotFound(String::new()).is_server_error());
    }
}
