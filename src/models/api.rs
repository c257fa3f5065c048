use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/csrf-token`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// Whether the last store operation or ping succeeded
    pub database_connected: bool,
    /// Service version
    pub version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_token_response_is_camel_case() {
        let response = CsrfTokenResponse {
            csrf_token: "abc-123".to_string(),
        };

        let json = serde_json::to_string(&response).expect("Serialization should succeed");
        assert_eq!(json, r#"{"csrfToken":"abc-123"}"#);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            database_connected: true,
            version: "0.2.0".to_string(),
            uptime_seconds: 12,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&response).expect("Serialization should succeed");
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"database_connected\":true"));
    }
}
