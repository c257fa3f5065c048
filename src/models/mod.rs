mod api;
mod contact;
mod project;

use chrono::{DateTime, Utc};
use tracing::warn;

pub use api::{CsrfTokenResponse, HealthResponse};
pub use contact::{CreateContactRequest, MessageResponse, NewContact};
pub use project::{CreateProjectRequest, NewProject, Project};

/// Convert a stored millisecond timestamp, logging and falling back to the
/// current time if it is out of range.
pub(crate) fn timestamp_from_millis(
    timestamp_millis: i64,
    entity_type: &str,
    entity_id: &str,
) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_millis).unwrap_or_else(|| {
        warn!(
            entity_type,
            entity_id, timestamp_millis, "Invalid timestamp, using current time as fallback"
        );
        Utc::now()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_timestamp() {
        // 2024-01-15T10:30:00Z
        let millis = 1_705_314_600_000_i64;
        let result = timestamp_from_millis(millis, "project", "abc");

        assert_eq!(result.timestamp_millis(), millis);
    }

    #[test]
    fn test_parse_invalid_timestamp_uses_fallback() {
        let result = timestamp_from_millis(i64::MAX, "project", "abc");

        let diff = (Utc::now() - result).num_seconds().abs();
        assert!(diff < 60, "Fallback should be close to current time");
    }
}
