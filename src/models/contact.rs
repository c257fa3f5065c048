use serde::{Deserialize, Serialize};

/// Body of `POST /api/contact`.
///
/// Fields default to empty so that a missing field is reported by
/// validation alongside the other field errors, instead of failing
/// deserialization on the first one.
#[derive(Debug, Default, Deserialize)]
pub struct CreateContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// A contact submission that passed validation, normalized for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    /// Lowercased
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
