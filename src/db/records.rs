use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, DateTime, Document};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::models::{NewContact, NewProject};

/// Collection holding contact form submissions.
pub const CONTACTS_COLLECTION: &str = "contacts";

/// Collection holding portfolio projects.
pub const PROJECTS_COLLECTION: &str = "projects";

/// Stored contact form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime,
}

impl ContactRecord {
    /// Stamp a validated submission with a fresh id and the current time.
    pub fn new(contact: NewContact) -> Self {
        Self {
            id: ObjectId::new(),
            name: contact.name,
            email: contact.email,
            subject: contact.subject,
            message: contact.message,
            created_at: DateTime::now(),
        }
    }
}

/// Stored portfolio project.
///
/// Reads are lenient: documents written by earlier versions of the site may
/// lack any field or hold `null` in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime,
}

impl ProjectRecord {
    /// Stamp a validated project with a fresh id and the current time.
    pub fn new(project: NewProject) -> Self {
        Self {
            id: ObjectId::new(),
            title: project.title,
            description: project.description,
            technologies: project.technologies,
            image_url: project.image_url,
            project_url: project.project_url,
            created_at: DateTime::now(),
        }
    }

    /// Decode a stored document, logging and skipping it if unreadable.
    pub fn from_stored(document: Document) -> Option<Self> {
        let id = document.get_object_id("_id").ok();

        bson::from_document(document)
            .inspect_err(|e| {
                warn!(
                    project_id = ?id,
                    error = %e,
                    "Skipping unreadable project document"
                );
            })
            .ok()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sorts documents without a timestamp after every dated one.
fn unix_epoch() -> DateTime {
    DateTime::from_millis(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_project_record_field_names() {
        let record = ProjectRecord::new(NewProject {
            title: "Site".to_string(),
            description: "Portfolio".to_string(),
            technologies: vec!["Rust".to_string()],
            image_url: Some("https://example.com/a.png".to_string()),
            project_url: None,
        });

        let doc = bson::to_document(&record).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("imageUrl"));
        assert!(!doc.contains_key("projectUrl"));
        assert!(doc.get_datetime("createdAt").is_ok());
    }

    #[test]
    fn test_project_record_tolerates_missing_optional_fields() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "title": "Legacy",
            "description": "Inserted before technologies existed",
            "createdAt": DateTime::now(),
        };

        let record: ProjectRecord = bson::from_document(doc).unwrap();
        assert!(record.technologies.is_empty());
        assert!(record.image_url.is_none());
    }

    #[test]
    fn test_project_record_tolerates_missing_and_null_fields() {
        let id = ObjectId::new();
        let doc = bson::doc! {
            "_id": id,
            "description": "x",
            "technologies": null,
            "imageUrl": null,
            "createdAt": DateTime::from_millis(1_000),
            "__v": 0,
        };

        let record = ProjectRecord::from_stored(doc).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.title, "");
        assert_eq!(record.description, "x");
        assert!(record.technologies.is_empty());
        assert!(record.image_url.is_none());
    }

    #[test]
    fn test_project_record_without_created_at_sorts_oldest() {
        let doc = bson::doc! { "_id": ObjectId::new(), "title": "Undated" };

        let record = ProjectRecord::from_stored(doc).unwrap();
        assert_eq!(record.created_at.timestamp_millis(), 0);
    }

    #[test]
    fn test_unreadable_project_document_is_skipped() {
        let doc = bson::doc! { "_id": ObjectId::new(), "title": 42 };
        assert!(ProjectRecord::from_stored(doc).is_none());

        let doc = bson::doc! { "title": "No id" };
        assert!(ProjectRecord::from_stored(doc).is_none());
    }
}
