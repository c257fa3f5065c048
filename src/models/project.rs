use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::ProjectRecord;

/// Body of `POST /api/projects`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
}

/// A project that passed validation, normalized for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
}

/// Project as returned by the API.
///
/// Field names follow the stored document (`_id`, camelCase) so existing
/// front-end code keeps working.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        let id = record.id.to_hex();
        let created_at = super::timestamp_from_millis(
            record.created_at.timestamp_millis(),
            "project",
            &id,
        );

        Self {
            id,
            title: record.title,
            description: record.description,
            technologies: record.technologies,
            image_url: record.image_url,
            project_url: record.project_url,
            created_at,
        }
    }
}
