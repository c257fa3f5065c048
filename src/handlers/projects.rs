//! Portfolio project endpoints.
//!
//! # Endpoints
//!
//! - `GET /api/projects` - All projects, newest first
//! - `POST /api/projects` - Create a project

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{debug, info, instrument};

use super::ApiJson;
use crate::error::AppResult;
use crate::metrics;
use crate::models::{CreateProjectRequest, Project};
use crate::state::AppState;
use crate::validation::validate_project;

/// List every project, sorted by `createdAt` descending.
#[instrument(skip_all)]
pub async fn list_projects(State(state): State<AppState>) -> AppResult<Json<Vec<Project>>> {
    let records = state.db.list_projects().await?;
    metrics::record_projects_listed();
    debug!(count = records.len(), "Listed projects");

    Ok(Json(records.into_iter().map(Project::from).collect()))
}

/// Create a project.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Portfolio API",
///   "description": "Backend for this site",
///   "technologies": ["Rust", "MongoDB"],
///   "imageUrl": "https://example.com/shot.png",
///   "projectUrl": "https://github.com/example/portfolio"
/// }
/// ```
///
/// Responds `201` with the stored project, including `_id` and `createdAt`.
#[instrument(skip_all)]
pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project =
        validate_project(request).inspect_err(|_| metrics::record_project_created("invalid"))?;

    let record = state
        .db
        .insert_project(project)
        .await
        .inspect_err(|_| metrics::record_project_created("error"))?;

    metrics::record_project_created("success");
    info!(project_id = %record.id, title = %record.title, "Project created");

    Ok((StatusCode::CREATED, Json(Project::from(record))))
}
