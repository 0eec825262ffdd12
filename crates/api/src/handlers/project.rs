//! Handlers for the `/projects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use labtrack_core::project::Project;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for creating a project.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub identity: String,
    pub project_id: String,
    pub project_name: String,
}

/// Request body for joining a project.
#[derive(Debug, Deserialize)]
pub struct JoinProjectRequest {
    pub identity: String,
    pub project_id: String,
}

/// Query parameters for the project listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ProjectsQuery {
    /// When present, restrict the listing to this member's projects.
    pub member: Option<String>,
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let project = state
        .service
        .create_project(&input.identity, &input.project_id, &input.project_name)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
///
/// Without `member`, the global listing for the discovery/join UI; with
/// `member=<identity>`, only that identity's projects.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProjectsQuery>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = match query.member.as_deref() {
        Some(member) => state.service.projects_for(member).await?,
        None => state.service.all_projects().await,
    };
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state.service.project(&id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/join
pub async fn join(
    State(state): State<AppState>,
    Json(input): Json<JoinProjectRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = state
        .service
        .join_project(&input.identity, &input.project_id)
        .await?;
    Ok(Json(DataResponse { data: project }))
}
