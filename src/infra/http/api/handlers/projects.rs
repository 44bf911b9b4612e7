//! Admin project handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::project_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_projects(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let projects = state.projects.list(false).await.map_err(project_to_api)?;
    Ok(Json(DataEnvelope::new(projects)))
}

pub async fn get_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state.projects.get(id).await.map_err(project_to_api)?;
    Ok(Json(DataEnvelope::new(project)))
}

pub async fn create_project(
    State(state): State<ApiState>,
    Json(payload): Json<ProjectCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .create(payload.into())
        .await
        .map_err(project_to_api)?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(project))))
}

pub async fn update_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .update(id, payload.into())
        .await
        .map_err(project_to_api)?;

    Ok(Json(DataEnvelope::new(project)))
}

pub async fn delete_project(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.projects.delete(id).await.map_err(project_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_projects(
    State(state): State<ApiState>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .projects
        .reorder(&payload.orders)
        .await
        .map_err(project_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
