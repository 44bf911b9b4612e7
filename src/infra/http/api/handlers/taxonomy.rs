//! Admin category and tag handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::{category_to_api, tag_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_categories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.categories.list().await.map_err(category_to_api)?;
    Ok(Json(DataEnvelope::new(categories)))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .create(payload.into())
        .await
        .map_err(category_to_api)?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(category))))
}

pub async fn update_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .update(id, payload.into())
        .await
        .map_err(category_to_api)?;

    Ok(Json(DataEnvelope::new(category)))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .categories
        .delete(id)
        .await
        .map_err(category_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tags.list().await.map_err(tag_to_api)?;
    Ok(Json(DataEnvelope::new(tags)))
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Json(payload): Json<TagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .create(payload.into())
        .await
        .map_err(tag_to_api)?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(tag))))
}

pub async fn update_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<TagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state
        .tags
        .update(id, payload.into())
        .await
        .map_err(tag_to_api)?;

    Ok(Json(DataEnvelope::new(tag)))
}

pub async fn delete_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.tags.delete(id).await.map_err(tag_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
