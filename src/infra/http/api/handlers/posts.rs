//! Admin post handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::domain::types::PostStatus;

use super::post_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_posts(
    State(state): State<ApiState>,
    Query(query): Query<AdminPostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(str::parse::<PostStatus>)
        .transpose()
        .map_err(|err| ApiError::bad_request("invalid status", Some(err.to_string())))?;

    let request = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .request();

    let page = state
        .posts
        .list_admin(status, request)
        .await
        .map_err(post_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get(id).await.map_err(post_to_api)?;
    Ok(Json(DataEnvelope::new(post)))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Json(payload): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .create(payload.into())
        .await
        .map_err(post_to_api)?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(post))))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .update(id, payload.into())
        .await
        .map_err(post_to_api)?;

    Ok(Json(DataEnvelope::new(post)))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete(id).await.map_err(post_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_post(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .set_published(id, payload.publish)
        .await
        .map_err(post_to_api)?;

    Ok(Json(DataEnvelope::new(post)))
}
