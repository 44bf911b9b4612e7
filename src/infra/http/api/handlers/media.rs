//! Media handlers

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::media::UploadMediaCommand;

use super::media_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

const UPLOAD_FIELD: &str = "file";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn list_media(
    State(state): State<ApiState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = query.request();
    let listing = state
        .media
        .list(request.limit(), request.offset())
        .await
        .map_err(media_to_api)?;

    Ok(Json(DataEnvelope::new(listing)))
}

pub async fn upload_media(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .filter(|value| !value.is_empty())
                .unwrap_or(FALLBACK_CONTENT_TYPE)
                .to_string();
            let body = field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?;

            upload = Some(UploadMediaCommand {
                original_name,
                content_type,
                declared_size: body.len() as u64,
                body,
            });
            break;
        }
    }

    let command = upload.ok_or_else(|| ApiError::bad_request("No file uploaded", None))?;
    let asset = state.media.upload(command).await.map_err(media_to_api)?;

    Ok((StatusCode::CREATED, Json(DataEnvelope::new(asset))))
}

pub async fn delete_media(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.media.delete(id).await.map_err(media_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
