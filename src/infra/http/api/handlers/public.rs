//! Anonymous read endpoints and view recording.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;
use tracing::warn;

use crate::application::repos::PostQueryFilter;
use crate::application::views::ViewError;

use super::{category_to_api, post_to_api, project_to_api, tag_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::middleware::ClientAddr;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

const VIEW_UNAVAILABLE: &str = "View tracking temporarily unavailable";

pub async fn list_public_posts(
    State(state): State<ApiState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = PostQueryFilter {
        category_id: query.category_id(),
        tag_id: query.tag_id(),
        search: None,
    };

    let page = state
        .posts
        .list_published(filter, query.request())
        .await
        .map_err(post_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn search_posts(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .request();

    let page = state
        .posts
        .search_published(query.q.as_deref().unwrap_or_default(), request)
        .await
        .map_err(post_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn get_public_post(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .published_by_slug(&slug)
        .await
        .map_err(post_to_api)?;

    Ok(Json(DataEnvelope::new(post)))
}

/// Store failures degrade to `recorded: false` instead of failing the request.
pub async fn record_post_view(
    State(state): State<ApiState>,
    Extension(ClientAddr(client)): Extension<ClientAddr>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = state
        .posts
        .published_id_by_slug(&slug)
        .await
        .map_err(post_to_api)?;

    let response = match state.views.record_view(post_id, &client).await {
        Ok(recorded) => ViewResponse {
            recorded,
            message: None,
        },
        Err(ViewError::Store(err)) => {
            warn!(
                target: "folio::http::views",
                post_id,
                error = %err,
                "view store unavailable"
            );
            ViewResponse {
                recorded: false,
                message: Some(VIEW_UNAVAILABLE),
            }
        }
    };

    Ok(Json(DataEnvelope::new(response)))
}

pub async fn list_public_categories(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.categories.list().await.map_err(category_to_api)?;
    Ok(Json(DataEnvelope::new(categories)))
}

pub async fn list_category_posts(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .categories
        .find_by_slug(&slug)
        .await
        .map_err(category_to_api)?;

    let filter = PostQueryFilter {
        category_id: Some(category.id),
        ..PostQueryFilter::default()
    };
    let page = state
        .posts
        .list_published(filter, query.request())
        .await
        .map_err(post_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn list_public_tags(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.tags.list().await.map_err(tag_to_api)?;
    Ok(Json(DataEnvelope::new(tags)))
}

pub async fn list_tag_posts(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tag = state.tags.find_by_slug(&slug).await.map_err(tag_to_api)?;

    let filter = PostQueryFilter {
        tag_id: Some(tag.id),
        ..PostQueryFilter::default()
    };
    let page = state
        .posts
        .list_published(filter, query.request())
        .await
        .map_err(post_to_api)?;

    Ok(Json(PageEnvelope::from(page)))
}

pub async fn list_public_projects(
    State(state): State<ApiState>,
    Query(query): Query<ProjectListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = state
        .projects
        .list(query.featured_only())
        .await
        .map_err(project_to_api)?;

    Ok(Json(DataEnvelope::new(projects)))
}

pub async fn get_public_project(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .projects
        .find_by_slug(&slug)
        .await
        .map_err(project_to_api)?;

    Ok(Json(DataEnvelope::new(project)))
}
