//! API handlers organized by resource type.
//!
//! Error conversions shared across the resource modules live here.

mod auth;
mod dashboard;
mod health;
mod media;
mod posts;
mod projects;
mod public;
mod taxonomy;

pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use media::*;
pub use posts::*;
pub use projects::*;
pub use public::*;
pub use taxonomy::*;

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::auth::AuthError;
use crate::application::categories::CategoryError;
use crate::application::media::MediaError;
use crate::application::posts::PostError;
use crate::application::projects::ProjectError;
use crate::application::repos::RepoError;
use crate::application::tags::TagError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        err @ RepoError::Persistence(_) => ApiError::internal(codes::REPO, "Persistence error")
            .with_source("infra::http::api::repo", &err),
    }
}

fn slug_conflict(slug: String) -> ApiError {
    ApiError::new(
        StatusCode::CONFLICT,
        codes::SLUG_EXISTS,
        "Slug already exists",
        Some(slug),
    )
}

fn invalid_field(message: &'static str, field: &'static str) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        codes::INVALID_INPUT,
        message,
        Some(field.to_string()),
    )
}

pub(crate) fn post_to_api(err: PostError) -> ApiError {
    match err {
        PostError::ConstraintViolation(field) => invalid_field("Invalid post", field),
        PostError::NotFound => ApiError::not_found("Post not found"),
        PostError::SlugExists(slug) => slug_conflict(slug),
        PostError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn category_to_api(err: CategoryError) -> ApiError {
    match err {
        CategoryError::ConstraintViolation(field) => invalid_field("Invalid category", field),
        CategoryError::NotFound => ApiError::not_found("Category not found"),
        CategoryError::SlugExists(slug) => slug_conflict(slug),
        CategoryError::HasPosts { count } => ApiError::new(
            StatusCode::CONFLICT,
            codes::IN_USE,
            "Category has posts",
            Some(format!("{count} posts reference this category")),
        ),
        CategoryError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn tag_to_api(err: TagError) -> ApiError {
    match err {
        TagError::ConstraintViolation(field) => invalid_field("Invalid tag", field),
        TagError::NotFound => ApiError::not_found("Tag not found"),
        TagError::SlugExists(slug) => slug_conflict(slug),
        TagError::InUse { count } => ApiError::new(
            StatusCode::CONFLICT,
            codes::IN_USE,
            "Tag is in use",
            Some(format!("{count} posts reference this tag")),
        ),
        TagError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn project_to_api(err: ProjectError) -> ApiError {
    match err {
        ProjectError::ConstraintViolation(field) => invalid_field("Invalid project", field),
        ProjectError::NotFound => ApiError::not_found("Project not found"),
        ProjectError::SlugExists(slug) => slug_conflict(slug),
        ProjectError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn media_to_api(err: MediaError) -> ApiError {
    match err {
        MediaError::Rejected(DomainError::InvalidFileType { mime }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_FILE_TYPE,
            "Invalid file type. Only JPEG, PNG, GIF, WebP and SVG images are allowed",
            Some(mime),
        ),
        MediaError::Rejected(DomainError::FileTooLarge { size, limit }) => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::FILE_TOO_LARGE,
            "File too large",
            Some(format!("{size} bytes exceeds the {limit} byte limit")),
        ),
        MediaError::Rejected(DomainError::Validation { message }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid upload",
            Some(message),
        ),
        MediaError::NotFound => ApiError::not_found("Media not found"),
        err @ MediaError::Processing(_) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::MEDIA,
            "Image could not be processed",
            None,
        )
        .with_source("infra::http::api::media", &err),
        err @ (MediaError::Upload { .. } | MediaError::Storage(_)) => {
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                codes::STORAGE,
                "Object storage request failed",
                None,
            )
            .with_source("infra::http::api::media", &err)
        }
        err @ MediaError::Task(_) => ApiError::internal(codes::MEDIA, "Media processing failed")
            .with_source("infra::http::api::media", &err),
        MediaError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::INVALID_CREDENTIALS,
            "Invalid username or password",
            None,
        ),
        AuthError::InvalidToken(_) => ApiError::unauthorized(None),
        AuthError::AdminNotFound => ApiError::not_found("Admin not found"),
        AuthError::Repo(repo) => repo_to_api(repo),
        err @ (AuthError::Hashing(_) | AuthError::Signing(_)) => {
            ApiError::internal(codes::AUTH, "Authentication failed")
                .with_source("infra::http::api::auth", &err)
        }
    }
}
