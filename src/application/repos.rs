//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::entities::{
    AdminRecord, CategoryRecord, CategoryStat, MediaAsset, PostDetails, PostRecord, PostStats,
    ProjectRecord, RecentPost, TagRecord,
};
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    /// Published posts only, newest publication first.
    Public,
    /// Every post, optionally narrowed to one status, newest creation first.
    Admin { status: Option<PostStatus> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQueryFilter {
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub search: Option<String>,
}

/// Columns shared by post inserts and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContentParams {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub category_id: Option<i64>,
    pub reading_time: i32,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub content: PostContentParams,
    pub status: PostStatus,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub content: PostContentParams,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostDetails>, RepoError>;

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostDetails>, RepoError>;

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostDetails>, RepoError>;

    async fn post_slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Rewrites content columns; status and publication time are untouched.
    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Publishing stamps `published_at` only the first time; unpublishing
    /// keeps it.
    async fn set_post_published(&self, id: i64, published: bool)
    -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;

    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError>;
}

/// Durable per-post view counter.
#[async_trait]
pub trait ViewCounter: Send + Sync {
    async fn increment_view_count(&self, post_id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryParams {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: i32,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;
    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError>;
    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;
    async fn category_slug_exists(
        &self,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError>;
    async fn create_category(&self, params: CategoryParams) -> Result<CategoryRecord, RepoError>;
    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<CategoryRecord, RepoError>;
    async fn delete_category(&self, id: i64) -> Result<(), RepoError>;
    async fn count_category_posts(&self, id: i64) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagParams {
    pub name: String,
    pub slug: String,
}

#[async_trait]
pub trait TagsRepo: Send + Sync {
    async fn list_tags(&self) -> Result<Vec<TagRecord>, RepoError>;
    async fn find_tag(&self, id: i64) -> Result<Option<TagRecord>, RepoError>;
    async fn find_tag_by_slug(&self, slug: &str) -> Result<Option<TagRecord>, RepoError>;
    async fn tag_slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError>;
    async fn create_tag(&self, params: TagParams) -> Result<TagRecord, RepoError>;
    async fn update_tag(&self, id: i64, params: TagParams) -> Result<TagRecord, RepoError>;
    async fn delete_tag(&self, id: i64) -> Result<(), RepoError>;
    async fn count_tag_usage(&self, id: i64) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectParams {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub tech_stack: Vec<String>,
    pub demo_url: String,
    pub github_url: String,
    pub thumbnail: String,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProjectOrder {
    pub id: i64,
    pub sort_order: i32,
}

#[async_trait]
pub trait ProjectsRepo: Send + Sync {
    async fn list_projects(&self, featured_only: bool) -> Result<Vec<ProjectRecord>, RepoError>;
    async fn find_project(&self, id: i64) -> Result<Option<ProjectRecord>, RepoError>;
    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<ProjectRecord>, RepoError>;
    async fn project_slug_exists(
        &self,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError>;
    async fn create_project(&self, params: ProjectParams) -> Result<ProjectRecord, RepoError>;
    async fn update_project(
        &self,
        id: i64,
        params: ProjectParams,
    ) -> Result<ProjectRecord, RepoError>;
    async fn delete_project(&self, id: i64) -> Result<(), RepoError>;
    /// Applies every entry or none. Unknown ids yield `NotFound`.
    async fn reorder_projects(&self, orders: &[ProjectOrder]) -> Result<(), RepoError>;
}

/// Metadata row for an asset whose artifacts are already in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaAsset {
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    pub thumbnail_sm: Option<String>,
    pub thumbnail_md: Option<String>,
}

#[async_trait]
pub trait MediaRepo: Send + Sync {
    async fn create_media(&self, asset: NewMediaAsset) -> Result<MediaAsset, RepoError>;
    async fn find_media(&self, id: i64) -> Result<Option<MediaAsset>, RepoError>;
    async fn delete_media(&self, id: i64) -> Result<(), RepoError>;
    /// Newest first.
    async fn list_media(&self, limit: u32, offset: u64) -> Result<Vec<MediaAsset>, RepoError>;
    async fn count_media(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait AdminsRepo: Send + Sync {
    async fn find_admin(&self, id: i64) -> Result<Option<AdminRecord>, RepoError>;
    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminRecord>, RepoError>;
    async fn create_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminRecord, RepoError>;
}

#[async_trait]
pub trait DashboardRepo: Send + Sync {
    async fn post_stats(&self) -> Result<PostStats, RepoError>;
    async fn category_stats(&self) -> Result<Vec<CategoryStat>, RepoError>;
    async fn recent_posts(&self, limit: u32) -> Result<Vec<RecentPost>, RepoError>;
}

/// Liveness probe for the metadata store.
#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
