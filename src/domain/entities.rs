//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::types::PostStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub category_id: Option<i64>,
    pub status: PostStatus,
    pub view_count: i32,
    pub reading_time: i32,
    pub thumbnail: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

impl PostRecord {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Minimal tag reference embedded in post responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagBrief {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A post joined with its category and tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetails {
    #[serde(flatten)]
    pub post: PostRecord,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub tags: Vec<TagBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub sort_order: i32,
    pub post_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    pub id: i64,
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
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// One uploaded file and its derived artifacts.
///
/// Processed images carry non-zero dimensions and both thumbnail URLs;
/// passthrough uploads (GIF, SVG) carry zero dimensions and no thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaAsset {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_sm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_md: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MediaAsset {
    pub fn has_thumbnails(&self) -> bool {
        self.thumbnail_sm.is_some() || self.thumbnail_md.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub total: u64,
    pub published: u64,
    pub draft: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStat {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub post_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    pub view_count: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}
