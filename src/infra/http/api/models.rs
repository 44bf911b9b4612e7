use serde::{Deserialize, Serialize};

use crate::application::categories::CategoryCommand;
use crate::application::pagination::{Page, PageMeta, PageRequest};
use crate::application::posts::PostCommand;
use crate::application::projects::{CreateProjectCommand, UpdateProjectCommand};
use crate::application::repos::ProjectOrder;
use crate::application::tags::TagCommand;
use crate::domain::types::PostStatus;

/// `{"data": ...}`
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// `{"data": [...], "meta": {...}}`
#[derive(Debug, Serialize)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> From<Page<T>> for PageEnvelope<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            meta: page.meta,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.per_page.as_deref())
    }
}

/// Public post listing. Unparsable ids are ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl PostListQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.per_page.as_deref())
    }

    pub fn category_id(&self) -> Option<i64> {
        parse_id(self.category.as_deref())
    }

    pub fn tag_id(&self) -> Option<i64> {
        parse_id(self.tag.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminPostListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub featured: Option<String>,
}

impl ProjectListQuery {
    pub fn featured_only(&self) -> bool {
        self.featured
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl From<PostRequest> for PostCommand {
    fn from(request: PostRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            content: request.content,
            excerpt: request.excerpt,
            category_id: request.category_id,
            thumbnail: request.thumbnail,
            status: request.status,
            tag_ids: request.tag_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub publish: bool,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<CategoryRequest> for CategoryCommand {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
            description: request.description,
            sort_order: request.sort_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

impl From<TagRequest> for TagCommand {
    fn from(request: TagRequest) -> Self {
        Self {
            name: request.name,
            slug: request.slug,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectCreateRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl From<ProjectCreateRequest> for CreateProjectCommand {
    fn from(request: ProjectCreateRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            description: request.description.unwrap_or_default(),
            content: request.content.unwrap_or_default(),
            tech_stack: request.tech_stack,
            demo_url: request.demo_url.unwrap_or_default(),
            github_url: request.github_url.unwrap_or_default(),
            thumbnail: request.thumbnail.unwrap_or_default(),
            images: request.images,
            is_featured: request.is_featured.unwrap_or(false),
            sort_order: request.sort_order.unwrap_or(0),
        }
    }
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectUpdateRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub thumbnail: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub sort_order: Option<i32>,
}

impl From<ProjectUpdateRequest> for UpdateProjectCommand {
    fn from(request: ProjectUpdateRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            description: request.description,
            content: request.content,
            tech_stack: request.tech_stack,
            demo_url: request.demo_url,
            github_url: request.github_url,
            thumbnail: request.thumbnail,
            images: request.images,
            is_featured: request.is_featured,
            sort_order: request.sort_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub orders: Vec<ProjectOrder>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub postgres: &'static str,
    pub redis: &'static str,
    pub storage: &'static str,
}
