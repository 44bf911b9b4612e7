use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{Page, PageRequest};
use crate::application::repos::{
    CreatePostParams, PostContentParams, PostListScope, PostQueryFilter, PostsRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::PostDetails;
use crate::domain::reading_time::estimate_minutes;
use crate::domain::slug::resolve_slug;
use crate::domain::types::PostStatus;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error("post slug `{0}` already exists")]
    SlugExists(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Editable post fields. `status` only applies on creation; updates keep the
/// current status.
#[derive(Debug, Clone, Default)]
pub struct PostCommand {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub category_id: Option<i64>,
    pub thumbnail: String,
    pub status: Option<PostStatus>,
    pub tag_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostsRepo>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_published(
        &self,
        filter: PostQueryFilter,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, PostError> {
        self.list(PostListScope::Public, filter, page).await
    }

    pub async fn search_published(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, PostError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PostError::ConstraintViolation("q"));
        }
        let filter = PostQueryFilter {
            search: Some(query.to_string()),
            ..PostQueryFilter::default()
        };
        self.list(PostListScope::Public, filter, page).await
    }

    pub async fn list_admin(
        &self,
        status: Option<PostStatus>,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, PostError> {
        self.list(
            PostListScope::Admin { status },
            PostQueryFilter::default(),
            page,
        )
        .await
    }

    async fn list(
        &self,
        scope: PostListScope,
        filter: PostQueryFilter,
        page: PageRequest,
    ) -> Result<Page<PostDetails>, PostError> {
        let items = self
            .repo
            .list_posts(scope, &filter, page.limit(), page.offset())
            .await?;
        let total = self.repo.count_posts(scope, &filter).await?;
        Ok(Page::new(items, page, total))
    }

    /// Drafts are invisible to public lookups.
    pub async fn published_by_slug(&self, slug: &str) -> Result<PostDetails, PostError> {
        self.repo
            .find_post_by_slug(slug)
            .await?
            .filter(|details| details.post.is_published())
            .ok_or(PostError::NotFound)
    }

    pub async fn published_id_by_slug(&self, slug: &str) -> Result<i64, PostError> {
        self.published_by_slug(slug)
            .await
            .map(|details| details.post.id)
    }

    pub async fn get(&self, id: i64) -> Result<PostDetails, PostError> {
        self.repo.find_post(id).await?.ok_or(PostError::NotFound)
    }

    pub async fn create(&self, command: PostCommand) -> Result<PostDetails, PostError> {
        let status = command.status.unwrap_or(PostStatus::Draft);
        let tag_ids = dedup_tags(&command.tag_ids);
        let content = prepare_content(command)?;

        if self.repo.post_slug_exists(&content.slug, None).await? {
            return Err(PostError::SlugExists(content.slug));
        }

        let created = self
            .repo
            .create_post(CreatePostParams { content, status })
            .await?;
        self.repo.replace_post_tags(created.id, &tag_ids).await?;

        self.get(created.id).await
    }

    pub async fn update(&self, id: i64, command: PostCommand) -> Result<PostDetails, PostError> {
        self.get(id).await?;

        let tag_ids = dedup_tags(&command.tag_ids);
        let content = prepare_content(command)?;
        if self.repo.post_slug_exists(&content.slug, Some(id)).await? {
            return Err(PostError::SlugExists(content.slug));
        }

        self.repo
            .update_post(UpdatePostParams { id, content })
            .await?;
        self.repo.replace_post_tags(id, &tag_ids).await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostError> {
        self.get(id).await?;
        self.repo.delete_post(id).await.map_err(PostError::from)
    }

    pub async fn set_published(&self, id: i64, publish: bool) -> Result<PostDetails, PostError> {
        self.get(id).await?;
        self.repo.set_post_published(id, publish).await?;
        self.get(id).await
    }
}

fn prepare_content(command: PostCommand) -> Result<PostContentParams, PostError> {
    let title = command.title.trim().to_string();
    if title.is_empty() {
        return Err(PostError::ConstraintViolation("title"));
    }

    let slug = resolve_slug(command.slug.as_deref(), &title)
        .map_err(|_| PostError::ConstraintViolation("slug"))?;
    let reading_time = estimate_minutes(&command.content);

    Ok(PostContentParams {
        title,
        slug,
        reading_time,
        content: command.content,
        excerpt: command.excerpt.trim().to_string(),
        category_id: command.category_id,
        thumbnail: command.thumbnail.trim().to_string(),
    })
}

fn dedup_tags(tag_ids: &[i64]) -> Vec<i64> {
    let mut ids = tag_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
