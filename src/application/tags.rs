use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{RepoError, TagParams, TagsRepo};
use crate::domain::entities::TagRecord;
use crate::domain::slug::resolve_slug;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("tag not found")]
    NotFound,
    #[error("tag slug `{0}` already exists")]
    SlugExists(String),
    #[error("tag is referenced by {count} posts")]
    InUse { count: u64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct TagCommand {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Clone)]
pub struct TagService {
    repo: Arc<dyn TagsRepo>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<TagRecord>, TagError> {
        self.repo.list_tags().await.map_err(TagError::from)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<TagRecord, TagError> {
        self.repo
            .find_tag_by_slug(slug)
            .await?
            .ok_or(TagError::NotFound)
    }

    pub async fn create(&self, command: TagCommand) -> Result<TagRecord, TagError> {
        let params = prepare(command)?;
        if self.repo.tag_slug_exists(&params.slug, None).await? {
            return Err(TagError::SlugExists(params.slug));
        }
        self.repo.create_tag(params).await.map_err(TagError::from)
    }

    pub async fn update(&self, id: i64, command: TagCommand) -> Result<TagRecord, TagError> {
        let existing = self.repo.find_tag(id).await?.ok_or(TagError::NotFound)?;

        let params = prepare(command)?;
        if params.slug != existing.slug && self.repo.tag_slug_exists(&params.slug, Some(id)).await?
        {
            return Err(TagError::SlugExists(params.slug));
        }

        self.repo.update_tag(id, params).await.map_err(TagError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TagError> {
        self.repo.find_tag(id).await?.ok_or(TagError::NotFound)?;

        let usage = self.repo.count_tag_usage(id).await?;
        if usage > 0 {
            return Err(TagError::InUse { count: usage });
        }

        self.repo.delete_tag(id).await.map_err(TagError::from)
    }
}

fn prepare(command: TagCommand) -> Result<TagParams, TagError> {
    let name = command.name.trim().to_string();
    if name.is_empty() {
        return Err(TagError::ConstraintViolation("name"));
    }
    let slug = resolve_slug(command.slug.as_deref(), &name)
        .map_err(|_| TagError::ConstraintViolation("slug"))?;
    Ok(TagParams { name, slug })
}
