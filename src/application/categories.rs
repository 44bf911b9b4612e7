use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{CategoriesRepo, CategoryParams, RepoError};
use crate::domain::entities::CategoryRecord;
use crate::domain::slug::{SlugError, resolve_slug};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("category not found")]
    NotFound,
    #[error("category slug `{0}` already exists")]
    SlugExists(String),
    #[error("category still has {count} posts")]
    HasPosts { count: u64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct CategoryCommand {
    pub name: String,
    pub slug: Option<String>,
    pub description: String,
    pub sort_order: i32,
}

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoriesRepo>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoriesRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<CategoryRecord>, CategoryError> {
        self.repo
            .list_categories()
            .await
            .map_err(CategoryError::from)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<CategoryRecord, CategoryError> {
        self.repo
            .find_category_by_slug(slug)
            .await?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn create(&self, command: CategoryCommand) -> Result<CategoryRecord, CategoryError> {
        let params = self.prepare(command)?;

        if self.repo.category_slug_exists(&params.slug, None).await? {
            return Err(CategoryError::SlugExists(params.slug));
        }

        self.repo
            .create_category(params)
            .await
            .map_err(CategoryError::from)
    }

    pub async fn update(
        &self,
        id: i64,
        command: CategoryCommand,
    ) -> Result<CategoryRecord, CategoryError> {
        let existing = self
            .repo
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let params = self.prepare(command)?;
        if params.slug != existing.slug
            && self.repo.category_slug_exists(&params.slug, Some(id)).await?
        {
            return Err(CategoryError::SlugExists(params.slug));
        }

        self.repo
            .update_category(id, params)
            .await
            .map_err(CategoryError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CategoryError> {
        self.repo
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let count = self.repo.count_category_posts(id).await?;
        if count > 0 {
            return Err(CategoryError::HasPosts { count });
        }

        self.repo
            .delete_category(id)
            .await
            .map_err(CategoryError::from)
    }

    fn prepare(&self, command: CategoryCommand) -> Result<CategoryParams, CategoryError> {
        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryError::ConstraintViolation("name"));
        }

        let slug = resolve_slug(command.slug.as_deref(), &name).map_err(|err| match err {
            SlugError::EmptyInput | SlugError::Unrepresentable { .. } => {
                CategoryError::ConstraintViolation("slug")
            }
        })?;

        Ok(CategoryParams {
            name,
            slug,
            description: command.description.trim().to_string(),
            sort_order: command.sort_order,
        })
    }
}
