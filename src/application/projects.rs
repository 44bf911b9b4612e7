use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{ProjectOrder, ProjectParams, ProjectsRepo, RepoError};
use crate::domain::entities::ProjectRecord;
use crate::domain::slug::{derive_slug, resolve_slug};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("{0} must not be empty")]
    ConstraintViolation(&'static str),
    #[error("project not found")]
    NotFound,
    #[error("project slug `{0}` already exists")]
    SlugExists(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct CreateProjectCommand {
    pub title: String,
    pub slug: Option<String>,
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

/// Partial update: `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateProjectCommand {
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

#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<dyn ProjectsRepo>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, featured_only: bool) -> Result<Vec<ProjectRecord>, ProjectError> {
        self.repo
            .list_projects(featured_only)
            .await
            .map_err(ProjectError::from)
    }

    pub async fn get(&self, id: i64) -> Result<ProjectRecord, ProjectError> {
        self.repo
            .find_project(id)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<ProjectRecord, ProjectError> {
        self.repo
            .find_project_by_slug(slug)
            .await?
            .ok_or(ProjectError::NotFound)
    }

    pub async fn create(&self, command: CreateProjectCommand) -> Result<ProjectRecord, ProjectError> {
        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(ProjectError::ConstraintViolation("title"));
        }
        let slug = resolve_slug(command.slug.as_deref(), &title)
            .map_err(|_| ProjectError::ConstraintViolation("slug"))?;

        if self.repo.project_slug_exists(&slug, None).await? {
            return Err(ProjectError::SlugExists(slug));
        }

        let params = ProjectParams {
            title,
            slug,
            description: command.description,
            content: command.content,
            tech_stack: clean_list(command.tech_stack),
            demo_url: command.demo_url.trim().to_string(),
            github_url: command.github_url.trim().to_string(),
            thumbnail: command.thumbnail.trim().to_string(),
            images: clean_list(command.images),
            is_featured: command.is_featured,
            sort_order: command.sort_order,
        };

        self.repo
            .create_project(params)
            .await
            .map_err(ProjectError::from)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateProjectCommand,
    ) -> Result<ProjectRecord, ProjectError> {
        let existing = self.get(id).await?;
        let mut params = ProjectParams::from(existing);

        if let Some(title) = command.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ProjectError::ConstraintViolation("title"));
            }
            params.title = title;
        }

        if let Some(raw) = command.slug.filter(|value| !value.trim().is_empty()) {
            let slug =
                derive_slug(&raw).map_err(|_| ProjectError::ConstraintViolation("slug"))?;
            if slug != params.slug {
                if self.repo.project_slug_exists(&slug, Some(id)).await? {
                    return Err(ProjectError::SlugExists(slug));
                }
                params.slug = slug;
            }
        }

        if let Some(description) = command.description {
            params.description = description;
        }
        if let Some(content) = command.content {
            params.content = content;
        }
        if let Some(tech_stack) = command.tech_stack {
            params.tech_stack = clean_list(tech_stack);
        }
        if let Some(demo_url) = command.demo_url {
            params.demo_url = demo_url.trim().to_string();
        }
        if let Some(github_url) = command.github_url {
            params.github_url = github_url.trim().to_string();
        }
        if let Some(thumbnail) = command.thumbnail {
            params.thumbnail = thumbnail.trim().to_string();
        }
        if let Some(images) = command.images {
            params.images = clean_list(images);
        }
        if let Some(is_featured) = command.is_featured {
            params.is_featured = is_featured;
        }
        if let Some(sort_order) = command.sort_order {
            params.sort_order = sort_order;
        }

        self.repo
            .update_project(id, params)
            .await
            .map_err(ProjectError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ProjectError> {
        self.get(id).await?;
        self.repo
            .delete_project(id)
            .await
            .map_err(ProjectError::from)
    }

    pub async fn reorder(&self, orders: &[ProjectOrder]) -> Result<(), ProjectError> {
        if orders.is_empty() {
            return Err(ProjectError::ConstraintViolation("orders"));
        }
        match self.repo.reorder_projects(orders).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(ProjectError::NotFound),
            Err(err) => Err(err.into()),
        }
    }
}

impl From<ProjectRecord> for ProjectParams {
    fn from(record: ProjectRecord) -> Self {
        Self {
            title: record.title,
            slug: record.slug,
            description: record.description,
            content: record.content,
            tech_stack: record.tech_stack,
            demo_url: record.demo_url,
            github_url: record.github_url,
            thumbnail: record.thumbnail,
            images: record.images,
            is_featured: record.is_featured,
            sort_order: record.sort_order,
        }
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
