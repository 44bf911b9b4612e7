use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{ProjectOrder, ProjectParams, ProjectsRepo, RepoError};
use crate::domain::entities::ProjectRecord;

use super::{PostgresRepositories, map_sqlx_error};

const PROJECT_COLUMNS: &str = "id, title, slug, description, content, tech_stack, demo_url, \
     github_url, thumbnail, images, is_featured, sort_order, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
    content: String,
    tech_stack: Vec<String>,
    demo_url: String,
    github_url: String,
    thumbnail: String,
    images: Vec<String>,
    is_featured: bool,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            content: row.content,
            tech_stack: row.tech_stack,
            demo_url: row.demo_url,
            github_url: row.github_url,
            thumbnail: row.thumbnail,
            images: row.images,
            is_featured: row.is_featured,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ProjectsRepo for PostgresRepositories {
    async fn list_projects(&self, featured_only: bool) -> Result<Vec<ProjectRecord>, RepoError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE ($1 = FALSE OR is_featured) \
             ORDER BY sort_order ASC, created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(featured_only)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }

    async fn find_project(&self, id: i64) -> Result<Option<ProjectRecord>, RepoError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProjectRecord::from))
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<ProjectRecord>, RepoError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE slug = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ProjectRecord::from))
    }

    async fn project_slug_exists(
        &self,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_project(&self, params: ProjectParams) -> Result<ProjectRecord, RepoError> {
        let sql = format!(
            "INSERT INTO projects (title, slug, description, content, tech_stack, demo_url, \
             github_url, thumbnail, images, is_featured, sort_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(params.title)
            .bind(params.slug)
            .bind(params.description)
            .bind(params.content)
            .bind(params.tech_stack)
            .bind(params.demo_url)
            .bind(params.github_url)
            .bind(params.thumbnail)
            .bind(params.images)
            .bind(params.is_featured)
            .bind(params.sort_order)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ProjectRecord::from(row))
    }

    async fn update_project(
        &self,
        id: i64,
        params: ProjectParams,
    ) -> Result<ProjectRecord, RepoError> {
        let sql = format!(
            "UPDATE projects SET title = $2, slug = $3, description = $4, content = $5, \
             tech_stack = $6, demo_url = $7, github_url = $8, thumbnail = $9, images = $10, \
             is_featured = $11, sort_order = $12, updated_at = now() \
             WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.slug)
            .bind(params.description)
            .bind(params.content)
            .bind(params.tech_stack)
            .bind(params.demo_url)
            .bind(params.github_url)
            .bind(params.thumbnail)
            .bind(params.images)
            .bind(params.is_featured)
            .bind(params.sort_order)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(ProjectRecord::from(row))
    }

    async fn delete_project(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn reorder_projects(&self, orders: &[ProjectOrder]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        for order in orders {
            let result = sqlx::query(
                "UPDATE projects SET sort_order = $2, updated_at = now() WHERE id = $1",
            )
            .bind(order.id)
            .bind(order.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            // Dropping the transaction rolls back earlier rows.
            if result.rows_affected() == 0 {
                return Err(RepoError::NotFound);
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
