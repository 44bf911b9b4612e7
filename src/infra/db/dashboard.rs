use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{DashboardRepo, RepoError};
use crate::domain::entities::{CategoryStat, PostStats, RecentPost};
use crate::domain::types::PostStatus;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostStatsRow {
    total: i64,
    published: i64,
    draft: i64,
}

#[derive(sqlx::FromRow)]
struct CategoryStatRow {
    id: i64,
    name: String,
    slug: String,
    post_count: i64,
}

#[derive(sqlx::FromRow)]
struct RecentPostRow {
    id: i64,
    title: String,
    slug: String,
    status: PostStatus,
    view_count: i32,
    created_at: OffsetDateTime,
    published_at: Option<OffsetDateTime>,
}

#[async_trait]
impl DashboardRepo for PostgresRepositories {
    async fn post_stats(&self) -> Result<PostStats, RepoError> {
        let row = sqlx::query_as::<_, PostStatsRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'published'::post_status) AS published,
                   COUNT(*) FILTER (WHERE status = 'draft'::post_status) AS draft
            FROM posts
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostStats {
            total: Self::convert_count(row.total)?,
            published: Self::convert_count(row.published)?,
            draft: Self::convert_count(row.draft)?,
        })
    }

    async fn category_stats(&self) -> Result<Vec<CategoryStat>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryStatRow>(
            r#"
            SELECT c.id, c.name, c.slug, COUNT(p.id) AS post_count
            FROM categories c
            LEFT JOIN posts p ON p.category_id = c.id
            GROUP BY c.id, c.name, c.slug, c.sort_order
            ORDER BY c.sort_order, c.name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(CategoryStat {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                    post_count: Self::convert_count(row.post_count)?,
                })
            })
            .collect()
    }

    async fn recent_posts(&self, limit: u32) -> Result<Vec<RecentPost>, RepoError> {
        let rows = sqlx::query_as::<_, RecentPostRow>(
            r#"
            SELECT id, title, slug, status, view_count, created_at, published_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| RecentPost {
                id: row.id,
                title: row.title,
                slug: row.slug,
                status: row.status,
                view_count: row.view_count,
                created_at: row.created_at,
                published_at: row.published_at,
            })
            .collect())
    }
}
