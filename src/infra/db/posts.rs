use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePostParams, PostListScope, PostQueryFilter, PostsRepo, RepoError, UpdatePostParams,
    ViewCounter,
};
use crate::domain::entities::{PostDetails, PostRecord, TagBrief};
use crate::domain::types::PostStatus;

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, p.category_id, \
     p.status, p.view_count, p.reading_time, p.thumbnail, p.created_at, p.updated_at, \
     p.published_at";

const RETURNING_POST: &str = " RETURNING id, title, slug, content, excerpt, category_id, status, \
     view_count, reading_time, thumbnail, created_at, updated_at, published_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    slug: String,
    content: String,
    excerpt: String,
    category_id: Option<i64>,
    status: PostStatus,
    view_count: i32,
    reading_time: i32,
    thumbnail: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    published_at: Option<OffsetDateTime>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            category_id: row.category_id,
            status: row.status,
            view_count: row.view_count,
            reading_time: row.reading_time,
            thumbnail: row.thumbnail,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published_at: row.published_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostDetailsRow {
    #[sqlx(flatten)]
    post: PostRow,
    category_name: Option<String>,
    category_slug: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: i64,
    id: i64,
    name: String,
    slug: String,
}

impl PostgresRepositories {
    fn details_query<'q>() -> QueryBuilder<'q, sqlx::Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(
            ", c.name AS category_name, c.slug AS category_slug \
             FROM posts p LEFT JOIN categories c ON c.id = p.category_id WHERE 1=1 ",
        );
        qb
    }

    async fn attach_tags(&self, rows: Vec<PostDetailsRow>) -> Result<Vec<PostDetails>, RepoError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.post.id).collect();
        let mut tags_by_post: HashMap<i64, Vec<TagBrief>> = HashMap::new();

        if !ids.is_empty() {
            let tag_rows = sqlx::query_as::<_, PostTagRow>(
                r#"
                SELECT pt.post_id, t.id, t.name, t.slug
                FROM post_tags pt
                INNER JOIN tags t ON t.id = pt.tag_id
                WHERE pt.post_id = ANY($1)
                ORDER BY t.name, t.id
                "#,
            )
            .bind(ids.as_slice())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

            for row in tag_rows {
                tags_by_post.entry(row.post_id).or_default().push(TagBrief {
                    id: row.id,
                    name: row.name,
                    slug: row.slug,
                });
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = tags_by_post.remove(&row.post.id).unwrap_or_default();
                PostDetails {
                    post: PostRecord::from(row.post),
                    category_name: row.category_name,
                    category_slug: row.category_slug,
                    tags,
                }
            })
            .collect())
    }

    async fn find_details_where(
        &self,
        column: &'static str,
        value: PostLookup<'_>,
    ) -> Result<Option<PostDetails>, RepoError> {
        let mut qb = Self::details_query();
        qb.push(" AND p.");
        qb.push(column);
        qb.push(" = ");
        match value {
            PostLookup::Id(id) => qb.push_bind(id),
            PostLookup::Slug(slug) => qb.push_bind(slug),
        };

        let row = qb
            .build_query_as::<PostDetailsRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.attach_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

enum PostLookup<'a> {
    Id(i64),
    Slug(&'a str),
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<PostDetails>, RepoError> {
        let mut qb = Self::details_query();
        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);

        match scope {
            PostListScope::Public => {
                qb.push(" ORDER BY p.published_at DESC NULLS LAST, p.id DESC ");
            }
            PostListScope::Admin { .. } => {
                qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
            }
        }

        qb.push(" LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(Self::convert_offset(offset)?);

        let rows = qb
            .build_query_as::<PostDetailsRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.attach_tags(rows).await
    }

    async fn count_posts(
        &self,
        scope: PostListScope,
        filter: &PostQueryFilter,
    ) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostDetails>, RepoError> {
        self.find_details_where("id", PostLookup::Id(id)).await
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostDetails>, RepoError> {
        self.find_details_where("slug", PostLookup::Slug(slug)).await
    }

    async fn post_slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams { content, status } = params;

        let mut qb = QueryBuilder::new(
            "INSERT INTO posts (title, slug, content, excerpt, category_id, reading_time, \
             thumbnail, status, published_at) VALUES (",
        );
        let mut values = qb.separated(", ");
        values.push_bind(content.title);
        values.push_bind(content.slug);
        values.push_bind(content.content);
        values.push_bind(content.excerpt);
        values.push_bind(content.category_id);
        values.push_bind(content.reading_time);
        values.push_bind(content.thumbnail);
        values.push_bind(status);
        values.push(if status == PostStatus::Published {
            "now()"
        } else {
            "NULL"
        });
        qb.push(")");
        qb.push(RETURNING_POST);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams { id, content } = params;

        let sql = format!(
            "UPDATE posts SET title = $2, slug = $3, content = $4, excerpt = $5, \
             category_id = $6, reading_time = $7, thumbnail = $8, updated_at = now() \
             WHERE id = $1{RETURNING_POST}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(content.title)
            .bind(content.slug)
            .bind(content.content)
            .bind(content.excerpt)
            .bind(content.category_id)
            .bind(content.reading_time)
            .bind(content.thumbnail)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn set_post_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<PostRecord, RepoError> {
        let status = if published {
            PostStatus::Published
        } else {
            PostStatus::Draft
        };

        let sql = format!(
            "UPDATE posts SET status = $2, \
             published_at = CASE WHEN $2 = 'published'::post_status \
                 THEN COALESCE(published_at, now()) ELSE published_at END, \
             updated_at = now() \
             WHERE id = $1{RETURNING_POST}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_post_tags(&self, post_id: i64, tag_ids: &[i64]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if !tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) \
                 SELECT $1, tag_id FROM UNNEST($2::BIGINT[]) AS tag_id \
                 ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(tag_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl ViewCounter for PostgresRepositories {
    async fn increment_view_count(&self, post_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
