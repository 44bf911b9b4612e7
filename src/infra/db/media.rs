use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{MediaRepo, NewMediaAsset, RepoError};
use crate::domain::entities::MediaAsset;

use super::{PostgresRepositories, map_sqlx_error};

const MEDIA_COLUMNS: &str = "id, filename, original_name, path, url, mime_type, size, width, \
     height, thumbnail_sm, thumbnail_md, created_at";

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: i64,
    filename: String,
    original_name: String,
    path: String,
    url: String,
    mime_type: String,
    size: i64,
    width: i32,
    height: i32,
    thumbnail_sm: Option<String>,
    thumbnail_md: Option<String>,
    created_at: OffsetDateTime,
}

impl From<MediaRow> for MediaAsset {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            original_name: row.original_name,
            path: row.path,
            url: row.url,
            mime_type: row.mime_type,
            size: row.size,
            width: row.width,
            height: row.height,
            thumbnail_sm: row.thumbnail_sm,
            thumbnail_md: row.thumbnail_md,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MediaRepo for PostgresRepositories {
    async fn create_media(&self, asset: NewMediaAsset) -> Result<MediaAsset, RepoError> {
        let sql = format!(
            "INSERT INTO media (filename, original_name, path, url, mime_type, size, width, \
             height, thumbnail_sm, thumbnail_md) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {MEDIA_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(asset.filename)
            .bind(asset.original_name)
            .bind(asset.path)
            .bind(asset.url)
            .bind(asset.mime_type)
            .bind(asset.size)
            .bind(asset.width)
            .bind(asset.height)
            .bind(asset.thumbnail_sm)
            .bind(asset.thumbnail_md)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(MediaAsset::from(row))
    }

    async fn find_media(&self, id: i64) -> Result<Option<MediaAsset>, RepoError> {
        let sql = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1");
        let row = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MediaAsset::from))
    }

    async fn delete_media(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn list_media(&self, limit: u32, offset: u64) -> Result<Vec<MediaAsset>, RepoError> {
        let sql = format!(
            "SELECT {MEDIA_COLUMNS} FROM media ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(i64::from(limit))
            .bind(Self::convert_offset(offset)?)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MediaAsset::from).collect())
    }

    async fn count_media(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }
}
