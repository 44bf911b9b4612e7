//! Redis-backed view store.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};

use crate::application::views::{ViewStore, ViewStoreError};
use crate::config::RedisSettings;

const MARKER: &str = "1";

pub struct RedisViewStore {
    pool: Pool,
}

impl RedisViewStore {
    pub fn new(settings: &RedisSettings) -> Result<Self, ViewStoreError> {
        let pool = Config::from_url(&settings.url)
            .builder()
            .map(|builder| {
                builder
                    .max_size(settings.pool_size)
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|err| ViewStoreError::Connection(err.to_string()))?
            .map_err(|err| ViewStoreError::Connection(err.to_string()))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, ViewStoreError> {
        self.pool
            .get()
            .await
            .map_err(|err| ViewStoreError::Connection(err.to_string()))
    }
}

#[async_trait]
impl ViewStore for RedisViewStore {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, ViewStoreError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn().await?;

        // `OK` when the key was created, nil when it already existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(MARKER)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(|err| ViewStoreError::Command(err.to_string()))?;

        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, ViewStoreError> {
        let mut conn = self.conn().await?;
        let count: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|err| ViewStoreError::Command(err.to_string()))?;

        Ok(count > 0)
    }

    async fn ping(&self) -> Result<(), ViewStoreError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|err| ViewStoreError::Command(err.to_string()))?;
        Ok(())
    }
}
