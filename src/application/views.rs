//! Deduplicated post view counting.
//!
//! The conditional write on the view store is the only linearisation point:
//! whichever request creates the key counts the view, every other request in
//! the window sees `false`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::repos::ViewCounter;
use crate::domain::views::{VIEW_TTL, view_key};

const LOG_TARGET: &str = "folio::views";

#[derive(Debug, Error)]
pub enum ViewStoreError {
    #[error("view store connection failed: {0}")]
    Connection(String),
    #[error("view store command failed: {0}")]
    Command(String),
}

/// Fast key-value store with an atomic "create if absent" primitive.
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Returns `true` only for the caller that created the key.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, ViewStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, ViewStoreError>;

    async fn ping(&self) -> Result<(), ViewStoreError>;
}

#[derive(Debug, Error)]
pub enum ViewError {
    /// The store could not answer. Distinct from "already viewed" so callers
    /// can degrade instead of miscounting.
    #[error("view tracking unavailable")]
    Store(#[from] ViewStoreError),
}

#[derive(Clone)]
pub struct ViewService {
    store: Arc<dyn ViewStore>,
    counter: Arc<dyn ViewCounter>,
    ttl: Duration,
    salt: Arc<str>,
}

impl ViewService {
    pub fn new(store: Arc<dyn ViewStore>, counter: Arc<dyn ViewCounter>) -> Self {
        Self {
            store,
            counter,
            ttl: VIEW_TTL,
            salt: Arc::from(""),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_salt(mut self, salt: impl Into<Arc<str>>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Record a view, returning whether it was the first one in the window.
    pub async fn record_view(&self, post_id: i64, client_addr: &str) -> Result<bool, ViewError> {
        let key = view_key(post_id, client_addr, &self.salt);

        let created = match self.store.set_if_absent(&key, self.ttl).await {
            Ok(created) => created,
            Err(err) => {
                counter!("folio_view_store_errors_total").increment(1);
                return Err(err.into());
            }
        };

        if !created {
            debug!(target: LOG_TARGET, post_id, "repeat view ignored");
            return Ok(false);
        }

        // The dedup key is already set, so this view counts as recorded even
        // if the increment below fails. The durable counter may undercount;
        // it never double counts.
        if let Err(err) = self.counter.increment_view_count(post_id).await {
            warn!(
                target: LOG_TARGET,
                post_id,
                error = %err,
                "view recorded but counter increment failed"
            );
            counter!("folio_view_counter_increment_failures_total").increment(1);
        } else {
            counter!("folio_views_recorded_total").increment(1);
        }

        Ok(true)
    }

    pub async fn has_viewed(&self, post_id: i64, client_addr: &str) -> Result<bool, ViewError> {
        let key = view_key(post_id, client_addr, &self.salt);
        match self.store.exists(&key).await {
            Ok(exists) => Ok(exists),
            Err(err) => {
                counter!("folio_view_store_errors_total").increment(1);
                Err(err.into())
            }
        }
    }

    pub async fn health_check(&self) -> Result<(), ViewError> {
        self.store.ping().await.map_err(ViewError::from)
    }
}
