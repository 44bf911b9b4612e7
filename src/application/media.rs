//! Media upload pipeline.
//!
//! Processed uploads write three artifacts in a fixed order (main, small,
//! medium) and only then the metadata row. Whatever was written before a
//! failure is removed again through [`cleanup_best_effort`], so no row ever
//! references a partial asset. GIF and SVG skip processing and are stored
//! verbatim.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::imaging::{ImageProcessor, ImagingError};
use crate::application::repos::{MediaRepo, NewMediaAsset, RepoError};
use crate::application::storage::{ObjectStorage, StorageError};
use crate::domain::entities::MediaAsset;
use crate::domain::error::DomainError;
use crate::domain::media::{ArtifactNames, CANONICAL_MIME, MediaKind, MediaPolicy};

const LOG_TARGET: &str = "folio::media";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    Rejected(#[from] DomainError),
    #[error("media asset not found")]
    NotFound,
    #[error("image processing failed")]
    Processing(#[source] ImagingError),
    #[error("image processing task failed: {0}")]
    Task(String),
    #[error("failed to upload {artifact}")]
    Upload {
        artifact: &'static str,
        #[source]
        source: StorageError,
    },
    #[error("failed to delete stored media")]
    Storage(#[source] StorageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A single upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadMediaCommand {
    pub original_name: String,
    pub content_type: String,
    pub declared_size: u64,
    pub body: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaListing {
    pub items: Vec<MediaAsset>,
    pub total: u64,
}

/// Outcome of a best-effort cleanup. Callers may log it; it is never an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every path, continuing past failures. Failures are logged and
/// counted in `folio_media_cleanup_failures_total`.
pub async fn cleanup_best_effort(storage: &dyn ObjectStorage, paths: &[String]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        delete_best_effort(storage, path, &mut report).await;
    }
    report
}

async fn delete_best_effort(storage: &dyn ObjectStorage, path: &str, report: &mut CleanupReport) {
    match storage.delete(path).await {
        Ok(()) => report.removed.push(path.to_string()),
        Err(err) => {
            warn!(
                target: LOG_TARGET,
                path = %path,
                error = %err,
                "best-effort artifact cleanup failed"
            );
            counter!("folio_media_cleanup_failures_total").increment(1);
            report.failed.push((path.to_string(), err.to_string()));
        }
    }
}

/// Paths written during an upload that is not yet committed.
///
/// Dropping the guard without [`PendingArtifacts::commit`] (for example when
/// the request future is cancelled) schedules the cleanup on the runtime.
struct PendingArtifacts {
    storage: Arc<dyn ObjectStorage>,
    paths: Vec<String>,
}

impl PendingArtifacts {
    fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            storage,
            paths: Vec::new(),
        }
    }

    fn push(&mut self, path: String) {
        self.paths.push(path);
    }

    fn commit(mut self) {
        self.paths.clear();
    }

    /// Paths leave the guard only once their delete has been attempted, so a
    /// rollback cut short by cancellation hands the rest to [`Drop`].
    async fn rollback(mut self) -> CleanupReport {
        let storage = Arc::clone(&self.storage);
        let mut report = CleanupReport::default();
        while let Some(path) = self.paths.first().cloned() {
            delete_best_effort(storage.as_ref(), &path, &mut report).await;
            self.paths.remove(0);
        }
        report
    }
}

impl Drop for PendingArtifacts {
    fn drop(&mut self) {
        if self.paths.is_empty() {
            return;
        }

        let paths = std::mem::take(&mut self.paths);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let storage = Arc::clone(&self.storage);
                handle.spawn(async move {
                    cleanup_best_effort(storage.as_ref(), &paths).await;
                });
            }
            Err(_) => {
                warn!(
                    target: LOG_TARGET,
                    orphaned = paths.len(),
                    "upload abandoned outside a runtime; artifacts left in storage"
                );
                counter!("folio_media_cleanup_failures_total").increment(paths.len() as u64);
            }
        }
    }
}

#[derive(Clone)]
pub struct MediaService {
    repo: Arc<dyn MediaRepo>,
    storage: Arc<dyn ObjectStorage>,
    policy: MediaPolicy,
    processor: ImageProcessor,
}

impl MediaService {
    pub fn new(
        repo: Arc<dyn MediaRepo>,
        storage: Arc<dyn ObjectStorage>,
        policy: MediaPolicy,
        processor: ImageProcessor,
    ) -> Self {
        Self {
            repo,
            storage,
            policy,
            processor,
        }
    }

    pub async fn upload(&self, command: UploadMediaCommand) -> Result<MediaAsset, MediaError> {
        let size = command.declared_size.max(command.body.len() as u64);
        let kind = self.policy.check(&command.content_type, size)?;
        let names = ArtifactNames::new(OffsetDateTime::now_utc(), Uuid::new_v4());

        let asset = if kind.is_passthrough() {
            self.upload_passthrough(command, kind, &names).await?
        } else {
            self.upload_processed(command, &names).await?
        };

        counter!("folio_media_uploads_total", "kind" => kind.label()).increment(1);
        info!(
            target: LOG_TARGET,
            id = asset.id,
            path = %asset.path,
            kind = kind.label(),
            size = asset.size,
            "media uploaded"
        );

        Ok(asset)
    }

    async fn upload_passthrough(
        &self,
        command: UploadMediaCommand,
        kind: MediaKind,
        names: &ArtifactNames,
    ) -> Result<MediaAsset, MediaError> {
        let path = names.passthrough_path(kind);
        let size = command.body.len() as i64;

        self.storage
            .put(&path, command.body, kind.mime())
            .await
            .map_err(|source| MediaError::Upload {
                artifact: "original file",
                source,
            })?;

        let mut pending = PendingArtifacts::new(Arc::clone(&self.storage));
        pending.push(path.clone());

        let record = NewMediaAsset {
            filename: names.passthrough_filename(kind),
            original_name: command.original_name,
            url: self.storage.public_url(&path),
            path,
            mime_type: kind.mime().to_string(),
            size,
            width: 0,
            height: 0,
            thumbnail_sm: None,
            thumbnail_md: None,
        };

        self.persist(record, pending).await
    }

    async fn upload_processed(
        &self,
        command: UploadMediaCommand,
        names: &ArtifactNames,
    ) -> Result<MediaAsset, MediaError> {
        let processor = self.processor;
        let body = command.body;
        let processed = tokio::task::spawn_blocking(move || processor.process(&body))
            .await
            .map_err(|err| MediaError::Task(err.to_string()))?
            .map_err(MediaError::Processing)?;

        let main_path = names.main_path();
        let small_path = names.small_path();
        let medium_path = names.medium_path();
        let size = processed.main.bytes.len() as i64;

        let steps = [
            (main_path.clone(), processed.main.bytes, "main image"),
            (small_path.clone(), processed.small.bytes, "small thumbnail"),
            (medium_path.clone(), processed.medium.bytes, "medium thumbnail"),
        ];

        let mut pending = PendingArtifacts::new(Arc::clone(&self.storage));
        for (path, bytes, artifact) in steps {
            if let Err(source) = self.storage.put(&path, bytes, CANONICAL_MIME).await {
                pending.rollback().await;
                return Err(MediaError::Upload { artifact, source });
            }
            pending.push(path);
        }

        let record = NewMediaAsset {
            filename: names.main_filename(),
            original_name: command.original_name,
            url: self.storage.public_url(&main_path),
            path: main_path,
            mime_type: CANONICAL_MIME.to_string(),
            size,
            width: to_dimension(processed.width),
            height: to_dimension(processed.height),
            thumbnail_sm: Some(self.storage.public_url(&small_path)),
            thumbnail_md: Some(self.storage.public_url(&medium_path)),
        };

        self.persist(record, pending).await
    }

    async fn persist(
        &self,
        record: NewMediaAsset,
        pending: PendingArtifacts,
    ) -> Result<MediaAsset, MediaError> {
        // A cancel after the INSERT commits but before its reply arrives drops
        // the guard and removes artifacts the new row points at.
        match self.repo.create_media(record).await {
            Ok(asset) => {
                pending.commit();
                Ok(asset)
            }
            Err(err) => {
                pending.rollback().await;
                Err(err.into())
            }
        }
    }

    /// Remove an asset. A failed delete of the main artifact aborts before
    /// the row is touched; thumbnail deletes are best-effort.
    pub async fn delete(&self, id: i64) -> Result<MediaAsset, MediaError> {
        let asset = self
            .repo
            .find_media(id)
            .await?
            .ok_or(MediaError::NotFound)?;

        self.storage
            .delete(&asset.path)
            .await
            .map_err(MediaError::Storage)?;

        let mut thumbnails = Vec::new();
        for url in [&asset.thumbnail_sm, &asset.thumbnail_md].into_iter().flatten() {
            match self.storage.path_from_url(url) {
                Some(path) => thumbnails.push(path),
                None => warn!(
                    target: LOG_TARGET,
                    id,
                    url = %url,
                    "thumbnail url does not map to a storage path"
                ),
            }
        }
        cleanup_best_effort(self.storage.as_ref(), &thumbnails).await;

        self.repo.delete_media(id).await?;
        info!(target: LOG_TARGET, id, path = %asset.path, "media deleted");

        Ok(asset)
    }

    pub async fn find(&self, id: i64) -> Result<MediaAsset, MediaError> {
        self.repo
            .find_media(id)
            .await?
            .ok_or(MediaError::NotFound)
    }

    pub async fn list(&self, limit: u32, offset: u64) -> Result<MediaListing, MediaError> {
        let items = self.repo.list_media(limit, offset).await?;
        let total = self.repo.count_media().await?;
        Ok(MediaListing { items, total })
    }
}

fn to_dimension(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
