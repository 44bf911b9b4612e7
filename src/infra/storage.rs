//! S3-compatible object storage adapter (MinIO by default).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, timeout::TimeoutConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, error};

use crate::application::storage::{ObjectStorage, StorageError};
use crate::config::StorageSettings;
use crate::domain::media::PublicUrls;

const CREDENTIALS_PROVIDER: &str = "folio-static";

pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    urls: PublicUrls,
}

impl std::fmt::Debug for S3ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStorage")
            .field("bucket", &self.bucket)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ObjectStorage {
    pub async fn connect(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        debug!(
            target: "folio::storage",
            endpoint = %settings.endpoint,
            bucket = %settings.bucket,
            "configuring object storage client"
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint.clone())
            .credentials_provider(credentials)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(settings.request_timeout)
                    .build(),
            )
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self::with_client(Client::from_conf(s3_config), settings)
    }

    pub fn with_client(client: Client, settings: &StorageSettings) -> Self {
        Self {
            client,
            bucket: settings.bucket.clone(),
            urls: PublicUrls::new(settings.public_url.clone(), settings.bucket.clone()),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put(&self, path: &str, body: Bytes, content_type: &str) -> Result<(), StorageError> {
        let size = body.len();
        let content_length = i64::try_from(size)
            .map_err(|_| StorageError::request(path, "object exceeds supported length"))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                error!(target: "folio::storage", key = %path, error = %message, "put_object failed");
                StorageError::request(path, message)
            })?;

        debug!(target: "folio::storage", key = %path, size, "object stored");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                error!(target: "folio::storage", key = %path, error = %message, "delete_object failed");
                StorageError::request(path, message)
            })?;

        debug!(target: "folio::storage", key = %path, "object deleted");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.urls.url_for(path)
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        self.urls.path_for(url)
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|err| StorageError::Unavailable(DisplayErrorContext(&err).to_string()))
    }
}
