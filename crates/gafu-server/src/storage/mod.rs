use crate::services::BlobStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use gafu_common::checksum::file_sha256;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub mod config;

/// Object metadata key holding the original file name
pub const FILENAME_METADATA_KEY: &str = "filename";

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "gafu-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let s3_config = s3_config_builder.build();
        let client = Client::from_conf(s3_config);

        info!("Storage client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    /// Upload a local file under a fresh blob id
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn put_file(&self, path: &Path) -> Result<String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("Not a file path: {}", path.display()))?;
        let blob_id = Uuid::new_v4().to_string();
        let key = self.build_key(&blob_id);

        let file = path.to_path_buf();
        let checksum = tokio::task::spawn_blocking(move || file_sha256(&file))
            .await
            .map_err(|e| anyhow::anyhow!("Checksum task panicked: {}", e))??;
        let size = tokio::fs::metadata(path).await?.len();

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .metadata(FILENAME_METADATA_KEY, &filename)
            .metadata("sha256", &checksum)
            .send()
            .await
            .context("Failed to upload to S3")?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(blob_id)
    }

    /// Download a blob into `directory` under its original file name
    #[instrument(skip(self), fields(directory = %directory.display()))]
    pub async fn get_file(&self, blob_id: &str, directory: &Path) -> Result<String> {
        let key = self.build_key(blob_id);
        debug!("Downloading from s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .context(format!("Failed to download from S3: {}", key))?;

        let filename = stored_filename(
            response
                .metadata()
                .and_then(|m| m.get(FILENAME_METADATA_KEY))
                .map(String::as_str),
            blob_id,
        );

        let destination = directory.join(&filename);
        let mut file = tokio::fs::File::create(&destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;
        let mut body = std::pin::pin!(response.body.into_async_read());
        let bytes = tokio::io::copy(&mut body, &mut file)
            .await
            .context("Failed to stream S3 response body")?;
        file.flush().await?;

        debug!("Downloaded {} bytes from s3://{}/{}", bytes, self.bucket, key);

        Ok(filename)
    }

    pub fn build_key(&self, blob_id: &str) -> String {
        format!("blobs/{}", blob_id)
    }
}

/// File name recorded on the object, reduced to its final component
fn stored_filename(metadata: Option<&str>, blob_id: &str) -> String {
    metadata
        .and_then(|name| Path::new(name).file_name())
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| blob_id.to_string())
}

#[async_trait]
impl BlobStore for Storage {
    async fn store_file(&self, path: &Path) -> Result<String> {
        self.put_file(path).await
    }

    async fn fetch_file(&self, blob_id: &str, destination: &Path) -> Result<String> {
        self.get_file(blob_id, destination).await
    }
}
