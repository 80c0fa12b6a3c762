//! Collaborators of the genome annotation operations
//!
//! Every external service the operations depend on sits behind a trait so the
//! orchestration can run against in-memory fakes in tests:
//!
//! | Trait | Production implementation |
//! |---|---|
//! | [`ObjectStore`] | [`workspace::WorkspaceClient`] (Workspace JSON-RPC) |
//! | [`BlobStore`] | [`crate::storage::Storage`] (S3) |
//! | [`UrlFetcher`] | [`fetch::RemoteFetcher`] (HTTP(S) and FTP) |
//! | [`ArchiveExtractor`] | [`archive::FsArchiveExtractor`] (gzip, tar, zip) |
//! | [`GenbankUploader`], [`LegacyConverter`], [`GenbankDownloader`] | [`transform::CallbackTransformClient`] |
//! | [`Packager`] | [`packaging::ZipPackager`] |

pub mod archive;
pub mod fetch;
pub mod ftp;
pub mod packaging;
pub mod rpc;
pub mod transform;
pub mod workspace;

use crate::config::{KbaseConfig, ServiceEndpoints};
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use gafu_common::types::{ObjectInfo, ObjectRef};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Workspace object metadata lookups
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object_info(&self, reference: &ObjectRef, token: Option<&str>)
        -> Result<ObjectInfo>;
}

/// Large-file transfer in and out of the platform
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a local file and return its blob id
    async fn store_file(&self, path: &Path) -> Result<String>;

    /// Write the blob into `destination` and return the file name it was stored under
    async fn fetch_file(&self, blob_id: &str, destination: &Path) -> Result<String>;
}

/// Retrieval of remote files named by URL
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// For every `logical name -> url` entry, materialize the fetched file(s)
    /// under `working_directory/<logical name>/`.
    async fn fetch_urls(
        &self,
        working_directory: &Path,
        token: Option<&str>,
        urls: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// In-place unpacking of compressed or archived files
#[async_trait]
pub trait ArchiveExtractor: Send + Sync {
    /// Unpack `path` next to itself when it is a recognized format; no-op otherwise.
    async fn extract_in_place(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadGenomeRequest {
    pub input_directory: PathBuf,
    pub workspace_name: String,
    pub core_genome_name: String,
    pub source: String,
    pub taxon_wsname: String,
}

/// Builds a GenomeAnnotation object from a directory of GenBank files
#[async_trait]
pub trait GenbankUploader: Send + Sync {
    async fn upload_genome(
        &self,
        request: &UploadGenomeRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertGenomeRequest {
    pub obj_name: String,
    pub ws_name: String,
}

/// Saves a legacy `KBaseGenomes.Genome` alongside a GenomeAnnotation
#[async_trait]
pub trait LegacyConverter: Send + Sync {
    async fn convert_genome(
        &self,
        request: &ConvertGenomeRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadGenbankRequest {
    pub genome_ref: ObjectRef,
    pub output_file: PathBuf,
    pub working_directory: PathBuf,
}

/// Writes a GenomeAnnotation (or legacy Genome) out as a GenBank file
#[async_trait]
pub trait GenbankDownloader: Send + Sync {
    async fn download_as_gbk(
        &self,
        request: &DownloadGenbankRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()>;
}

/// Bundles a directory with provenance for bulk download
#[async_trait]
pub trait Packager: Send + Sync {
    /// Returns the blob id of the stored package
    async fn package_for_download(
        &self,
        directory: &Path,
        source_refs: &[ObjectRef],
        token: Option<&str>,
    ) -> Result<String>;
}

/// The full set of collaborators used by the operations
#[derive(Clone)]
pub struct Services {
    pub object_store: Arc<dyn ObjectStore>,
    pub blob_store: Arc<dyn BlobStore>,
    pub url_fetcher: Arc<dyn UrlFetcher>,
    pub extractor: Arc<dyn ArchiveExtractor>,
    pub uploader: Arc<dyn GenbankUploader>,
    pub legacy_converter: Arc<dyn LegacyConverter>,
    pub downloader: Arc<dyn GenbankDownloader>,
    pub packager: Arc<dyn Packager>,
}

impl Services {
    /// Production collaborators: workspace and callback JSON-RPC, S3 blobs,
    /// HTTP/FTP fetching and local archive handling.
    pub fn connect(config: &KbaseConfig, storage: Storage) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(workspace::WorkspaceClient::new(&config.workspace_url, timeout)?);
        let blob_store: Arc<dyn BlobStore> = Arc::new(storage);
        let transform = Arc::new(transform::CallbackTransformClient::new(
            &config.callback_url,
            timeout,
        )?);

        Ok(Self {
            object_store: object_store.clone(),
            blob_store: blob_store.clone(),
            url_fetcher: Arc::new(fetch::RemoteFetcher::new(timeout, Some(config.shock_url.clone()))?),
            extractor: Arc::new(archive::FsArchiveExtractor),
            uploader: transform.clone(),
            legacy_converter: transform.clone(),
            downloader: transform,
            packager: Arc::new(packaging::ZipPackager::new(object_store, blob_store)),
        })
    }
}
