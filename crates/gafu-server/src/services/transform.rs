//! GenBank transform collaborators hosted by the SDK callback service
//!
//! The uploader, legacy converter and downloader run next to this service and
//! share its scratch mount, so directories and output paths are passed as
//! plain filesystem paths.

use super::rpc::JsonRpcClient;
use super::{
    ConvertGenomeRequest, DownloadGenbankRequest, GenbankDownloader, GenbankUploader,
    LegacyConverter, UploadGenomeRequest,
};
use crate::config::ServiceEndpoints;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

pub const UPLOAD_GENOME_METHOD: &str = "GenbankTransform.upload_genome";
pub const CONVERT_GENOME_METHOD: &str = "GenomeAnnotationConverters.convert_genome";
pub const DOWNLOAD_AS_GBK_METHOD: &str = "GenomeAnnotationDownloaders.download_as_gbk";

/// Request payload with the platform endpoints flattened alongside it
#[derive(Serialize)]
struct WithEndpoints<'a, T: Serialize> {
    #[serde(flatten)]
    request: &'a T,
    #[serde(flatten)]
    endpoints: &'a ServiceEndpoints,
}

pub struct CallbackTransformClient {
    rpc: JsonRpcClient,
}

impl CallbackTransformClient {
    pub fn new(callback_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(callback_url, timeout)?,
        })
    }
}

#[async_trait]
impl GenbankUploader for CallbackTransformClient {
    #[instrument(skip_all, fields(workspace = %request.workspace_name, genome = %request.core_genome_name))]
    async fn upload_genome(
        &self,
        request: &UploadGenomeRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()> {
        info!(input_directory = %request.input_directory.display(), "Calling GenBank uploader");
        self.rpc
            .call_no_result(
                UPLOAD_GENOME_METHOD,
                WithEndpoints { request, endpoints },
                token,
            )
            .await
            .context("GenBank upload failed")
    }
}

#[async_trait]
impl LegacyConverter for CallbackTransformClient {
    #[instrument(skip_all, fields(workspace = %request.ws_name, genome = %request.obj_name))]
    async fn convert_genome(
        &self,
        request: &ConvertGenomeRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()> {
        info!("Converting to legacy type, object={}", request.obj_name);
        self.rpc
            .call_no_result(
                CONVERT_GENOME_METHOD,
                WithEndpoints { request, endpoints },
                token,
            )
            .await
            .context("Legacy genome conversion failed")
    }
}

#[async_trait]
impl GenbankDownloader for CallbackTransformClient {
    #[instrument(skip_all, fields(genome_ref = %request.genome_ref))]
    async fn download_as_gbk(
        &self,
        request: &DownloadGenbankRequest,
        endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()> {
        info!(output_file = %request.output_file.display(), "Calling GenBank downloader");
        self.rpc
            .call_no_result(
                DOWNLOAD_AS_GBK_METHOD,
                WithEndpoints { request, endpoints },
                token,
            )
            .await
            .context("GenBank download failed")?;

        // The callback writes through the shared scratch mount.
        if !tokio::fs::try_exists(&request.output_file).await.unwrap_or(false) {
            anyhow::bail!(
                "GenBank downloader reported success but {} was not written",
                request.output_file.display()
            );
        }

        Ok(())
    }
}
