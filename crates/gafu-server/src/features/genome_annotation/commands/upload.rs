use crate::features::genome_annotation::{
    GenbankToGenomeAnnotationParams, GenomeAnnotationDetails, GenomeAnnotationError,
};
use crate::features::shared::provided;
use crate::features::FeatureState;
use crate::scratch::{ScratchDir, UPLOAD_STAGING_PREFIX};
use crate::services::{ConvertGenomeRequest, UploadGenomeRequest};
use anyhow::Context;
use gafu_common::types::ObjectRef;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_SOURCE: &str = "Genbank";
pub const DEFAULT_TAXON_WORKSPACE: &str = "ReferenceTaxons";

/// Subdirectory of the staging area that URL inputs are fetched into
pub const URL_INPUT_NAME: &str = "ftpfiles";

/// Where the GenBank input comes from, in order of precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    LocalPath(PathBuf),
    BlobId(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGenomeCommand {
    pub workspace_name: String,
    pub genome_name: String,
    pub input: InputSource,
    pub source: String,
    pub taxon_wsname: String,
    pub convert_to_legacy: bool,
}

impl TryFrom<GenbankToGenomeAnnotationParams> for UploadGenomeCommand {
    type Error = GenomeAnnotationError;

    fn try_from(params: GenbankToGenomeAnnotationParams) -> Result<Self, Self::Error> {
        let workspace_name =
            provided(&params.workspace_name).ok_or(GenomeAnnotationError::WorkspaceNameRequired)?;
        let genome_name =
            provided(&params.genome_name).ok_or(GenomeAnnotationError::GenomeNameRequired)?;

        let input = if let Some(path) = provided(&params.file_path) {
            InputSource::LocalPath(PathBuf::from(path))
        } else if let Some(blob_id) = provided(&params.shock_id) {
            InputSource::BlobId(blob_id.to_string())
        } else if let Some(url) = provided(&params.ftp_url) {
            InputSource::Url(url.to_string())
        } else {
            return Err(GenomeAnnotationError::InputFileRequired);
        };

        Ok(Self {
            workspace_name: workspace_name.to_string(),
            genome_name: genome_name.to_string(),
            input,
            source: provided(&params.source).unwrap_or(DEFAULT_SOURCE).to_string(),
            taxon_wsname: provided(&params.taxon_wsname)
                .unwrap_or(DEFAULT_TAXON_WORKSPACE)
                .to_string(),
            convert_to_legacy: params.convert_to_legacy.unwrap_or_default().is_set(),
        })
    }
}

#[tracing::instrument(skip(state, token, params))]
pub async fn handle(
    state: &FeatureState,
    token: Option<&str>,
    params: GenbankToGenomeAnnotationParams,
) -> Result<GenomeAnnotationDetails, GenomeAnnotationError> {
    info!(?params, "genbank_to_genome_annotation");
    let command = UploadGenomeCommand::try_from(params)?;
    let services = &state.services;
    let endpoints = state.config.endpoints();

    let staging = ScratchDir::create(&state.config.scratch, UPLOAD_STAGING_PREFIX).await?;
    let input_directory = stage_input(state, token, &command.input, staging.path()).await?;

    let request = UploadGenomeRequest {
        input_directory,
        workspace_name: command.workspace_name.clone(),
        core_genome_name: command.genome_name.clone(),
        source: command.source.clone(),
        taxon_wsname: command.taxon_wsname.clone(),
    };
    services.uploader.upload_genome(&request, &endpoints, token).await?;

    if command.convert_to_legacy {
        let request = ConvertGenomeRequest {
            obj_name: command.genome_name.clone(),
            ws_name: command.workspace_name.clone(),
        };
        services.legacy_converter.convert_genome(&request, &endpoints, token).await?;
    }

    staging.close().await;

    let reference = ObjectRef::compose(&command.workspace_name, &command.genome_name);
    let info = services.object_store.get_object_info(&reference, token).await?;
    let details = GenomeAnnotationDetails {
        genome_annotation_ref: ObjectRef::from_info(&info),
    };

    info!(genome_annotation_ref = %details.genome_annotation_ref, "Uploaded genome annotation");
    Ok(details)
}

/// Materialize the input under `staging` and return the uploader's input directory
async fn stage_input(
    state: &FeatureState,
    token: Option<&str>,
    input: &InputSource,
    staging: &Path,
) -> Result<PathBuf, GenomeAnnotationError> {
    let services = &state.services;

    match input {
        InputSource::LocalPath(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("file_path has no file name: {}", path.display()))?;
            let staged = staging.join(file_name);
            tokio::fs::copy(path, &staged)
                .await
                .with_context(|| format!("Failed to copy {} into staging", path.display()))?;
            services.extractor.extract_in_place(&staged).await?;
            Ok(staging.to_path_buf())
        },
        InputSource::BlobId(blob_id) => {
            let file_name = services.blob_store.fetch_file(blob_id, staging).await?;
            services
                .extractor
                .extract_in_place(&staging.join(file_name))
                .await?;
            Ok(staging.to_path_buf())
        },
        InputSource::Url(url) => {
            let urls = BTreeMap::from([(URL_INPUT_NAME.to_string(), url.clone())]);
            services.url_fetcher.fetch_urls(staging, token, &urls).await?;

            let fetched_dir = staging.join(URL_INPUT_NAME);
            for file in regular_files(&fetched_dir).await? {
                services.extractor.extract_in_place(&file).await?;
            }
            Ok(fetched_dir)
        },
    }
}

/// Regular files directly inside `dir`, sorted by name
async fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, GenomeAnnotationError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Fetched input directory missing: {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
