use crate::features::genome_annotation::{
    GenbankFile, GenomeAnnotationError, GenomeAnnotationToGenbankParams,
};
use crate::features::shared::{provided, validate_file_name};
use crate::features::FeatureState;
use crate::scratch::{ScratchDir, DOWNLOAD_WORKING_PREFIX};
use crate::services::DownloadGenbankRequest;
use gafu_common::types::ObjectRef;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadGenbankQuery {
    pub genome_ref: ObjectRef,
    /// Output file name; `<object name>.gbk` when unset
    pub file_name: Option<String>,
    pub save_to_blob_store: bool,
}

impl TryFrom<GenomeAnnotationToGenbankParams> for DownloadGenbankQuery {
    type Error = GenomeAnnotationError;

    fn try_from(params: GenomeAnnotationToGenbankParams) -> Result<Self, Self::Error> {
        let genome_ref = match provided(&params.genome_ref) {
            Some(reference) => ObjectRef::parse(reference)?,
            None => {
                let genome_name =
                    provided(&params.genome_name).ok_or(GenomeAnnotationError::GenomeRefRequired)?;
                let workspace_name = provided(&params.workspace_name)
                    .ok_or(GenomeAnnotationError::DownloadWorkspaceRequired)?;
                ObjectRef::compose(workspace_name, genome_name)
            },
        };

        let file_name = match provided(&params.new_genbank_file_name) {
            Some(name) => {
                validate_file_name(name).map_err(|reason| GenomeAnnotationError::InvalidFileName {
                    name: name.to_string(),
                    reason,
                })?;
                Some(name.to_string())
            },
            None => None,
        };

        Ok(Self {
            genome_ref,
            file_name,
            save_to_blob_store: params.save_to_shock.unwrap_or_default().is_set(),
        })
    }
}

/// A GenBank file written into its own working directory.
///
/// [`DownloadedGenbank::close`] removes the working directory and the file with
/// it. Dropping does the same on error paths.
#[derive(Debug)]
pub struct DownloadedGenbank {
    working_dir: ScratchDir,
    file: PathBuf,
}

impl DownloadedGenbank {
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Release the working directory and return the file path
    pub fn keep(self) -> PathBuf {
        self.working_dir.keep();
        self.file
    }

    pub async fn close(self) {
        self.working_dir.close().await;
    }
}

/// Run the downloader for `query` into a fresh working directory
pub async fn run(
    state: &FeatureState,
    token: Option<&str>,
    query: &DownloadGenbankQuery,
) -> Result<DownloadedGenbank, GenomeAnnotationError> {
    let services = &state.services;

    let file_name = match &query.file_name {
        Some(name) => name.clone(),
        None => {
            let info = services
                .object_store
                .get_object_info(&query.genome_ref, token)
                .await?;
            format!("{}.gbk", info.name)
        },
    };

    let working_dir = ScratchDir::create(&state.config.scratch, DOWNLOAD_WORKING_PREFIX).await?;
    let request = DownloadGenbankRequest {
        genome_ref: query.genome_ref.clone(),
        output_file: working_dir.path().join(&file_name),
        working_directory: working_dir.path().to_path_buf(),
    };
    services
        .downloader
        .download_as_gbk(&request, &state.config.endpoints(), token)
        .await?;

    Ok(DownloadedGenbank {
        working_dir,
        file: request.output_file,
    })
}

#[tracing::instrument(skip(state, token, params))]
pub async fn handle(
    state: &FeatureState,
    token: Option<&str>,
    params: GenomeAnnotationToGenbankParams,
) -> Result<GenbankFile, GenomeAnnotationError> {
    info!(?params, "genome_annotation_to_genbank");
    let query = DownloadGenbankQuery::try_from(params)?;
    let downloaded = run(state, token, &query).await?;

    let result = if query.save_to_blob_store {
        let blob_id = state.services.blob_store.store_file(downloaded.file()).await?;
        downloaded.close().await;
        GenbankFile::stored(blob_id)
    } else {
        GenbankFile::local(downloaded.keep())
    };

    info!(?result, genome_ref = %query.genome_ref, "Downloaded genome annotation");
    Ok(result)
}
