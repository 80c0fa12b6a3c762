use crate::features::genome_annotation::queries::download::{self, DownloadGenbankQuery};
use crate::features::genome_annotation::{ExportOutput, ExportParams, GenomeAnnotationError};
use crate::features::shared::provided;
use crate::features::FeatureState;
use crate::scratch::ScratchDir;
use anyhow::Context;
use gafu_common::types::ObjectRef;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportGenomeCommand {
    pub input_ref: ObjectRef,
}

impl TryFrom<ExportParams> for ExportGenomeCommand {
    type Error = GenomeAnnotationError;

    fn try_from(params: ExportParams) -> Result<Self, Self::Error> {
        let input_ref = provided(&params.input_ref).ok_or(GenomeAnnotationError::InputRefRequired)?;
        Ok(Self {
            input_ref: ObjectRef::parse(input_ref)?,
        })
    }
}

/// Object names become directory prefixes; keep them to one path component.
fn package_prefix(object_name: &str) -> String {
    let prefix = object_name.replace(['/', '\\'], "_");
    match prefix.as_str() {
        "" | "." | ".." => "genome".to_string(),
        _ => prefix,
    }
}

#[tracing::instrument(skip(state, token, params))]
pub async fn handle(
    state: &FeatureState,
    token: Option<&str>,
    params: ExportParams,
) -> Result<ExportOutput, GenomeAnnotationError> {
    info!(?params, "export_genome_annotation_as_genbank");
    let command = ExportGenomeCommand::try_from(params)?;
    let services = &state.services;

    let info = services
        .object_store
        .get_object_info(&command.input_ref, token)
        .await?;

    let query = DownloadGenbankQuery {
        genome_ref: command.input_ref.clone(),
        file_name: Some(format!("{}.gbk", info.name)),
        save_to_blob_store: false,
    };
    let downloaded = download::run(state, token, &query).await?;

    let package_dir = ScratchDir::create(&state.config.scratch, &package_prefix(&info.name)).await?;
    let file_name = downloaded
        .file()
        .file_name()
        .context("Downloaded GenBank file has no name")?;
    let packaged_file = package_dir.path().join(file_name);
    tokio::fs::rename(downloaded.file(), &packaged_file)
        .await
        .with_context(|| format!("Failed to move GenBank file into {}", package_dir.path().display()))?;
    downloaded.close().await;

    let shock_id = services
        .packager
        .package_for_download(package_dir.path(), &[command.input_ref.clone()], token)
        .await?;
    package_dir.close().await;

    info!(shock_id = %shock_id, input_ref = %command.input_ref, "Exported genome annotation");
    Ok(ExportOutput { shock_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_missing_input_ref() {
        let result = ExportGenomeCommand::try_from(ExportParams { input_ref: None });
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Cannot export GenomeAnnotation- not input_ref field defined.");
    }

    #[test]
    fn test_validation_malformed_input_ref() {
        let result = ExportGenomeCommand::try_from(ExportParams {
            input_ref: Some("ws1/".to_string()),
        });
        assert!(matches!(result, Err(GenomeAnnotationError::InvalidReference(_))));
    }

    #[test]
    fn test_package_prefix() {
        assert_eq!(package_prefix("G1"), "G1");
        assert_eq!(package_prefix("a/b"), "a_b");
        assert_eq!(package_prefix(".."), "genome");
    }
}
