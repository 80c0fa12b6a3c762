//! GenBank upload, download and export of genome annotations
//!
//! - `commands/upload` - GenBank file, blob or URL to a GenomeAnnotation object
//! - `commands/export` - GenomeAnnotation to a packaged GenBank download
//! - `queries/download` - GenomeAnnotation to a GenBank file
//! - `queries/status` - service status report

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{ExportGenomeCommand, InputSource, UploadGenomeCommand};
pub use queries::{DownloadGenbankQuery, DownloadedGenbank};
pub use routes::{genome_annotation_routes, status_route};
pub use types::*;

use crate::features::shared::FileNameValidationError;
use gafu_common::GafuError;

#[derive(Debug, thiserror::Error)]
pub enum GenomeAnnotationError {
    #[error("workspace_name field was not defined")]
    WorkspaceNameRequired,
    #[error("genome_name field was not defined")]
    GenomeNameRequired,
    #[error("No input file (either file_path, shock_id, or ftp_url) provided")]
    InputFileRequired,
    #[error("genome_ref and genome_name are not defined.  One of those is required.")]
    GenomeRefRequired,
    #[error("workspace_name is not defined.  This is required if genome_name is specified without a genome_ref")]
    DownloadWorkspaceRequired,
    #[error("Cannot export GenomeAnnotation- not input_ref field defined.")]
    InputRefRequired,
    #[error("Invalid object reference: '{0}'")]
    InvalidReference(String),
    #[error("Invalid file name '{name}': {reason}")]
    InvalidFileName {
        name: String,
        reason: FileNameValidationError,
    },
    #[error("{0:#}")]
    Collaborator(#[from] anyhow::Error),
}

impl GenomeAnnotationError {
    /// Whether the caller's parameters were at fault
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Collaborator(_))
    }
}

impl From<std::io::Error> for GenomeAnnotationError {
    fn from(err: std::io::Error) -> Self {
        Self::Collaborator(err.into())
    }
}

impl From<GafuError> for GenomeAnnotationError {
    fn from(err: GafuError) -> Self {
        match err {
            GafuError::InvalidReference(reference) => Self::InvalidReference(reference),
            other => Self::Collaborator(other.into()),
        }
    }
}
