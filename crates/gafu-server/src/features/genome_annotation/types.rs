//! Parameter and result types of the genome annotation operations
//!
//! Field names follow the platform's wire format; every parameter is
//! optional on the wire and checked by the operation itself.

use gafu_common::types::{KbBool, ObjectRef};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenbankToGenomeAnnotationParams {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub shock_id: Option<String>,
    #[serde(default)]
    pub ftp_url: Option<String>,
    #[serde(default)]
    pub genome_name: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub taxon_wsname: Option<String>,
    #[serde(default)]
    pub convert_to_legacy: Option<KbBool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeAnnotationDetails {
    pub genome_annotation_ref: ObjectRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeAnnotationToGenbankParams {
    #[serde(default)]
    pub genome_ref: Option<String>,
    #[serde(default)]
    pub genome_name: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub new_genbank_file_name: Option<String>,
    #[serde(default)]
    pub save_to_shock: Option<KbBool>,
}

/// Exactly one of `path` and `shock_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenbankFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shock_id: Option<String>,
}

impl GenbankFile {
    pub fn local(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            shock_id: None,
        }
    }

    pub fn stored(shock_id: String) -> Self {
        Self {
            path: None,
            shock_id: Some(shock_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    pub input_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutput {
    pub shock_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: String,
    pub message: String,
    pub version: String,
    pub git_url: String,
    pub git_commit_hash: String,
}
