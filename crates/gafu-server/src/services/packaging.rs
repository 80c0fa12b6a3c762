//! Bulk-download packaging
//!
//! A package is a zip of the export directory (entries rooted at the
//! directory's own name) carrying a `provenance.json` that records which
//! workspace objects the files were produced from.

use super::{BlobStore, ObjectStore, Packager};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gafu_common::checksum::file_sha256;
use gafu_common::types::{ObjectInfo, ObjectRef};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

pub const PROVENANCE_FILE: &str = "provenance.json";

#[derive(Debug, Serialize)]
struct Provenance {
    created: DateTime<Utc>,
    source_refs: Vec<ObjectRef>,
    objects: Vec<ProvenanceObject>,
    files: Vec<PackagedFile>,
}

#[derive(Debug, Serialize)]
struct ProvenanceObject {
    #[serde(rename = "ref")]
    reference: ObjectRef,
    name: String,
    #[serde(rename = "type")]
    type_string: String,
    workspace: String,
    save_date: String,
}

impl From<&ObjectInfo> for ProvenanceObject {
    fn from(info: &ObjectInfo) -> Self {
        Self {
            reference: ObjectRef::from_info(info),
            name: info.name.clone(),
            type_string: info.type_string.clone(),
            workspace: info.workspace.clone(),
            save_date: info.save_date.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PackagedFile {
    path: String,
    size: u64,
    sha256: String,
}

pub struct ZipPackager {
    object_store: Arc<dyn ObjectStore>,
    blob_store: Arc<dyn BlobStore>,
}

impl ZipPackager {
    pub fn new(object_store: Arc<dyn ObjectStore>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            object_store,
            blob_store,
        }
    }
}

#[async_trait]
impl Packager for ZipPackager {
    #[instrument(skip(self, token), fields(directory = %directory.display()))]
    async fn package_for_download(
        &self,
        directory: &Path,
        source_refs: &[ObjectRef],
        token: Option<&str>,
    ) -> Result<String> {
        let mut objects = Vec::with_capacity(source_refs.len());
        for reference in source_refs {
            let info = self.object_store.get_object_info(reference, token).await?;
            objects.push(ProvenanceObject::from(&info));
        }

        let dir = directory.to_path_buf();
        let files = tokio::task::spawn_blocking(move || list_files(&dir))
            .await
            .map_err(|e| anyhow::anyhow!("Packaging task panicked: {}", e))??;

        let provenance = Provenance {
            created: Utc::now(),
            source_refs: source_refs.to_vec(),
            objects,
            files,
        };
        tokio::fs::write(
            directory.join(PROVENANCE_FILE),
            serde_json::to_vec_pretty(&provenance)?,
        )
        .await
        .context("Failed to write provenance")?;

        let dir = directory.to_path_buf();
        let zip_path = tokio::task::spawn_blocking(move || write_zip(&dir))
            .await
            .map_err(|e| anyhow::anyhow!("Packaging task panicked: {}", e))??;

        let stored = self.blob_store.store_file(&zip_path).await;
        if let Err(e) = tokio::fs::remove_file(&zip_path).await {
            warn!(path = %zip_path.display(), "Failed to remove package archive: {}", e);
        }
        let blob_id = stored.context("Failed to store package")?;

        info!(blob_id = %blob_id, files = provenance.files.len(), "Stored download package");
        Ok(blob_id)
    }
}

fn directory_name(directory: &Path) -> Result<String> {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .with_context(|| format!("Cannot package {}", directory.display()))
}

/// `/`-separated path of `path` below `root`
fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root)?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn list_files(directory: &Path) -> Result<Vec<PackagedFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = relative_name(directory, entry.path())?;
        if path == PROVENANCE_FILE {
            continue;
        }
        files.push(PackagedFile {
            path,
            size: entry.metadata()?.len(),
            sha256: file_sha256(entry.path())?,
        });
    }
    Ok(files)
}

/// Zip `directory` into a sibling `<name>.zip` and return its path
fn write_zip(directory: &Path) -> Result<PathBuf> {
    let root_name = directory_name(directory)?;
    let zip_path = directory.with_file_name(format!("{}.zip", root_name));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let file = File::create(&zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(file));

    writer.add_directory(root_name.clone(), options)?;
    for entry in WalkDir::new(directory).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let name = format!("{}/{}", root_name, relative_name(directory, entry.path())?);
        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(name, options)?;
            io::copy(&mut File::open(entry.path())?, &mut writer)?;
        }
    }
    writer.finish()?;

    Ok(zip_path)
}
