//! Test helpers for GenomeAnnotationFileUtil integration tests
//!
//! [`FakePlatform`] stands in for the workspace, blob store, URL fetcher and
//! the transform callback service. Archive extraction and packaging use the
//! real implementations against a temporary scratch root.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use gafu_common::types::{ObjectInfo, ObjectRef};
use gafu_server::config::{Config, ServiceEndpoints};
use gafu_server::features::FeatureState;
use gafu_server::services::archive::FsArchiveExtractor;
use gafu_server::services::packaging::ZipPackager;
use gafu_server::services::{
    BlobStore, ConvertGenomeRequest, DownloadGenbankRequest, GenbankDownloader, GenbankUploader,
    LegacyConverter, ObjectStore, Services, UploadGenomeRequest, UrlFetcher,
};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const WORKSPACE_ID: i64 = 1234;
pub const GENOME_TYPE: &str = "KBaseGenomeAnnotations.GenomeAnnotation-3.0";

pub const SAMPLE_GENBANK: &[u8] = b"LOCUS       NC_000913   20 bp    DNA     circular BCT 01-JAN-2016
DEFINITION  Escherichia coli str. K-12 substr. MG1655, complete genome.
FEATURES             Location/Qualifiers
     source          1..20
                     /organism=\"Escherichia coli\"
ORIGIN
        1 agcttttcat tctgactgca
//
";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Zip archive holding one file per `(name, data)` pair
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// One call to the GenBank uploader, with the files it found in its input directory
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub request: UploadGenomeRequest,
    pub token: Option<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    /// Entry names of each subdirectory of the input directory
    pub subdirectories: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    info: ObjectInfo,
    content: Vec<u8>,
}

#[derive(Default)]
struct PlatformState {
    objects: Vec<StoredObject>,
    blobs: BTreeMap<String, (String, Vec<u8>)>,
    remote_files: BTreeMap<String, Vec<u8>>,
    remote_extras: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    uploads: Vec<UploadRecord>,
    conversions: Vec<ConvertGenomeRequest>,
    downloads: Vec<(DownloadGenbankRequest, Option<String>)>,
    fetched_urls: Vec<String>,
}

/// In-memory workspace, blob store, remote host and transform service
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<PlatformState>,
}

impl FakePlatform {
    pub fn put_blob(&self, filename: &str, data: Vec<u8>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = format!("blob-{}", state.blobs.len() + 1);
        state.blobs.insert(id.clone(), (filename.to_string(), data));
        id
    }

    pub fn blob(&self, id: &str) -> Option<(String, Vec<u8>)> {
        self.state.lock().unwrap().blobs.get(id).cloned()
    }

    pub fn serve_url(&self, url: &str, data: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .remote_files
            .insert(url.to_string(), data);
    }

    /// Serve `url` and write `extras` (relative paths, possibly nested) next to
    /// the fetched file.
    pub fn serve_url_with_extras(&self, url: &str, data: Vec<u8>, extras: Vec<(&str, Vec<u8>)>) {
        let mut state = self.state.lock().unwrap();
        state.remote_files.insert(url.to_string(), data);
        state.remote_extras.insert(
            url.to_string(),
            extras
                .into_iter()
                .map(|(path, data)| (path.to_string(), data))
                .collect(),
        );
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn conversions(&self) -> Vec<ConvertGenomeRequest> {
        self.state.lock().unwrap().conversions.clone()
    }

    pub fn download_tokens(&self) -> Vec<Option<String>> {
        self.state
            .lock()
            .unwrap()
            .downloads
            .iter()
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched_urls.clone()
    }

    /// Resolve `ws/name`, `wsid/objid` or `wsid/objid/version`
    fn find(state: &PlatformState, reference: &ObjectRef) -> Option<StoredObject> {
        let parts: Vec<&str> = reference.as_str().split('/').collect();
        let latest = |matches: &dyn Fn(&ObjectInfo) -> bool| {
            state
                .objects
                .iter()
                .filter(|o| matches(&o.info))
                .max_by_key(|o| o.info.version)
                .cloned()
        };

        match parts.as_slice() {
            [ws, obj] => latest(&|info: &ObjectInfo| {
                (info.workspace == *ws || info.wsid.to_string() == *ws)
                    && (info.name == *obj || info.objid.to_string() == *obj)
            }),
            [ws, obj, version] => latest(&|info: &ObjectInfo| {
                info.wsid.to_string() == *ws
                    && info.objid.to_string() == *obj
                    && info.version.to_string() == *version
            }),
            _ => None,
        }
    }
}

fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

type DirContents = (BTreeMap<String, Vec<u8>>, BTreeMap<String, Vec<String>>);

fn contents_of(dir: &Path) -> DirContents {
    let mut files = BTreeMap::new();
    let mut subdirectories = BTreeMap::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type().unwrap();
        if file_type.is_file() {
            files.insert(name, std::fs::read(entry.path()).unwrap());
        } else if file_type.is_dir() {
            subdirectories.insert(name, entry_names(&entry.path()));
        }
    }
    (files, subdirectories)
}

#[async_trait]
impl ObjectStore for FakePlatform {
    async fn get_object_info(&self, reference: &ObjectRef, _token: Option<&str>) -> Result<ObjectInfo> {
        let state = self.state.lock().unwrap();
        Self::find(&state, reference)
            .map(|o| o.info)
            .ok_or_else(|| anyhow!("No object with reference {} exists", reference))
    }
}

#[async_trait]
impl BlobStore for FakePlatform {
    async fn store_file(&self, path: &Path) -> Result<String> {
        let data = std::fs::read(path)?;
        let filename = path.file_name().unwrap().to_string_lossy().to_string();
        Ok(self.put_blob(&filename, data))
    }

    async fn fetch_file(&self, blob_id: &str, destination: &Path) -> Result<String> {
        let (filename, data) = self
            .blob(blob_id)
            .ok_or_else(|| anyhow!("Node {} does not exist", blob_id))?;
        std::fs::write(destination.join(&filename), data)?;
        Ok(filename)
    }
}

#[async_trait]
impl UrlFetcher for FakePlatform {
    async fn fetch_urls(
        &self,
        working_directory: &Path,
        _token: Option<&str>,
        urls: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (name, url) in urls {
            let (data, extras) = {
                let mut state = self.state.lock().unwrap();
                state.fetched_urls.push(url.clone());
                (
                    state.remote_files.get(url).cloned(),
                    state.remote_extras.get(url).cloned().unwrap_or_default(),
                )
            };
            let Some(data) = data else {
                bail!("550 {}: No such file", url);
            };
            let dir = working_directory.join(name);
            std::fs::create_dir_all(&dir)?;
            let filename = url.rsplit('/').next().unwrap_or("download");
            std::fs::write(dir.join(filename), data)?;
            for (path, data) in extras {
                let target = dir.join(path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, data)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GenbankUploader for FakePlatform {
    async fn upload_genome(
        &self,
        request: &UploadGenomeRequest,
        _endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()> {
        let (files, subdirectories) = contents_of(&request.input_directory);
        if files.is_empty() {
            bail!("No GenBank files found in {}", request.input_directory.display());
        }
        let content: Vec<u8> = files.values().flatten().copied().collect();

        let mut state = self.state.lock().unwrap();
        let existing = Self::find(
            &state,
            &ObjectRef::compose(&request.workspace_name, &request.core_genome_name),
        );
        let (objid, version) = match existing {
            Some(o) => (o.info.objid, o.info.version + 1),
            None => (state.objects.len() as i64 + 1, 1),
        };
        state.objects.push(StoredObject {
            info: ObjectInfo {
                objid,
                name: request.core_genome_name.clone(),
                type_string: GENOME_TYPE.to_string(),
                save_date: "2016-05-04T17:22:04+0000".to_string(),
                version,
                saved_by: "someuser".to_string(),
                wsid: WORKSPACE_ID,
                workspace: request.workspace_name.clone(),
                checksum: String::new(),
                size: content.len() as i64,
                meta: None,
            },
            content,
        });
        state.uploads.push(UploadRecord {
            request: request.clone(),
            token: token.map(str::to_string),
            files,
            subdirectories,
        });
        Ok(())
    }
}

#[async_trait]
impl LegacyConverter for FakePlatform {
    async fn convert_genome(
        &self,
        request: &ConvertGenomeRequest,
        _endpoints: &ServiceEndpoints,
        _token: Option<&str>,
    ) -> Result<()> {
        self.state.lock().unwrap().conversions.push(request.clone());
        Ok(())
    }
}

#[async_trait]
impl GenbankDownloader for FakePlatform {
    async fn download_as_gbk(
        &self,
        request: &DownloadGenbankRequest,
        _endpoints: &ServiceEndpoints,
        token: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let object = Self::find(&state, &request.genome_ref)
            .ok_or_else(|| anyhow!("No object with reference {} exists", request.genome_ref))?;
        std::fs::write(&request.output_file, &object.content)?;
        state
            .downloads
            .push((request.clone(), token.map(str::to_string)));
        Ok(())
    }
}

/// Feature state wired to a fresh [`FakePlatform`] and a temporary scratch root
pub struct TestContext {
    pub state: FeatureState,
    pub platform: Arc<FakePlatform>,
    pub scratch: tempfile::TempDir,
    pub inputs: tempfile::TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let inputs = tempfile::tempdir().unwrap();
        let platform = Arc::new(FakePlatform::default());

        let mut kbase = Config::default().kbase;
        kbase.scratch = scratch.path().to_path_buf();

        let object_store: Arc<dyn ObjectStore> = platform.clone();
        let blob_store: Arc<dyn BlobStore> = platform.clone();
        let services = Services {
            object_store: object_store.clone(),
            blob_store: blob_store.clone(),
            url_fetcher: platform.clone(),
            extractor: Arc::new(FsArchiveExtractor),
            uploader: platform.clone(),
            legacy_converter: platform.clone(),
            downloader: platform.clone(),
            packager: Arc::new(ZipPackager::new(object_store, blob_store)),
        };

        Self {
            state: FeatureState::new(kbase, services),
            platform,
            scratch,
            inputs,
        }
    }

    /// Write an input file outside the scratch root
    pub fn input_file(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.inputs.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Entries currently under the scratch root
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        entries.sort();
        entries
    }
}
