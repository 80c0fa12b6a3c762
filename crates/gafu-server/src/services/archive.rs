//! In-place unpacking of fetched input files
//!
//! # Supported Formats
//!
//! - **Gzip** (.gz): decompressed next to the archive with the suffix dropped
//! - **Tar** (.tar): entries unpacked into the archive's directory
//! - **Tar.gz** (.tar.gz, .tgz): combined gzip + tar
//! - **Zip** (.zip): entries unpacked into the archive's directory
//!
//! The archive itself is removed once unpacked. Files in any other format
//! are left untouched.

use super::ArchiveExtractor;
use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Gzip,
    Tar,
    Zip,
}

impl ArchiveFormat {
    /// Detect the format from the file name's extension
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".gz") {
            Some(Self::Gzip)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Local filesystem extractor backed by flate2, tar and zip
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArchiveExtractor;

#[async_trait]
impl ArchiveExtractor for FsArchiveExtractor {
    async fn extract_in_place(&self, path: &Path) -> Result<()> {
        let Some(format) = ArchiveFormat::detect(path) else {
            debug!(path = %path.display(), "Not an archive, leaving as is");
            return Ok(());
        };

        let archive = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_sync(&archive, format))
            .await
            .map_err(|e| anyhow::anyhow!("Extraction task panicked: {}", e))??;

        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove archive {}", path.display()))?;

        info!(path = %path.display(), ?format, "Unpacked archive");
        Ok(())
    }
}

fn extract_sync(archive: &Path, format: ArchiveFormat) -> Result<()> {
    let parent = archive
        .parent()
        .with_context(|| format!("Archive has no parent directory: {}", archive.display()))?;
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(reader))
            .unpack(parent)
            .with_context(|| format!("Failed to unpack tar.gz archive {}", archive.display())),
        ArchiveFormat::Tar => tar::Archive::new(reader)
            .unpack(parent)
            .with_context(|| format!("Failed to unpack tar archive {}", archive.display())),
        ArchiveFormat::Zip => zip::ZipArchive::new(reader)
            .context("Failed to read zip archive")?
            .extract(parent)
            .with_context(|| format!("Failed to unpack zip archive {}", archive.display())),
        ArchiveFormat::Gzip => {
            let target = gunzip_target(archive);
            let mut decoder = GzDecoder::new(reader);
            let mut output = BufWriter::new(
                File::create(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?,
            );
            let bytes = io::copy(&mut decoder, &mut output)
                .context("Failed to decompress gzip data")?;
            debug!("Decompressed {} -> {} bytes", archive.display(), bytes);
            Ok(())
        },
    }
}

/// `dir/name.gbk.gz` -> `dir/name.gbk`
fn gunzip_target(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name
        .len()
        .checked_sub(3)
        .map(|end| name[..end].to_string())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "decompressed".to_string());
    archive.with_file_name(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const GENBANK: &[u8] = b"LOCUS       G1  10 bp    DNA\nORIGIN\n        1 acgtacgtac\n//\n";

    fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ArchiveFormat::detect(Path::new("a/G1.tar.gz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::detect(Path::new("G1.TGZ")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::detect(Path::new("G1.gbff.gz")), Some(ArchiveFormat::Gzip));
        assert_eq!(ArchiveFormat::detect(Path::new("G1.tar")), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::detect(Path::new("G1.zip")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::detect(Path::new("G1.gbk")), None);
    }

    #[tokio::test]
    async fn test_gzip_is_decompressed_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("G1.gbff.gz");
        std::fs::write(&archive, gzip_bytes(GENBANK)).unwrap();

        FsArchiveExtractor.extract_in_place(&archive).await.unwrap();

        assert!(!archive.exists());
        assert_eq!(std::fs::read(dir.path().join("G1.gbff")).unwrap(), GENBANK);
    }

    #[tokio::test]
    async fn test_tar_gz_is_unpacked_into_parent() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("genomes.tar.gz");
        let tar = tar_bytes(&[("G1.gbk", GENBANK), ("contigs/G2.gbk", GENBANK)]);
        std::fs::write(&archive, gzip_bytes(&tar)).unwrap();

        FsArchiveExtractor.extract_in_place(&archive).await.unwrap();

        assert!(!archive.exists());
        assert!(dir.path().join("G1.gbk").is_file());
        assert!(dir.path().join("contigs").join("G2.gbk").is_file());
    }

    #[tokio::test]
    async fn test_zip_is_unpacked_into_parent() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("genomes.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
            writer
                .start_file("G1.gbk", zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(GENBANK).unwrap();
            writer.finish().unwrap();
        }

        FsArchiveExtractor.extract_in_place(&archive).await.unwrap();

        assert!(!archive.exists());
        assert_eq!(std::fs::read(dir.path().join("G1.gbk")).unwrap(), GENBANK);
    }

    #[tokio::test]
    async fn test_plain_file_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("G1.gbk");
        std::fs::write(&plain, GENBANK).unwrap();

        FsArchiveExtractor.extract_in_place(&plain).await.unwrap();

        assert_eq!(std::fs::read(&plain).unwrap(), GENBANK);
    }

    #[tokio::test]
    async fn test_corrupt_gzip_fails() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("G1.gbk.gz");
        std::fs::write(&archive, b"not gzip data").unwrap();

        assert!(FsArchiveExtractor.extract_in_place(&archive).await.is_err());
    }
}
